//! Typed configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `folio.toml` + `folio.<env>.toml`
//! + `FOLIO_*` env vars (nested keys split on `__`, e.g.
//! `FOLIO_SEARCH__MAX_LIMIT=50`). Provides helpers to expand `~` and `${VAR}`
//! and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Smallest per-thread arena tantivy accepts for an index writer.
pub const MIN_WRITER_MEMORY_BYTES: usize = 15_000_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub segmenter: SegmenterConfig,
    pub index: IndexConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: String,
    pub segments_path: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: "data/processed/shakespeare_only.txt".to_string(),
            segments_path: "data/segments.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Lines skipped unconditionally before looking for content (table of contents).
    pub toc_skip_lines: usize,
    /// Neighbouring non-blank lines kept on each side of a segment.
    pub context_lines: usize,
    /// How far above the first content indicator a work title may sit.
    pub title_lookback: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self { toc_skip_lines: 50, context_lines: 5, title_lookback: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexConfig {
    pub dir: String,
    pub writer_memory_bytes: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { dir: "data/index".to_string(), writer_memory_bytes: 50_000_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    pub fuzzy_max_distance: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_limit: 10, max_limit: 100, fuzzy_max_distance: 2 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_for_env(None)
    }

    pub fn load_for_env(env_name: Option<&str>) -> Result<Self> {
        let env_name = match env_name {
            Some(name) => name.to_string(),
            None => env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string()),
        };

        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("folio.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("folio.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("folio.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("folio.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("FOLIO_").split("__"));

        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.search.fuzzy_max_distance) {
            return Err(Error::InvalidConfig(format!(
                "search.fuzzy_max_distance must be 1 or 2, got {}",
                self.search.fuzzy_max_distance
            )));
        }
        if self.search.max_limit == 0 {
            return Err(Error::InvalidConfig("search.max_limit must be positive".to_string()));
        }
        if self.search.default_limit == 0 || self.search.default_limit > self.search.max_limit {
            return Err(Error::InvalidConfig(format!(
                "search.default_limit must be in 1..={}, got {}",
                self.search.max_limit, self.search.default_limit
            )));
        }
        if self.index.writer_memory_bytes < MIN_WRITER_MEMORY_BYTES {
            return Err(Error::InvalidConfig(format!(
                "index.writer_memory_bytes must be at least {MIN_WRITER_MEMORY_BYTES}, got {}",
                self.index.writer_memory_bytes
            )));
        }
        Ok(())
    }

    pub fn corpus_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.corpus.path)
    }

    pub fn segments_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.corpus.segments_path)
    }

    pub fn index_dir(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.index.dir)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.segmenter.toc_skip_lines, 50);
        assert_eq!(config.segmenter.context_lines, 5);
        assert_eq!(config.search.fuzzy_max_distance, 2);
    }

    #[test]
    fn toml_overrides_merge_over_defaults() {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(
            r#"
            [segmenter]
            context_lines = 3

            [search]
            max_limit = 25
            "#,
        ));
        let config = Config::from_figment(figment).expect("config");
        assert_eq!(config.segmenter.context_lines, 3);
        assert_eq!(config.segmenter.toc_skip_lines, 50);
        assert_eq!(config.search.max_limit, 25);
        assert_eq!(config.index.writer_memory_bytes, 50_000_000);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = Config::default();
        config.search.fuzzy_max_distance = 3;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.search.default_limit = 500;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.index.writer_memory_bytes = 1_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/srv/folio");
        assert_eq!(resolve_with_base(base, "data/index"), PathBuf::from("/srv/folio/data/index"));
        assert_eq!(resolve_with_base(base, "/var/index"), PathBuf::from("/var/index"));
    }
}
