use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// An exact-match field received a value that would need tokenization,
    /// or the on-disk schema types a field differently than expected.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Invalid regular expression '{pattern}': {message}")]
    QuerySyntax { pattern: String, message: String },

    /// No build has ever been committed to the index directory.
    #[error("Index not ready: no committed build in {0}")]
    IndexNotReady(String),

    /// The build was rolled back; the last committed state is still served.
    #[error("Build incomplete, rolled back to last commit: {0}")]
    BuildIncomplete(String),

    #[error("Invalid segmenter pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Index backend: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Backend(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal: no work title was recognized, so the whole content region was
/// segmented as a single unclassified work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no work titles recognized; lines {start}..{end} segmented as one unclassified work")]
pub struct ParseDegraded {
    pub start: usize,
    pub end: usize,
}
