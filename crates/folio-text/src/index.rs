use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tantivy::collector::Count;
use tantivy::query::TermQuery;
use tantivy::schema::IndexRecordOption;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Term};
use tracing::{debug, info, warn};

use folio_core::config::{Config, IndexConfig, SearchConfig};
use folio_core::error::{Error, Result};
use folio_core::traits::{SearchEngine, SegmentIndexer};
use folio_core::types::{IndexStatistics, QueryHit, QueryRequest, Segment};

use crate::document::{assign_ids, validate_segment};
use crate::tantivy_utils::{build_schema, register_tokenizers, verify_schema, Fields};

const META_FILE: &str = "meta.json";

/// The persisted segment index and the query service over it.
///
/// Readers only ever see the last committed build; a build in progress or a
/// rolled-back build is invisible to `search`, `list_works` and `statistics`.
pub struct CorpusIndex {
    pub(crate) index: Index,
    pub(crate) reader: IndexReader,
    pub(crate) fields: Fields,
    pub(crate) search_config: SearchConfig,
    dir: PathBuf,
    writer_memory_bytes: usize,
    /// Commit the reader's snapshot was taken from.
    loaded_opstamp: AtomicU64,
}

impl CorpusIndex {
    /// Opens the index in `dir`, creating an empty (not yet built) one if the
    /// directory holds none.
    pub fn open(dir: impl Into<PathBuf>, index_config: &IndexConfig, search_config: &SearchConfig) -> Result<Self> {
        let dir = dir.into();
        if dir.join(META_FILE).exists() {
            return Self::open_existing(dir, index_config, search_config);
        }
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "created empty index");
        let index = Index::create_in_dir(&dir, build_schema()).map_err(Error::backend)?;
        Self::with_index(index, dir, index_config, search_config)
    }

    /// Opens an index that already exists on disk. Never writes: a directory
    /// without an index is reported as `IndexNotReady`.
    pub fn open_existing(dir: impl Into<PathBuf>, index_config: &IndexConfig, search_config: &SearchConfig) -> Result<Self> {
        let dir = dir.into();
        if !dir.join(META_FILE).exists() {
            return Err(Error::IndexNotReady(dir.display().to_string()));
        }
        let index = Index::open_in_dir(&dir).map_err(Error::backend)?;
        verify_schema(&index.schema())?;
        debug!(dir = %dir.display(), "opened existing index");
        Self::with_index(index, dir, index_config, search_config)
    }

    fn with_index(index: Index, dir: PathBuf, index_config: &IndexConfig, search_config: &SearchConfig) -> Result<Self> {
        register_tokenizers(&index);
        let fields = Fields::resolve(&index.schema())?;
        let loaded_opstamp = index.load_metas().map_err(Error::backend)?.opstamp;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(Error::backend)?;

        Ok(Self {
            index,
            reader,
            fields,
            search_config: search_config.clone(),
            dir,
            writer_memory_bytes: index_config.writer_memory_bytes,
            loaded_opstamp: AtomicU64::new(loaded_opstamp),
        })
    }

    /// Opens the index named by `config`, resolving relative paths against `base`.
    pub fn from_config(config: &Config, base: &Path) -> Result<Self> {
        Self::open(config.index_dir(base), &config.index, &config.search)
    }

    /// Read-only counterpart of [`CorpusIndex::from_config`].
    pub fn existing_from_config(config: &Config, base: &Path) -> Result<Self> {
        Self::open_existing(config.index_dir(base), &config.index, &config.search)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True once at least one build has been committed.
    pub fn is_ready(&self) -> Result<bool> {
        let metas = self.index.load_metas().map_err(Error::backend)?;
        Ok(metas.payload.is_some())
    }

    /// Fails with `IndexNotReady` before the first commit; otherwise moves the
    /// reader onto the latest commit, including ones made by other handles.
    pub(crate) fn ensure_ready(&self) -> Result<()> {
        let metas = self.index.load_metas().map_err(Error::backend)?;
        if metas.payload.is_none() {
            return Err(Error::IndexNotReady(self.dir.display().to_string()));
        }
        if self.loaded_opstamp.load(AtomicOrdering::Acquire) != metas.opstamp {
            self.reader.reload().map_err(Error::backend)?;
            self.loaded_opstamp.store(metas.opstamp, AtomicOrdering::Release);
            debug!(opstamp = metas.opstamp, "reader moved to newer commit");
        }
        Ok(())
    }

    /// Replaces the index content with one document per segment and commits
    /// atomically. Nothing is written when a segment fails validation; any
    /// later failure rolls back to the previous commit.
    pub fn build(&self, segments: &[Segment]) -> Result<IndexStatistics> {
        for seg in segments {
            validate_segment(seg)?;
        }
        let documents = assign_ids(segments);
        info!(dir = %self.dir.display(), documents = documents.len(), "building index");

        let mut writer: IndexWriter = self
            .index
            .writer_with_num_threads(1, self.writer_memory_bytes)
            .map_err(|err| Error::BuildIncomplete(format!("cannot acquire index writer: {err}")))?;

        let written = (|| -> tantivy::Result<u64> {
            writer.delete_all_documents()?;
            for document in &documents {
                writer.add_document(document.to_tantivy(&self.fields))?;
            }
            let mut prepared = writer.prepare_commit()?;
            prepared.set_payload(&serde_json::json!({ "documents": documents.len() }).to_string());
            prepared.commit()
        })();

        match written {
            Ok(opstamp) => {
                self.reader.reload().map_err(Error::backend)?;
                self.loaded_opstamp.store(opstamp, AtomicOrdering::Release);
                let stats = self.statistics()?;
                info!(opstamp, documents = stats.document_count, works = stats.work_count, "index committed");
                Ok(stats)
            }
            Err(err) => {
                warn!(error = %err, "index build failed, rolling back");
                if let Err(rollback) = writer.rollback() {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(Error::BuildIncomplete(err.to_string()))
            }
        }
    }

    /// Distinct work titles in the committed index, ascending. Every title
    /// matches at least one document when used as a `work_filter`.
    pub fn list_works(&self) -> Result<Vec<String>> {
        self.ensure_ready()?;
        let searcher = self.reader.searcher();
        let mut candidates = BTreeSet::new();
        for segment_reader in searcher.segment_readers() {
            let inverted = segment_reader.inverted_index(self.fields.work_title).map_err(Error::backend)?;
            let mut terms = inverted.terms().stream().map_err(Error::backend)?;
            while terms.advance() {
                candidates.insert(String::from_utf8_lossy(terms.key()).into_owned());
            }
        }

        let mut works = Vec::with_capacity(candidates.len());
        for title in candidates {
            let query = TermQuery::new(Term::from_field_text(self.fields.work_title, &title), IndexRecordOption::Basic);
            if searcher.search(&query, &Count).map_err(Error::backend)? > 0 {
                works.push(title);
            }
        }
        Ok(works)
    }

    pub fn statistics(&self) -> Result<IndexStatistics> {
        self.ensure_ready()?;
        let document_count = self.reader.searcher().num_docs();
        let work_count = self.list_works()?.len();
        Ok(IndexStatistics { document_count, work_count })
    }

    /// Bytes on disk used by the index directory.
    pub fn index_size_bytes(&self) -> Result<u64> {
        let mut total = 0;
        for entry in walkdir::WalkDir::new(&self.dir).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                total += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
        Ok(total)
    }
}

impl SegmentIndexer for CorpusIndex {
    fn build(&self, segments: &[Segment]) -> Result<IndexStatistics> {
        Self::build(self, segments)
    }
}

impl SearchEngine for CorpusIndex {
    fn search(&self, request: &QueryRequest) -> Result<Vec<QueryHit>> {
        Self::search(self, request)
    }

    fn list_works(&self) -> Result<Vec<String>> {
        Self::list_works(self)
    }

    fn statistics(&self) -> Result<IndexStatistics> {
        Self::statistics(self)
    }
}
