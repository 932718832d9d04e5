use crate::error::Result;
use crate::types::{IndexStatistics, QueryHit, QueryRequest, Segment};

/// Replaces the whole index content with one document per segment.
pub trait SegmentIndexer: Send + Sync {
    fn build(&self, segments: &[Segment]) -> Result<IndexStatistics>;
}

/// Read-only query surface handed to front-ends.
pub trait SearchEngine: Send + Sync {
    fn search(&self, request: &QueryRequest) -> Result<Vec<QueryHit>>;
    fn list_works(&self) -> Result<Vec<String>>;
    fn statistics(&self) -> Result<IndexStatistics>;
}
