//! folio-text
//!
//! Tantivy-backed segment index and query engine: any-word (optionally fuzzy),
//! exact phrase and regular expression search with exact work filtering and
//! character-offset highlighting.

pub mod document;
pub mod highlight;
pub mod index;
pub mod search;
pub mod tantivy_utils;

pub use index::CorpusIndex;
