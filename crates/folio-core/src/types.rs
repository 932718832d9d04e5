//! Domain types shared by the segmenter, the index and its consumers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Title given to the single work produced when no catalog title matches.
pub const UNCLASSIFIED_TITLE: &str = "UNCLASSIFIED";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkKind {
    Play,
    SonnetCollection,
    Unclassified,
}

impl WorkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkKind::Play => "play",
            WorkKind::SonnetCollection => "sonnet_collection",
            WorkKind::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for WorkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(WorkKind::Play),
            "sonnet_collection" => Ok(WorkKind::SonnetCollection),
            "unclassified" => Ok(WorkKind::Unclassified),
            other => Err(Error::SchemaViolation(format!("unknown work kind '{other}'"))),
        }
    }
}

/// Half-open range of 0-based corpus line indices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// One literary work inside the corpus. The span never includes the title line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Work {
    pub title: String,
    pub kind: WorkKind,
    pub span: LineSpan,
}

/// Structural position of a segment. The variant is the work kind, so play
/// and sonnet metadata can never be mixed on one segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Citation {
    Play {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        act: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scene: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
    },
    SonnetCollection {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sonnet_number: Option<u32>,
    },
    Unclassified,
}

impl Citation {
    pub fn kind(&self) -> WorkKind {
        match self {
            Citation::Play { .. } => WorkKind::Play,
            Citation::SonnetCollection { .. } => WorkKind::SonnetCollection,
            Citation::Unclassified => WorkKind::Unclassified,
        }
    }
}

/// One retrievable line of text with its citation metadata.
///
/// Serialized field names match the interchange format consumed by the
/// rebuild tooling: `work_title`, `kind`, `text`, `line_number`, `act`,
/// `scene`, `speaker`, `sonnet_number`, `preceding_lines`, `following_lines`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    pub work_title: String,
    #[serde(flatten)]
    pub citation: Citation,
    pub text: String,
    /// 1-based line in the original corpus.
    pub line_number: usize,
    #[serde(default)]
    pub preceding_lines: Vec<String>,
    #[serde(default)]
    pub following_lines: Vec<String>,
}

impl Segment {
    pub fn kind(&self) -> WorkKind {
        self.citation.kind()
    }

    pub fn act(&self) -> Option<u32> {
        match &self.citation {
            Citation::Play { act, .. } => *act,
            _ => None,
        }
    }

    pub fn scene(&self) -> Option<u32> {
        match &self.citation {
            Citation::Play { scene, .. } => *scene,
            _ => None,
        }
    }

    pub fn speaker(&self) -> Option<&str> {
        match &self.citation {
            Citation::Play { speaker, .. } => speaker.as_deref(),
            _ => None,
        }
    }

    pub fn sonnet_number(&self) -> Option<u32> {
        match &self.citation {
            Citation::SonnetCollection { sonnet_number } => *sonnet_number,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    #[default]
    AnyWord,
    ExactPhrase,
    RegularExpression,
}

/// A structured search request. `fuzzy` only affects `AnyWord`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    pub text: String,
    #[serde(default)]
    pub mode: QueryMode,
    #[serde(default)]
    pub work_filter: Option<String>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub fuzzy: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: QueryMode::AnyWord,
            work_filter: None,
            case_sensitive: false,
            fuzzy: false,
            limit: default_limit(),
        }
    }

    pub fn mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn work_filter(mut self, title: impl Into<String>) -> Self {
        self.work_filter = Some(title.into());
        self
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn fuzzy(mut self, yes: bool) -> Self {
        self.fuzzy = yes;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Half-open `[start, end)` character offsets into `QueryHit::segment.text`.
pub type MatchPosition = (usize, usize);

/// A ranked search result. Positions are sorted and non-overlapping and
/// always index the original-case text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryHit {
    pub id: String,
    #[serde(flatten)]
    pub segment: Segment,
    pub score: f32,
    pub match_positions: Vec<MatchPosition>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStatistics {
    pub document_count: u64,
    pub work_count: usize,
}
