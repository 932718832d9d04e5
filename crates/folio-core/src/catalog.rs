//! Closed catalog of work titles recognized as boundaries in the corpus.
//!
//! Works whose title is missing here are not split out: their lines stay in
//! the preceding work's span.

use regex::Regex;

use crate::error::Result;
use crate::types::WorkKind;

const TITLE_PATTERNS: &[(&str, WorkKind)] = &[
    (r"THE SONNETS", WorkKind::SonnetCollection),
    (r"THE TRAGEDY OF .+", WorkKind::Play),
    (r"THE COMEDY OF .+", WorkKind::Play),
    (r"THE HISTORY OF .+", WorkKind::Play),
    (r"THE LIFE (?:AND DEATH )?OF .+", WorkKind::Play),
    (r"THE (?:FIRST|SECOND|THIRD) PART OF .+", WorkKind::Play),
    (r"ALL['’]S WELL,? THAT ENDS WELL", WorkKind::Play),
    (r"AS YOU LIKE IT", WorkKind::Play),
    (r"A MIDSUMMER NIGHT['’]S DREAM", WorkKind::Play),
    (r"LOVE['’]S LABOUR['’]S LOST", WorkKind::Play),
    (r"THE MERCHANT OF VENICE", WorkKind::Play),
    (r"THE TAMING OF THE SHREW", WorkKind::Play),
    (r"THE TEMPEST", WorkKind::Play),
    (r"TWELFTH NIGHT(?:;? OR,? WHAT YOU WILL)?", WorkKind::Play),
    (r"THE WINTER['’]S TALE", WorkKind::Play),
    (r"MUCH ADO ABOUT NOTHING", WorkKind::Play),
    (r"MEASURE FOR MEASURE", WorkKind::Play),
    (r"THE MERRY WIVES OF WINDSOR", WorkKind::Play),
];

pub struct TitleCatalog {
    entries: Vec<(Regex, WorkKind)>,
}

impl TitleCatalog {
    pub fn new() -> Result<Self> {
        let entries = TITLE_PATTERNS
            .iter()
            .map(|(pattern, kind)| Ok((Regex::new(&format!("(?i)^(?:{pattern})$"))?, *kind)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Kind of the work introduced by `line`, if the whole trimmed line is a
    /// catalog title.
    pub fn classify(&self, line: &str) -> Option<WorkKind> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        self.entries.iter().find(|(re, _)| re.is_match(line)).map(|(_, kind)| *kind)
    }
}
