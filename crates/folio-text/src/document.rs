//! Projection of a `Segment` onto a tantivy document and back.

use std::collections::HashMap;
use tantivy::schema::{Field, Value};
use tantivy::TantivyDocument;

use folio_core::error::{Error, Result};
use folio_core::types::{Citation, Segment, WorkKind};

use crate::tantivy_utils::Fields;

/// The stored, queryable form of one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDocument {
    pub id: String,
    pub segment: Segment,
}

impl IndexDocument {
    pub fn to_tantivy(&self, fields: &Fields) -> TantivyDocument {
        let seg = &self.segment;
        let mut doc = TantivyDocument::default();
        doc.add_text(fields.id, &self.id);
        doc.add_text(fields.work_title, &seg.work_title);
        doc.add_text(fields.kind, seg.kind().as_str());
        doc.add_text(fields.text, &seg.text);
        doc.add_text(fields.text_folded, &seg.text);
        doc.add_u64(fields.line_number, seg.line_number as u64);
        match &seg.citation {
            Citation::Play { act, scene, speaker } => {
                if let Some(act) = act {
                    doc.add_u64(fields.act, u64::from(*act));
                }
                if let Some(scene) = scene {
                    doc.add_u64(fields.scene, u64::from(*scene));
                }
                if let Some(speaker) = speaker {
                    doc.add_text(fields.speaker, speaker);
                }
            }
            Citation::SonnetCollection { sonnet_number } => {
                if let Some(n) = sonnet_number {
                    doc.add_u64(fields.sonnet_number, u64::from(*n));
                }
            }
            Citation::Unclassified => {}
        }
        for line in &seg.preceding_lines {
            doc.add_text(fields.preceding_lines, line);
        }
        for line in &seg.following_lines {
            doc.add_text(fields.following_lines, line);
        }
        doc
    }

    pub fn from_tantivy(doc: &TantivyDocument, fields: &Fields) -> Result<Self> {
        let text = |field: Field| doc.get_first(field).and_then(|v| v.as_str()).map(str::to_string);
        let number = |field: Field| doc.get_first(field).and_then(|v| v.as_u64()).and_then(|n| u32::try_from(n).ok());
        let required = |field: Field, name: &str| {
            text(field).ok_or_else(|| Error::SchemaViolation(format!("stored document lacks '{name}'")))
        };
        let all = |field: Field| doc.get_all(field).filter_map(|v| v.as_str()).map(str::to_string).collect::<Vec<_>>();

        let kind: WorkKind = required(fields.kind, "kind")?.parse()?;
        let citation = match kind {
            WorkKind::Play => Citation::Play {
                act: number(fields.act),
                scene: number(fields.scene),
                speaker: text(fields.speaker),
            },
            WorkKind::SonnetCollection => Citation::SonnetCollection { sonnet_number: number(fields.sonnet_number) },
            WorkKind::Unclassified => Citation::Unclassified,
        };
        let line_number = doc
            .get_first(fields.line_number)
            .and_then(|v| v.as_u64())
            .ok_or_else(|| Error::SchemaViolation("stored document lacks 'line_number'".to_string()))?;

        Ok(Self {
            id: required(fields.id, "id")?,
            segment: Segment {
                work_title: required(fields.work_title, "work_title")?,
                citation,
                text: required(fields.text, "text")?,
                line_number: line_number as usize,
                preceding_lines: all(fields.preceding_lines),
                following_lines: all(fields.following_lines),
            },
        })
    }
}

/// Deterministic ids: `<work_title>:<line_number>`, with an ordinal suffix
/// for any repeat of the same pair.
pub fn assign_ids(segments: &[Segment]) -> Vec<IndexDocument> {
    let mut seen: HashMap<(&str, usize), usize> = HashMap::new();
    segments
        .iter()
        .map(|seg| {
            let count = seen.entry((seg.work_title.as_str(), seg.line_number)).or_insert(0);
            *count += 1;
            let id = match *count {
                1 => format!("{}:{}", seg.work_title, seg.line_number),
                n => format!("{}:{}#{}", seg.work_title, seg.line_number, n),
            };
            IndexDocument { id, segment: seg.clone() }
        })
        .collect()
}

/// Rejects values an exact field cannot hold without tokenization.
pub fn validate_segment(seg: &Segment) -> Result<()> {
    let title = &seg.work_title;
    if title.is_empty() {
        return Err(Error::SchemaViolation(format!("line {}: empty work_title", seg.line_number)));
    }
    if title.trim() != title || title.chars().any(char::is_control) {
        return Err(Error::SchemaViolation(format!(
            "line {}: work_title {title:?} has surrounding whitespace or control characters",
            seg.line_number
        )));
    }
    if seg.text.trim().is_empty() {
        return Err(Error::SchemaViolation(format!("line {}: empty text", seg.line_number)));
    }
    if seg.line_number == 0 {
        return Err(Error::SchemaViolation(format!("{title}: line_number must be 1-based")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tantivy_utils::build_schema;

    fn play_segment(line: usize) -> Segment {
        Segment {
            work_title: "THE TEMPEST".to_string(),
            citation: Citation::Play { act: Some(5), scene: None, speaker: Some("PROSPERO".to_string()) },
            text: "We are such stuff as dreams are made on".to_string(),
            line_number: line,
            preceding_lines: vec!["PROSPERO.".to_string(), "Our revels now are ended.".to_string()],
            following_lines: vec!["And our little life".to_string()],
        }
    }

    #[test]
    fn stored_fields_come_back_intact() {
        let fields = Fields::resolve(&build_schema()).unwrap();
        let original = IndexDocument { id: "THE TEMPEST:10".to_string(), segment: play_segment(10) };
        let doc = original.to_tantivy(&fields);
        assert_eq!(IndexDocument::from_tantivy(&doc, &fields).unwrap(), original);
    }

    #[test]
    fn ids_are_deterministic_and_unique() {
        let segments = vec![play_segment(10), play_segment(11), play_segment(10)];
        let ids: Vec<String> = assign_ids(&segments).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["THE TEMPEST:10", "THE TEMPEST:11", "THE TEMPEST:10#2"]);
        let again: Vec<String> = assign_ids(&segments).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn multi_line_title_is_a_schema_violation() {
        let mut seg = play_segment(3);
        seg.work_title = "THE TEMPEST\nACT I".to_string();
        assert!(matches!(validate_segment(&seg), Err(Error::SchemaViolation(_))));
        seg.work_title = " THE TEMPEST".to_string();
        assert!(matches!(validate_segment(&seg), Err(Error::SchemaViolation(_))));
        assert!(validate_segment(&play_segment(3)).is_ok());
    }
}
