//! JSON interchange for segment lists: one array, one object per segment.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::types::Segment;

pub fn write_segments(path: &Path, segments: &[Segment]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, segments)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), segments = segments.len(), "wrote segments");
    Ok(())
}

pub fn read_segments(path: &Path) -> Result<Vec<Segment>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Citation;
    use tempfile::TempDir;

    #[test]
    fn segments_survive_a_file_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/segments.json");
        let segments = vec![
            Segment {
                work_title: "THE SONNETS".to_string(),
                citation: Citation::SonnetCollection { sonnet_number: Some(18) },
                text: "Shall I compare thee to a summer's day?".to_string(),
                line_number: 300,
                preceding_lines: vec!["18".to_string()],
                following_lines: vec!["Thou art more lovely and more temperate:".to_string()],
            },
            Segment {
                work_title: "UNCLASSIFIED".to_string(),
                citation: Citation::Unclassified,
                text: "FINIS".to_string(),
                line_number: 9000,
                preceding_lines: vec![],
                following_lines: vec![],
            },
        ];
        write_segments(&path, &segments).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"sonnet_number\": 18"));
        assert!(!raw.contains("\"act\""));
        assert_eq!(read_segments(&path).unwrap(), segments);
    }
}
