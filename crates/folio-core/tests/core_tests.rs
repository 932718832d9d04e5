use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

use folio_core::config::SegmenterConfig;
use folio_core::interchange::{read_segments, write_segments};
use folio_core::types::WorkKind;
use folio_core::Segmenter;

/// Fifty lines of table of contents, including titles and act markers that
/// must not be mistaken for content.
fn toc_padding() -> Vec<String> {
    let mut lines = vec!["The Complete Works".to_string(), "Contents".to_string()];
    let listed = ["THE SONNETS", "THE TRAGEDY OF HAMLET, PRINCE OF DENMARK", "THE TEMPEST", "ACT I"];
    while lines.len() < 50 {
        lines.push(listed[lines.len() % listed.len()].to_string());
    }
    lines
}

fn corpus(body: &[&str]) -> String {
    let mut lines = toc_padding();
    lines.extend(body.iter().map(|s| s.to_string()));
    lines.join("\n")
}

#[test]
fn hamlet_boundary_example() {
    let text = corpus(&[
        "THE TRAGEDY OF HAMLET, PRINCE OF DENMARK",
        "ACT I",
        "SCENE I",
        "HAMLET. To be or not to be, that is the question.",
    ]);
    let segmenter = Segmenter::new(SegmenterConfig::default()).expect("segmenter");
    let result = segmenter.segment(&text);

    assert!(result.degraded.is_none());
    assert_eq!(result.segments.len(), 1, "one dialogue line becomes one segment");
    let seg = &result.segments[0];
    assert_eq!(seg.work_title, "THE TRAGEDY OF HAMLET, PRINCE OF DENMARK");
    assert_eq!(seg.act(), Some(1));
    assert_eq!(seg.scene(), Some(1));
    assert_eq!(seg.speaker(), Some("HAMLET"));
    assert_eq!(seg.text, "To be or not to be, that is the question.");
    assert_eq!(seg.line_number, 54);
}

#[test]
fn multi_work_corpus_keeps_metadata_exclusive_by_kind() {
    let text = corpus(&[
        "THE SONNETS",
        "",
        "1",
        "From fairest creatures we desire increase,",
        "That thereby beauty's rose might never die,",
        "",
        "II",
        "When forty winters shall besiege thy brow,",
        "THE TRAGEDY OF ROMEO AND JULIET",
        "ACT II",
        "SCENE II. Capulet's orchard.",
        "Enter Romeo.",
        "ROMEO.",
        "He jests at scars that never felt a wound.",
        "[Juliet appears above at a window.]",
        "But soft, what light through yonder window breaks?",
        "THE TEMPEST",
        "ACT I",
        "SCENE I. On a ship at sea.",
        "MASTER. Boatswain!",
    ]);
    let segmenter = Segmenter::new(SegmenterConfig::default()).expect("segmenter");
    let result = segmenter.segment(&text);

    let titles: BTreeSet<&str> = result.works.iter().map(|w| w.title.as_str()).collect();
    assert_eq!(titles, BTreeSet::from(["THE SONNETS", "THE TRAGEDY OF ROMEO AND JULIET", "THE TEMPEST"]));

    for seg in &result.segments {
        match seg.kind() {
            WorkKind::Play => assert!(seg.sonnet_number().is_none()),
            WorkKind::SonnetCollection => {
                assert!(seg.act().is_none() && seg.scene().is_none() && seg.speaker().is_none());
                assert!(seg.sonnet_number().is_some());
            }
            WorkKind::Unclassified => panic!("no unclassified work expected"),
        }
    }

    let romeo: Vec<&str> = result
        .segments
        .iter()
        .filter(|s| s.speaker() == Some("ROMEO"))
        .map(|s| s.text.as_str())
        .collect();
    // The entrance line precedes the speaker marker; the bracketed direction is dropped.
    assert_eq!(romeo, vec![
        "He jests at scars that never felt a wound.",
        "But soft, what light through yonder window breaks?",
    ]);

    let counts = result.segments_per_work();
    assert_eq!(counts["THE SONNETS"], 3);
    assert_eq!(counts["THE TEMPEST"], 1);
}

#[test]
fn segment_file_and_interchange_round_trip() {
    let tmp = TempDir::new().unwrap();
    let corpus_path = tmp.path().join("corpus.txt");
    fs::write(&corpus_path, corpus(&["THE SONNETS", "18", "Shall I compare thee to a summer's day?"])).unwrap();

    let segmenter = Segmenter::new(SegmenterConfig::default()).expect("segmenter");
    let result = segmenter.segment_file(&corpus_path).expect("segment file");
    assert_eq!(result.segments.len(), 1);
    assert_eq!(result.segments[0].sonnet_number(), Some(18));

    let out = tmp.path().join("segments.json");
    write_segments(&out, &result.segments).expect("write");
    assert_eq!(read_segments(&out).expect("read"), result.segments);
}

#[test]
fn corpus_without_titles_still_segments() {
    let text = corpus(&["ACT I", "SCENE II", "HAMLET. Who's there?", "Some untitled dialogue line"]);
    let segmenter = Segmenter::new(SegmenterConfig::default()).expect("segmenter");
    let result = segmenter.segment(&text);
    assert!(result.degraded.is_some());
    assert_eq!(result.works.len(), 1);
    assert_eq!(result.works[0].kind, WorkKind::Unclassified);
    // Markers and speaker prefixes never reach segment text, even without a title.
    let texts: Vec<&str> = result.segments.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Who's there?", "Some untitled dialogue line"]);
    assert!(result.segments.iter().all(|s| s.act().is_none() && s.speaker().is_none()));
}
