//! Corpus segmentation: table-of-contents skipping, work boundaries and
//! per-work line segmentation with act/scene/speaker/sonnet tracking.

use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::catalog::TitleCatalog;
use crate::config::SegmenterConfig;
use crate::error::{ParseDegraded, Result};
use crate::numeral::parse_numeral;
use crate::types::{Citation, LineSpan, Segment, Work, WorkKind, UNCLASSIFIED_TITLE};

/// Lines shorter than this (after trimming) are formatting noise.
const MIN_SEGMENT_CHARS: usize = 3;

struct Patterns {
    act: Regex,
    scene: Regex,
    entrance: Regex,
    speaker: Regex,
    numeral: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Self {
            act: Regex::new(r"(?i)^ACT\s+([IVXLC]+|\d+)\b")?,
            scene: Regex::new(r"(?i)^SCENE\s+([IVXLC]+|\d+)\b")?,
            entrance: Regex::new(r"^Enter\s+")?,
            speaker: Regex::new(r"^([A-Z][A-Z ]+)\.(?:\s+(.*))?$")?,
            numeral: Regex::new(r"^([IVXLCDM]+|\d+)\.?$")?,
        })
    }

    fn act(&self, line: &str) -> Option<u32> {
        self.act.captures(line).and_then(|c| parse_numeral(&c[1]))
    }

    fn scene(&self, line: &str) -> Option<u32> {
        self.scene.captures(line).and_then(|c| parse_numeral(&c[1]))
    }

    fn sonnet(&self, line: &str) -> Option<u32> {
        self.numeral.captures(line).and_then(|c| parse_numeral(&c[1]))
    }

    /// Speaker name and the dialogue following it on the same line, if any.
    fn speaker<'a>(&self, line: &'a str) -> Option<(&'a str, Option<&'a str>)> {
        let caps = self.speaker.captures(line)?;
        let name = caps.get(1)?.as_str().trim();
        let dialogue = caps.get(2).map(|m| m.as_str().trim()).filter(|d| !d.is_empty());
        Some((name, dialogue))
    }

    fn is_content_indicator(&self, line: &str) -> bool {
        self.act.is_match(line)
            || self.scene.is_match(line)
            || self.entrance.is_match(line)
            || self.speaker.is_match(line)
            || self.numeral.is_match(line)
    }
}

fn is_stage_direction(text: &str) -> bool {
    matches!(text.chars().next(), Some('[' | '(' | '<'))
}

/// Works and segments recovered from one corpus.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub works: Vec<Work>,
    pub segments: Vec<Segment>,
    /// 0-based line where structural parsing started.
    pub content_start: usize,
    pub degraded: Option<ParseDegraded>,
}

impl Segmentation {
    pub fn segments_per_work(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for seg in &self.segments {
            *counts.entry(seg.work_title.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Running citation state inside one work.
#[derive(Default)]
struct Cursor {
    act: Option<u32>,
    scene: Option<u32>,
    speaker: Option<String>,
    sonnet: Option<u32>,
}

impl Cursor {
    fn citation(&self, kind: WorkKind) -> Citation {
        match kind {
            WorkKind::Play => Citation::Play { act: self.act, scene: self.scene, speaker: self.speaker.clone() },
            WorkKind::SonnetCollection => Citation::SonnetCollection { sonnet_number: self.sonnet },
            WorkKind::Unclassified => Citation::Unclassified,
        }
    }
}

pub struct Segmenter {
    config: SegmenterConfig,
    patterns: Patterns,
    catalog: TitleCatalog,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Result<Self> {
        Ok(Self { config, patterns: Patterns::new()?, catalog: TitleCatalog::new()? })
    }

    pub fn segment_file(&self, path: &Path) -> Result<Segmentation> {
        let bytes = fs::read(path)?;
        let corpus = String::from_utf8_lossy(&bytes);
        info!(path = %path.display(), bytes = bytes.len(), "segmenting corpus file");
        Ok(self.segment(&corpus))
    }

    pub fn segment(&self, corpus: &str) -> Segmentation {
        let lines: Vec<&str> = corpus.lines().collect();
        let content_start = self.find_content_start(&lines);
        let (works, degraded) = self.find_work_boundaries(&lines, content_start);
        if let Some(d) = &degraded {
            warn!("{d}");
        }

        let mut segments = Vec::new();
        for work in &works {
            let before = segments.len();
            self.segment_work(&lines, work, &mut segments);
            debug!(
                title = %work.title,
                kind = %work.kind,
                start = work.span.start,
                end = work.span.end,
                segments = segments.len() - before,
                "segmented work"
            );
        }
        info!(lines = lines.len(), content_start, works = works.len(), segments = segments.len(), "segmentation complete");

        Segmentation { works, segments, content_start, degraded }
    }

    /// First structural line after the table of contents, moved back onto a
    /// title line sitting just above it.
    fn find_content_start(&self, lines: &[&str]) -> usize {
        let floor = self.config.toc_skip_lines.min(lines.len());
        let Some(first) = (floor..lines.len()).find(|&i| self.patterns.is_content_indicator(lines[i].trim())) else {
            debug!(fallback = floor, "no content indicator found");
            return floor;
        };
        let lookback_floor = first.saturating_sub(self.config.title_lookback).max(floor);
        (lookback_floor..first)
            .rev()
            .find(|&i| self.catalog.classify(lines[i]).is_some())
            .unwrap_or(first)
    }

    fn find_work_boundaries(&self, lines: &[&str], content_start: usize) -> (Vec<Work>, Option<ParseDegraded>) {
        let mut works = Vec::new();
        let mut open: Option<(String, WorkKind, usize)> = None;
        let mut first_title = None;
        let mut seen = HashSet::new();

        for (i, raw) in lines.iter().enumerate().skip(content_start) {
            let line = raw.trim();
            let Some(kind) = self.catalog.classify(line) else { continue };
            if !seen.insert(line.to_ascii_uppercase()) {
                let reopens = open.as_ref().is_some_and(|(title, _, _)| !title.eq_ignore_ascii_case(line));
                if reopens {
                    warn!(line = i + 1, title = line, "title of an earlier work repeated; kept in the current work");
                }
                continue;
            }
            if let Some((title, kind, start)) = open.take() {
                works.push(Work { title, kind, span: LineSpan::new(start, i) });
            }
            first_title.get_or_insert(i);
            open = Some((line.to_string(), kind, i + 1));
        }
        if let Some((title, kind, start)) = open {
            works.push(Work { title, kind, span: LineSpan::new(start, lines.len()) });
        }

        match first_title {
            Some(first) => {
                let skipped = lines[content_start..first].iter().filter(|l| !l.trim().is_empty()).count();
                if skipped > 0 {
                    warn!(skipped, content_start, first_title = first, "lines before the first work title were not segmented");
                }
                (works, None)
            }
            None => {
                let span = LineSpan::new(content_start, lines.len());
                let degraded = ParseDegraded { start: span.start, end: span.end };
                works.push(Work { title: UNCLASSIFIED_TITLE.to_string(), kind: WorkKind::Unclassified, span });
                (works, Some(degraded))
            }
        }
    }

    fn segment_work(&self, lines: &[&str], work: &Work, out: &mut Vec<Segment>) {
        let mut cursor = Cursor::default();

        for i in work.span.start..work.span.end {
            let line = lines[i].trim();
            if line.is_empty() || self.catalog.classify(line).is_some() {
                continue;
            }

            // Unclassified works drop markers and speaker prefixes too; their
            // citation simply ignores the cursor.
            let text = match work.kind {
                WorkKind::Play | WorkKind::Unclassified => {
                    if let Some(act) = self.patterns.act(line) {
                        cursor.act = Some(act);
                        cursor.scene = None;
                        continue;
                    }
                    if let Some(scene) = self.patterns.scene(line) {
                        cursor.scene = Some(scene);
                        continue;
                    }
                    match self.patterns.speaker(line) {
                        Some((name, dialogue)) => {
                            cursor.speaker = Some(name.to_string());
                            match dialogue {
                                Some(d) => d,
                                None => continue,
                            }
                        }
                        None => line,
                    }
                }
                WorkKind::SonnetCollection => {
                    if let Some(number) = self.patterns.sonnet(line) {
                        cursor.sonnet = Some(number);
                        continue;
                    }
                    line
                }
            };

            if is_stage_direction(text) || text.chars().count() < MIN_SEGMENT_CHARS {
                continue;
            }

            out.push(Segment {
                work_title: work.title.clone(),
                citation: cursor.citation(work.kind),
                text: text.to_string(),
                line_number: i + 1,
                preceding_lines: self.context_before(lines, work.span, i),
                following_lines: self.context_after(lines, work.span, i),
            });
        }
    }

    fn context_before(&self, lines: &[&str], span: LineSpan, i: usize) -> Vec<String> {
        let mut before: Vec<String> = lines[span.start..i]
            .iter()
            .rev()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .take(self.config.context_lines)
            .map(str::to_string)
            .collect();
        before.reverse();
        before
    }

    fn context_after(&self, lines: &[&str], span: LineSpan, i: usize) -> Vec<String> {
        lines[i + 1..span.end]
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .take(self.config.context_lines)
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> Segmenter {
        Segmenter::new(SegmenterConfig { toc_skip_lines: 2, context_lines: 2, title_lookback: 3 }).unwrap()
    }

    fn corpus(lines: &[&str]) -> String {
        let mut text = String::from("Contents\nTHE TEMPEST\n");
        text.push_str(&lines.join("\n"));
        text
    }

    #[test]
    fn speaker_line_without_dialogue_sets_speaker_for_following_lines() {
        let text = corpus(&["THE TEMPEST", "ACT II", "SCENE 3", "ARIEL.", "Full fathom five thy father lies;"]);
        let result = segmenter().segment(&text);
        assert_eq!(result.segments.len(), 1);
        let seg = &result.segments[0];
        assert_eq!(seg.speaker(), Some("ARIEL"));
        assert_eq!(seg.act(), Some(2));
        assert_eq!(seg.scene(), Some(3));
        assert_eq!(seg.line_number, 7);
    }

    #[test]
    fn new_act_clears_scene() {
        let text = corpus(&["THE TEMPEST", "ACT I", "SCENE II", "MIRANDA. If by your art,", "ACT II", "MIRANDA. Alack, what trouble"]);
        let result = segmenter().segment(&text);
        assert_eq!(result.segments.len(), 2);
        assert_eq!((result.segments[0].act(), result.segments[0].scene()), (Some(1), Some(2)));
        assert_eq!((result.segments[1].act(), result.segments[1].scene()), (Some(2), None));
    }

    #[test]
    fn drops_stage_directions_and_short_lines() {
        let text = corpus(&["THE TEMPEST", "ACT I", "[Enter Prospero]", "(Thunder)", "<aside>", "O!", "PROSPERO. [Aside] Hush.", "PROSPERO. Be collected."]);
        let result = segmenter().segment(&text);
        let texts: Vec<&str> = result.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Be collected."]);
    }

    #[test]
    fn sonnet_numbers_reset_per_marker() {
        let text = corpus(&["THE SONNETS", "I", "From fairest creatures we desire increase,", "2", "When forty winters shall besiege thy brow,"]);
        let result = segmenter().segment(&text);
        assert_eq!(result.works.len(), 1);
        assert_eq!(result.works[0].kind, WorkKind::SonnetCollection);
        let numbers: Vec<Option<u32>> = result.segments.iter().map(|s| s.sonnet_number()).collect();
        assert_eq!(numbers, vec![Some(1), Some(2)]);
        assert!(result.segments.iter().all(|s| s.act().is_none() && s.speaker().is_none()));
    }

    #[test]
    fn context_stays_inside_the_work() {
        let text = corpus(&[
            "THE SONNETS",
            "1",
            "Line one of the sonnet",
            "THE TEMPEST",
            "ACT I",
            "MASTER. Boatswain!",
            "BOATSWAIN. Here, master: what cheer?",
        ]);
        let result = segmenter().segment(&text);
        let sonnet_line = &result.segments[0];
        assert_eq!(sonnet_line.preceding_lines, vec!["1".to_string()]);
        assert!(sonnet_line.following_lines.is_empty());

        let boatswain = result.segments.last().unwrap();
        assert_eq!(boatswain.preceding_lines, vec!["ACT I".to_string(), "MASTER. Boatswain!".to_string()]);
        assert!(boatswain.following_lines.is_empty());
    }

    #[test]
    fn spans_partition_content_without_title_lines() {
        let text = corpus(&["THE SONNETS", "1", "A verse line here", "THE TEMPEST", "ACT I", "MASTER. Boatswain!"]);
        let result = segmenter().segment(&text);
        assert_eq!(result.works.len(), 2);
        let (sonnets, tempest) = (&result.works[0], &result.works[1]);
        assert_eq!(sonnets.span, LineSpan::new(3, 5));
        assert_eq!(tempest.span, LineSpan::new(6, 8));
        assert_eq!(sonnets.span.end + 1, tempest.span.start);
    }

    #[test]
    fn no_titles_degrades_to_unclassified() {
        let text = "a\nb\nACT I\nHAMLET. Who's there?\nSome plain prose line";
        let result = segmenter().segment(text);
        assert!(result.degraded.is_some());
        assert_eq!(result.works.len(), 1);
        assert_eq!(result.works[0].kind, WorkKind::Unclassified);
        assert_eq!(result.works[0].title, UNCLASSIFIED_TITLE);
        assert!(result.segments.iter().all(|s| s.kind() == WorkKind::Unclassified));
        let texts: Vec<&str> = result.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Who's there?", "Some plain prose line"]);
    }

    #[test]
    fn unclassified_fallback_drops_markers_and_speaker_prefixes() {
        let text = "a\nb\nACT I\nSCENE II\nHAMLET. Who's there?";
        let result = segmenter().segment(text);
        let texts: Vec<&str> = result.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Who's there?"]);
        assert_eq!(result.segments[0].citation, Citation::Unclassified);
        assert_eq!(result.segments[0].line_number, 5);
    }

    #[test]
    fn repeated_title_does_not_open_a_second_work() {
        let text = corpus(&[
            "THE SONNETS",
            "1",
            "From fairest creatures we desire increase,",
            "THE TEMPEST",
            "ACT I",
            "MASTER. Boatswain!",
            "THE SONNETS",
            "BOATSWAIN. Here, master: what cheer?",
        ]);
        let result = segmenter().segment(&text);
        let titles: Vec<&str> = result.works.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["THE SONNETS", "THE TEMPEST"]);
        let last = result.segments.last().unwrap();
        assert_eq!(last.work_title, "THE TEMPEST");
        assert_eq!(last.speaker(), Some("BOATSWAIN"));
        assert!(result.segments.iter().all(|s| s.text != "THE SONNETS"));
    }

    #[test]
    fn content_start_falls_back_to_toc_offset() {
        let text = "one\ntwo\nthree four five\nsix seven eight";
        let result = segmenter().segment(text);
        assert_eq!(result.content_start, 2);
    }
}
