//! Match positions as character offsets into the original-case stored text.
//!
//! Offsets are recomputed from the stored text rather than taken from index
//! postings, so highlighting stays correct after case folding.

use regex::Regex;
use tantivy::tokenizer::{TextAnalyzer, TokenStream};

use folio_core::types::MatchPosition;

/// One analyzed query word and how loosely it may match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub text: String,
    pub max_distance: u8,
}

impl QueryTerm {
    pub fn matches(&self, word: &str) -> bool {
        word == self.text
            || (self.max_distance > 0 && edit_distance(word, &self.text) <= usize::from(self.max_distance))
    }
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

/// Positions of every analyzed word in `text` that matches one of `terms`.
pub fn term_positions(analyzer: &mut TextAnalyzer, text: &str, terms: &[QueryTerm]) -> Vec<MatchPosition> {
    let mut positions = Vec::new();
    let mut stream = analyzer.token_stream(text);
    while stream.advance() {
        let token = stream.token();
        if terms.iter().any(|t| t.matches(&token.text)) {
            positions.push((char_offset(text, token.offset_from), char_offset(text, token.offset_to)));
        }
    }
    positions
}

/// Text with a byte-to-original-character map, optionally lower-cased.
struct Folded {
    text: String,
    origin: Vec<usize>,
}

impl Folded {
    fn new(text: &str, case_sensitive: bool) -> Self {
        let mut folded = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());
        for (ci, c) in text.chars().enumerate() {
            let mut push = |out: char| {
                folded.push(out);
                origin.extend(std::iter::repeat(ci).take(out.len_utf8()));
            };
            if case_sensitive {
                push(c);
            } else {
                for lower in c.to_lowercase() {
                    push(lower);
                }
            }
        }
        Self { text: folded, origin }
    }
}

fn fold(text: &str, case_sensitive: bool) -> String {
    if case_sensitive { text.to_string() } else { text.chars().flat_map(char::to_lowercase).collect() }
}

/// Non-overlapping occurrences of `phrase` inside `text`.
pub fn phrase_positions(text: &str, phrase: &str, case_sensitive: bool) -> Vec<MatchPosition> {
    let needle = fold(phrase, case_sensitive);
    if needle.is_empty() {
        return Vec::new();
    }
    let haystack = Folded::new(text, case_sensitive);
    haystack
        .text
        .match_indices(needle.as_str())
        .map(|(start, m)| (haystack.origin[start], haystack.origin[start + m.len() - 1] + 1))
        .collect()
}

/// Non-empty regex matches inside `text`.
pub fn regex_positions(text: &str, re: &Regex) -> Vec<MatchPosition> {
    re.find_iter(text)
        .filter(|m| !m.is_empty())
        .map(|m| (char_offset(text, m.start()), char_offset(text, m.end())))
        .collect()
}

/// Optimal string alignment distance: insertions, deletions, substitutions
/// and adjacent transpositions each cost one.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut matrix = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        matrix[0][j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (matrix[i - 1][j] + 1).min(matrix[i][j - 1] + 1).min(matrix[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(matrix[i - 2][j - 2] + 1);
            }
            matrix[i][j] = best;
        }
    }
    matrix[a.len()][b.len()]
}
