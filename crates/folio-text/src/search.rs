use std::cmp::{Ordering, Reverse};
use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{AllQuery, BooleanQuery, ConstScoreQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::tokenizer::TokenStream;
use tantivy::{DocAddress, DocId, Score, Searcher, SegmentReader, TantivyDocument, Term};
use tracing::debug;

use folio_core::error::{Error, Result};
use folio_core::types::{QueryHit, QueryMode, QueryRequest};

use crate::document::IndexDocument;
use crate::highlight::{phrase_positions, regex_positions, term_positions, QueryTerm};
use crate::index::CorpusIndex;

impl CorpusIndex {
    /// Runs one query against the committed index.
    ///
    /// Hits are ordered by descending score, ties by ascending line number.
    /// A blank query, or one made only of stop words, yields no hits.
    pub fn search(&self, request: &QueryRequest) -> Result<Vec<QueryHit>> {
        self.ensure_ready()?;
        if request.text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let limit = request.limit.clamp(1, self.search_config.max_limit.max(1));

        let hits = match request.mode {
            QueryMode::AnyWord => self.search_words(request, limit)?,
            QueryMode::ExactPhrase => self.search_phrase(request, limit)?,
            QueryMode::RegularExpression => self.search_regex(request, limit)?,
        };
        debug!(query = %request.text, mode = ?request.mode, hits = hits.len(), "search finished");
        Ok(hits)
    }

    fn search_words(&self, request: &QueryRequest, limit: usize) -> Result<Vec<QueryHit>> {
        let field = if request.case_sensitive { self.fields.text } else { self.fields.text_folded };
        let mut analyzer = self.index.tokenizer_for_field(field).map_err(Error::backend)?;

        let mut terms: Vec<QueryTerm> = Vec::new();
        let mut stream = analyzer.token_stream(&request.text);
        while stream.advance() {
            let word = stream.token().text.clone();
            if terms.iter().any(|t| t.text == word) {
                continue;
            }
            let max_distance = if request.fuzzy { self.fuzzy_distance(&word) } else { 0 };
            terms.push(QueryTerm { text: word, max_distance });
        }
        drop(stream);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for term in &terms {
            let indexed = Term::from_field_text(field, &term.text);
            clauses.push((Occur::Should, Box::new(TermQuery::new(indexed.clone(), IndexRecordOption::WithFreqs))));
            if term.max_distance > 0 {
                clauses.push((Occur::Should, Box::new(FuzzyTermQuery::new(indexed, term.max_distance, true))));
            }
        }
        let query = self.filtered(Box::new(BooleanQuery::new(clauses)), request.work_filter.as_deref());

        let collector = TopDocs::with_limit(limit).tweak_score(|segment_reader: &SegmentReader| {
            let lines = segment_reader.fast_fields().u64("line_number").ok();
            move |doc: DocId, score: Score| {
                let line = lines.as_ref().and_then(|column| column.first(doc)).unwrap_or(u64::MAX);
                (score, Reverse(line))
            }
        });

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&*query, &collector).map_err(Error::backend)?;
        let mut hits = Vec::with_capacity(top_docs.len());
        for ((score, _), address) in top_docs {
            let document = self.load(&searcher, address)?;
            let match_positions = term_positions(&mut analyzer, &document.segment.text, &terms);
            hits.push(QueryHit { id: document.id, segment: document.segment, score, match_positions });
        }
        Ok(hits)
    }

    fn search_phrase(&self, request: &QueryRequest, limit: usize) -> Result<Vec<QueryHit>> {
        let phrase = request.text.trim();
        let mut analyzer = self.index.tokenizer_for_field(self.fields.text_folded).map_err(Error::backend)?;

        // Only words strictly inside the phrase are whole words in every match.
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        let mut stream = analyzer.token_stream(phrase);
        while stream.advance() {
            let token = stream.token();
            if token.offset_from > 0 && token.offset_to < phrase.len() {
                let term = Term::from_field_text(self.fields.text_folded, &token.text);
                clauses.push((Occur::Must, Box::new(TermQuery::new(term, IndexRecordOption::Basic))));
            }
        }
        let candidates: Box<dyn Query> =
            if clauses.is_empty() { Box::new(AllQuery) } else { Box::new(BooleanQuery::new(clauses)) };

        self.verify_candidates(candidates, request, limit, |text| {
            phrase_positions(text, phrase, request.case_sensitive)
        })
    }

    fn search_regex(&self, request: &QueryRequest, limit: usize) -> Result<Vec<QueryHit>> {
        let re = regex::RegexBuilder::new(&request.text)
            .case_insensitive(!request.case_sensitive)
            .build()
            .map_err(|e| Error::QuerySyntax { pattern: request.text.clone(), message: e.to_string() })?;
        self.verify_candidates(Box::new(AllQuery), request, limit, |text| regex_positions(text, &re))
    }

    /// Scores each candidate by its number of matches in the stored text and
    /// drops candidates with none.
    fn verify_candidates<F>(
        &self,
        candidates: Box<dyn Query>,
        request: &QueryRequest,
        limit: usize,
        locate: F,
    ) -> Result<Vec<QueryHit>>
    where
        F: Fn(&str) -> Vec<(usize, usize)>,
    {
        let query = self.filtered(candidates, request.work_filter.as_deref());
        let searcher = self.reader.searcher();
        let addresses = searcher.search(&*query, &DocSetCollector).map_err(Error::backend)?;
        debug!(candidates = addresses.len(), "verifying candidates");

        let mut hits = Vec::new();
        for address in addresses {
            let document = self.load(&searcher, address)?;
            let match_positions = locate(&document.segment.text);
            if match_positions.is_empty() {
                continue;
            }
            let score = match_positions.len() as f32;
            hits.push(QueryHit { id: document.id, segment: document.segment, score, match_positions });
        }
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.segment.line_number.cmp(&b.segment.line_number))
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    /// Restricts `query` to one work without contributing to its score.
    fn filtered(&self, query: Box<dyn Query>, work_filter: Option<&str>) -> Box<dyn Query> {
        match work_filter {
            None => query,
            Some(title) => {
                let exact = TermQuery::new(Term::from_field_text(self.fields.work_title, title), IndexRecordOption::Basic);
                let restriction: Box<dyn Query> = Box::new(ConstScoreQuery::new(Box::new(exact), 0.0));
                Box::new(BooleanQuery::new(vec![(Occur::Must, query), (Occur::Must, restriction)]))
            }
        }
    }

    fn fuzzy_distance(&self, word: &str) -> u8 {
        let max = self.search_config.fuzzy_max_distance;
        if word.chars().count() <= 4 { max.min(1) } else { max }
    }

    fn load(&self, searcher: &Searcher, address: DocAddress) -> Result<IndexDocument> {
        let doc: TantivyDocument = searcher.doc(address).map_err(Error::backend)?;
        IndexDocument::from_tantivy(&doc, &self.fields)
    }
}
