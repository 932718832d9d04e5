use tantivy::schema::{
    Field, FieldType, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED, STRING,
};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

use folio_core::error::{Error, Result};

/// Original-case words, used when a query is case sensitive.
pub const VERBATIM_TOKENIZER: &str = "folio_verbatim";
/// Lower-cased words, the default matching field.
pub const FOLDED_TOKENIZER: &str = "folio_folded";
/// Tantivy's untokenized analyzer behind `STRING` fields.
const RAW_TOKENIZER: &str = "raw";

pub const STOP_WORDS: &[&str] = &[
    "a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

/// Exact-match fields: whole-value equality only, never tokenized.
const EXACT_FIELDS: &[&str] = &["id", "work_title", "kind"];

pub fn build_schema() -> Schema {
    let mut schema_builder = Schema::builder();
    schema_builder.add_text_field("id", STRING | STORED);
    schema_builder.add_text_field("work_title", STRING | STORED);
    schema_builder.add_text_field("kind", STRING | STORED);

    let verbatim = TextFieldIndexing::default()
        .set_tokenizer(VERBATIM_TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    schema_builder.add_text_field("text", TextOptions::default().set_indexing_options(verbatim).set_stored());
    let folded = TextFieldIndexing::default()
        .set_tokenizer(FOLDED_TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    schema_builder.add_text_field("text_folded", TextOptions::default().set_indexing_options(folded));

    schema_builder.add_u64_field("line_number", INDEXED | STORED | FAST);
    schema_builder.add_u64_field("act", STORED);
    schema_builder.add_u64_field("scene", STORED);
    schema_builder.add_u64_field("sonnet_number", STORED);
    schema_builder.add_text_field("speaker", STORED);
    schema_builder.add_text_field("preceding_lines", STORED);
    schema_builder.add_text_field("following_lines", STORED);
    schema_builder.build()
}

pub fn register_tokenizers(index: &Index) {
    let folded = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
        .build();
    index.tokenizers().register(FOLDED_TOKENIZER, folded);

    let verbatim = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(StopWordFilter::remove(verbatim_stop_words()))
        .build();
    index.tokenizers().register(VERBATIM_TOKENIZER, verbatim);
}

/// Stop words as they appear in original-case text: lower, Capitalized, UPPER.
fn verbatim_stop_words() -> Vec<String> {
    let mut words = Vec::with_capacity(STOP_WORDS.len() * 3);
    for word in STOP_WORDS {
        let mut chars = word.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        words.push(word.to_string());
        words.push(capitalized);
        words.push(word.to_uppercase());
    }
    words
}

/// Fails with `SchemaViolation` when an existing index types a field
/// differently, most importantly a tokenized `work_title`.
pub fn verify_schema(schema: &Schema) -> Result<()> {
    for name in EXACT_FIELDS {
        expect_tokenizer(schema, name, RAW_TOKENIZER)?;
    }
    expect_tokenizer(schema, "text", VERBATIM_TOKENIZER)?;
    expect_tokenizer(schema, "text_folded", FOLDED_TOKENIZER)?;
    let line_number = schema
        .get_field("line_number")
        .map_err(|_| Error::SchemaViolation("missing field 'line_number'".to_string()))?;
    if !schema.get_field_entry(line_number).is_fast() {
        return Err(Error::SchemaViolation("'line_number' must be a fast field".to_string()));
    }
    Ok(())
}

fn expect_tokenizer(schema: &Schema, name: &str, tokenizer: &str) -> Result<()> {
    let field = schema
        .get_field(name)
        .map_err(|_| Error::SchemaViolation(format!("missing field '{name}'")))?;
    let actual = match schema.get_field_entry(field).field_type() {
        FieldType::Str(options) => options.get_indexing_options().map(|i| i.tokenizer().to_string()),
        _ => return Err(Error::SchemaViolation(format!("field '{name}' is not a text field"))),
    };
    match actual {
        Some(actual) if actual == tokenizer => Ok(()),
        Some(actual) => Err(Error::SchemaViolation(format!(
            "field '{name}' uses tokenizer '{actual}', expected '{tokenizer}'"
        ))),
        None => Err(Error::SchemaViolation(format!("field '{name}' is not indexed"))),
    }
}

/// Resolved handles for every schema field.
#[derive(Debug, Clone, Copy)]
pub struct Fields {
    pub id: Field,
    pub work_title: Field,
    pub kind: Field,
    pub text: Field,
    pub text_folded: Field,
    pub line_number: Field,
    pub act: Field,
    pub scene: Field,
    pub sonnet_number: Field,
    pub speaker: Field,
    pub preceding_lines: Field,
    pub following_lines: Field,
}

impl Fields {
    pub fn resolve(schema: &Schema) -> Result<Self> {
        let get = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| Error::SchemaViolation(format!("missing field '{name}'")))
        };
        Ok(Self {
            id: get("id")?,
            work_title: get("work_title")?,
            kind: get("kind")?,
            text: get("text")?,
            text_folded: get("text_folded")?,
            line_number: get("line_number")?,
            act: get("act")?,
            scene: get("scene")?,
            sonnet_number: get("sonnet_number")?,
            speaker: get("speaker")?,
            preceding_lines: get("preceding_lines")?,
            following_lines: get("following_lines")?,
        })
    }
}
