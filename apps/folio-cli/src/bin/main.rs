use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_core::config::Config;
use folio_core::interchange::{read_segments, write_segments};
use folio_core::types::{QueryMode, QueryRequest};
use folio_core::Segmenter;
use folio_text::CorpusIndex;

#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Segment, index and search a collected-works corpus")]
struct Args {
    /// Base directory for relative paths in the configuration
    #[arg(long, global = true)]
    base: Option<PathBuf>,

    /// Configuration environment (dev, prod, test); defaults to RUST_ENV
    #[arg(long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split the corpus into segments and write the interchange file
    Segment {
        #[arg(long)]
        corpus: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rebuild the index from the interchange file, or straight from a corpus
    Index {
        #[arg(long, conflicts_with = "corpus")]
        segments: Option<PathBuf>,
        #[arg(long)]
        corpus: Option<PathBuf>,
    },
    /// Query the committed index
    Search {
        query: String,
        #[arg(long, value_enum, default_value_t = Mode::Any)]
        mode: Mode,
        /// Exact work title, as printed by `folio works`
        #[arg(long)]
        work: Option<String>,
        #[arg(long)]
        case_sensitive: bool,
        #[arg(long)]
        fuzzy: bool,
        #[arg(long)]
        limit: Option<usize>,
        /// Print hits as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// List indexed work titles
    Works,
    /// Show index statistics
    Stats,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Any,
    Phrase,
    Regex,
}

impl From<Mode> for QueryMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Any => QueryMode::AnyWord,
            Mode::Phrase => QueryMode::ExactPhrase,
            Mode::Regex => QueryMode::RegularExpression,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "folio=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load_for_env(args.env.as_deref()).context("loading configuration")?;
    let base = match args.base {
        Some(base) => base,
        None => std::env::current_dir()?,
    };
    tracing::debug!(base = %base.display(), index = %config.index_dir(&base).display(), "configuration loaded");

    match args.command {
        Command::Segment { corpus, out } => {
            let corpus = corpus.unwrap_or_else(|| config.corpus_path(&base));
            let out = out.unwrap_or_else(|| config.segments_path(&base));
            let segmenter = Segmenter::new(config.segmenter.clone())?;
            let result = segmenter.segment_file(&corpus).with_context(|| format!("segmenting {}", corpus.display()))?;
            write_segments(&out, &result.segments)?;
            println!("{} segments from {} works -> {}", result.segments.len(), result.works.len(), out.display());
            for (title, count) in result.segments_per_work() {
                println!("  {count:>6}  {title}");
            }
        }
        Command::Index { segments, corpus } => {
            let segments = match corpus {
                Some(corpus) => Segmenter::new(config.segmenter.clone())?.segment_file(&corpus)?.segments,
                None => {
                    let path = segments.unwrap_or_else(|| config.segments_path(&base));
                    read_segments(&path).with_context(|| format!("reading {}", path.display()))?
                }
            };
            let index = CorpusIndex::from_config(&config, &base)?;
            tracing::info!(segments = segments.len(), dir = %index.dir().display(), "rebuilding index");
            let stats = index.build(&segments)?;
            println!("indexed {} documents across {} works in {}", stats.document_count, stats.work_count, index.dir().display());
        }
        Command::Search { query, mode, work, case_sensitive, fuzzy, limit, json } => {
            let index = CorpusIndex::existing_from_config(&config, &base)?;
            let mut request = QueryRequest::new(query)
                .mode(mode.into())
                .case_sensitive(case_sensitive)
                .fuzzy(fuzzy)
                .limit(limit.unwrap_or(config.search.default_limit));
            if let Some(work) = work {
                request = request.work_filter(work);
            }
            let hits = index.search(&request)?;
            if json {
                for hit in &hits {
                    println!("{}", serde_json::to_string(hit)?);
                }
            } else {
                println!("{} hits", hits.len());
                for (i, hit) in hits.iter().enumerate() {
                    println!("\n  {}. score={:.4}  {}  line {}", i + 1, hit.score, hit.segment.work_title, hit.segment.line_number);
                    println!("     {}", highlight(&hit.segment.text, &hit.match_positions));
                }
            }
        }
        Command::Works => {
            let index = CorpusIndex::existing_from_config(&config, &base)?;
            for title in index.list_works()? {
                println!("{title}");
            }
        }
        Command::Stats => {
            let index = CorpusIndex::existing_from_config(&config, &base)?;
            let stats = index.statistics()?;
            println!("documents:  {}", stats.document_count);
            println!("works:      {}", stats.work_count);
            println!("index size: {} bytes", index.index_size_bytes()?);
        }
    }
    Ok(())
}

/// Wraps each matched span in brackets.
fn highlight(text: &str, positions: &[(usize, usize)]) -> String {
    let mut out = String::with_capacity(text.len() + positions.len() * 2);
    for (i, c) in text.chars().enumerate() {
        if positions.iter().any(|&(_, end)| end == i) {
            out.push(']');
        }
        if positions.iter().any(|&(start, _)| start == i) {
            out.push('[');
        }
        out.push(c);
    }
    if positions.iter().any(|&(_, end)| end == text.chars().count()) {
        out.push(']');
    }
    out
}
