use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::ingest::{build_handle_with, load_documents};
use engine::{Bm25Params, IndexHandle, Model, SearchResult, TokenStream, TokenizerKind};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, EnvFilter};

const PREVIEW_CHARS: usize = 500;

#[derive(Parser)]
#[command(name = "irsearch")]
#[command(about = "Rank a small corpus with TF-IDF and BM25", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Tfidf,
    Bm25,
    Both,
}

impl ModelArg {
    fn models(self) -> Vec<Model> {
        match self {
            ModelArg::Tfidf => vec![Model::TfIdf],
            ModelArg::Bm25 => vec![Model::Bm25],
            ModelArg::Both => Model::ALL.to_vec(),
        }
    }
}

#[derive(Args, Clone, Copy)]
struct Bm25Args {
    /// BM25 term-frequency saturation
    #[arg(long, default_value_t = 1.5)]
    k1: f64,
    /// BM25 length normalization, in [0, 1]
    #[arg(long, default_value_t = 0.75)]
    b: f64,
}

impl From<Bm25Args> for Bm25Params {
    fn from(args: Bm25Args) -> Self {
        Bm25Params { k1: args.k1, b: args.b }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one query against the corpus
    Search {
        /// Corpus file or directory (.json, .jsonl, .txt)
        #[arg(long)]
        corpus: String,
        /// Free-text query
        #[arg(long)]
        query: String,
        /// Number of results per model
        #[arg(long, default_value_t = 3)]
        k: usize,
        #[arg(long, value_enum, default_value_t = ModelArg::Both)]
        model: ModelArg,
        /// english | whitespace
        #[arg(long, default_value = "english")]
        tokenizer: TokenizerKind,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        #[command(flatten)]
        bm25: Bm25Args,
    },
    /// Print corpus statistics
    Stats {
        #[arg(long)]
        corpus: String,
        #[arg(long, default_value = "english")]
        tokenizer: TokenizerKind,
        #[command(flatten)]
        bm25: Bm25Args,
    },
    /// Build once, then answer queries read from stdin
    Repl {
        #[arg(long)]
        corpus: String,
        #[arg(long, default_value_t = 3)]
        k: usize,
        #[arg(long, default_value = "english")]
        tokenizer: TokenizerKind,
        #[command(flatten)]
        bm25: Bm25Args,
    },
}

#[derive(Serialize)]
struct ModelResults<'a> {
    model: Model,
    results: &'a [SearchResult],
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { corpus, query, k, model, tokenizer, json, bm25 } => {
            let provider = tokenizer.provider();
            let handle = load(&corpus, provider.as_ref(), bm25.into())?;
            let q_tokens = provider.tokenize(&query);
            let mut out = io::stdout().lock();
            let mut all = Vec::new();
            for m in model.models() {
                all.push((m, handle.search(m, &q_tokens, k)?));
            }
            if json {
                let body: Vec<ModelResults> =
                    all.iter().map(|(m, r)| ModelResults { model: *m, results: r }).collect();
                serde_json::to_writer_pretty(&mut out, &body)?;
                writeln!(out)?;
            } else {
                for (m, results) in &all {
                    render(&mut out, *m, results)?;
                }
            }
            Ok(())
        }
        Commands::Stats { corpus, tokenizer, bm25 } => {
            let provider = tokenizer.provider();
            let handle = load(&corpus, provider.as_ref(), bm25.into())?;
            let c = handle.corpus();
            let params = handle.bm25().params();
            println!("documents: {}", c.len());
            println!("vocabulary: {}", c.vocabulary().len());
            println!("avg document length: {:.2}", handle.bm25().avg_doc_len()?);
            println!("bm25: k1={} b={}", params.k1, params.b);
            Ok(())
        }
        Commands::Repl { corpus, k, tokenizer, bm25 } => {
            let provider = tokenizer.provider();
            let handle = load(&corpus, provider.as_ref(), bm25.into())?;
            repl(&handle, provider.as_ref(), k)
        }
    }
}

fn load(corpus: &str, tokenizer: &dyn TokenStream, bm25: Bm25Params) -> Result<IndexHandle> {
    let docs = load_documents(corpus)?;
    let handle = build_handle_with(docs, tokenizer, bm25)?;
    tracing::info!(
        corpus,
        num_docs = handle.corpus().len(),
        num_terms = handle.corpus().vocabulary().len(),
        "indices built"
    );
    Ok(handle)
}

fn repl(handle: &IndexHandle, tokenizer: &dyn TokenStream, k: usize) -> Result<()> {
    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    write!(out, "> ")?;
    out.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let query = line.trim();
        if query == ":quit" {
            break;
        }
        if !query.is_empty() {
            let q_tokens = tokenizer.tokenize(query);
            for m in Model::ALL {
                match handle.search(m, &q_tokens, k) {
                    Ok(results) => render(&mut out, m, &results)?,
                    Err(e) => writeln!(out, "{m}: {e}")?,
                }
            }
        }
        write!(out, "> ")?;
        out.flush()?;
    }
    Ok(())
}

fn render<W: Write>(out: &mut W, model: Model, results: &[SearchResult]) -> io::Result<()> {
    writeln!(out, "== {model} ==")?;
    if results.is_empty() {
        writeln!(out, "no results")?;
        return Ok(());
    }
    for (rank, r) in results.iter().enumerate() {
        writeln!(out, "#{}. {} - score {:.4}", rank + 1, r.doc_id, r.score)?;
        writeln!(out, "{}", r.preview(PREVIEW_CHARS))?;
        writeln!(out)?;
    }
    Ok(())
}
