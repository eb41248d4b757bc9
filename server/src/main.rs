use anyhow::Result;
use axum::Router;
use clap::Parser;
use engine::{Bm25Params, IndexCache, TokenizerKind};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use server::{build_app, AppConfig};
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Corpus file or directory (.json, .jsonl, .txt)
    #[arg(long, default_value = "./sample_data/corpus.jsonl")]
    corpus: String,
    /// Token stream provider: english | whitespace
    #[arg(long, default_value = "english")]
    tokenizer: TokenizerKind,
    /// BM25 term-frequency saturation
    #[arg(long, default_value_t = 1.5)]
    k1: f64,
    /// BM25 length normalization, in [0, 1]
    #[arg(long, default_value_t = 0.75)]
    b: f64,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = AppConfig {
        corpus: args.corpus.clone(),
        tokenizer: args.tokenizer,
        bm25: Bm25Params { k1: args.k1, b: args.b },
    };
    let cache = IndexCache::new();
    let app: Router = build_app(&cache, &config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
