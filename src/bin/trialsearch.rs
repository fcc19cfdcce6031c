//! Trialsearch server binary.
//!
//! Loads a JSON corpus into the in-memory backend and serves the search
//! API. Production deployments point the service at external store/engine
//! implementations instead; the ingestion pipeline that populates them is
//! a separate process.

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;

use trialsearch::backend::memory::MemoryBackend;
use trialsearch::search::SearchService;
use trialsearch::server::{AppState, router};

#[derive(Parser, Debug)]
#[command(name = "trialsearch", version, about = "Clinical-trial search service")]
struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1:5000", env = "TRIALSEARCH_ADDR")]
    addr: SocketAddr,

    /// Path to a JSON file holding an array of trial records
    #[arg(long, env = "TRIALSEARCH_DATA")]
    data: Option<PathBuf>,

    /// Number of results per page
    #[arg(long, default_value_t = 25)]
    page_size: usize,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let records = match &args.data {
        Some(path) => load_records(path)?,
        None => Vec::new(),
    };
    tracing::info!(records = records.len(), "corpus loaded");

    let backend = Arc::new(MemoryBackend::new(records));
    let service = SearchService::with_page_size(backend.clone(), backend, args.page_size)?;
    let app = router(AppState {
        service: Arc::new(service),
    });

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn load_records(path: &PathBuf) -> anyhow::Result<Vec<Value>> {
    let file = File::open(path)?;
    let records: Vec<Value> = serde_json::from_reader(BufReader::new(file))?;
    Ok(records)
}
