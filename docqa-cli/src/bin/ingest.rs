//! Load a PDF, split it into chunks, embed them and store them in pgvector.
//!
//! ```text
//! docqa-ingest [PATH]        # PATH defaults to document.pdf
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use docqa_cli::{build_pipeline, init_logging};
use docqa_rag::{PdfLoader, RecursiveChunker, Settings};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "docqa-ingest", version, about = "Ingest a PDF into the pgvector collection")]
struct Cli {
    /// PDF file to ingest
    #[arg(default_value = "document.pdf")]
    path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging("info");

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let pages = PdfLoader
        .load(&cli.path)
        .with_context(|| format!("could not read {}", cli.path.display()))?;

    // Split before connecting so an empty PDF never touches the database.
    let chunks = RecursiveChunker::from_config(&settings.rag).split_documents(&pages);
    if chunks.is_empty() {
        info!(path = %cli.path.display(), pages = pages.len(), "no text found, nothing to ingest");
        return Ok(());
    }

    let pipeline = build_pipeline(&settings).await?;
    let report = pipeline.ingest_chunks(chunks).await?;

    info!(
        path = %cli.path.display(),
        collection = %settings.collection,
        chunks = report.chunk_count(),
        policy = %settings.on_conflict,
        "ingestion complete"
    );
    Ok(())
}
