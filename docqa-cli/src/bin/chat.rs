//! Interactive question answering over the ingested collection.

use docqa_cli::{EditorInput, build_pipeline, ctrl_c, init_logging, run_console};
use docqa_rag::Settings;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging("warn");

    let settings = Settings::from_env()?;
    debug!(?settings, "loaded settings");

    let pipeline = build_pipeline(&settings).await?;
    let mut input = EditorInput::new()?;
    let mut stdout = std::io::stdout();

    let reason = run_console(&mut input, &pipeline, &mut stdout, ctrl_c()).await?;
    debug!(?reason, "chat finished");
    Ok(())
}
