//! # docqa-cli
//!
//! Shared plumbing for the `docqa-ingest` and `docqa-chat` binaries:
//! logging setup, pipeline construction from [`Settings`](docqa_rag::Settings),
//! and the interactive question loop.

pub mod bootstrap;
pub mod console;
pub mod telemetry;

pub use bootstrap::{build_pipeline, connect_store};
pub use console::{
    Answerer, ConsoleInput, EditorInput, ExitReason, LineSource, ScriptedInput, ctrl_c,
    run_console,
};
pub use telemetry::init_logging;
