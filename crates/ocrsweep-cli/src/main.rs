//! ocrsweep - adaptive multi-pass OCR for scanned documents and drawings.
//!
//! Turns scanned PDFs into searchable PDFs, verifying OCR coverage page by
//! page and adding invisible text where the OCR engine missed it.

mod cli;

use std::process::ExitCode;

use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let default_filter = if cli::is_verbose() {
        "ocrsweep=debug,ocrsweep_analysis=info,ocrsweep_cli=debug"
    } else {
        "ocrsweep=warn,ocrsweep_analysis=warn,ocrsweep_cli=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("✗").red(), e);
            ExitCode::from(cli::exit_code(&e))
        }
    }
}
