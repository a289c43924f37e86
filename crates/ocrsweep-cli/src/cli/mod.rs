//! Command-line interface for ocrsweep.

mod commands;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ocrsweep::config::{load_config, ConfigError, LoadOptions};
use ocrsweep_analysis::tools::ToolError;
use ocrsweep_analysis::PipelineError;

use commands::{ConvertArgs, OcrArgs};

#[derive(Parser)]
#[command(name = "ocrsweep")]
#[command(about = "Adaptive multi-pass OCR for scanned documents and drawings")]
#[command(version)]
pub struct Cli {
    /// Config file (default: ./ocrsweep.toml, then the user config dir)
    #[arg(short, long, global = true, env = "OCRSWEEP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a scanned PDF with the full adaptive pipeline
    Convert(ConvertArgs),

    /// Run a single OCR pass with explicit profile options
    Ocr(OcrArgs),

    /// Check that the external tools are installed
    Check,

    /// Show the OCR profiles a mode runs
    Profiles {
        /// Show the standard-mode profiles instead of the drawing ones
        #[arg(long)]
        standard: bool,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&LoadOptions {
        config_path: cli.config,
        ..Default::default()
    })?;

    match cli.command {
        Commands::Convert(args) => commands::convert::cmd_convert(&config, args).await,
        Commands::Ocr(args) => commands::ocr::cmd_ocr(&config, args).await,
        Commands::Check => commands::check::cmd_check(&config),
        Commands::Profiles { standard } => {
            commands::profiles::cmd_profiles(standard);
            Ok(())
        }
    }
}

/// 2 for configuration and missing-resource errors, 1 for everything else.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<PipelineError>() {
        return if e.is_config() { 2 } else { 1 };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return 2;
    }
    if let Some(ToolError::NotFound { .. }) = err.downcast_ref::<ToolError>() {
        return 2;
    }
    1
}

