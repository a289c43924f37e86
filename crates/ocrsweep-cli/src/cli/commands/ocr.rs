//! Single OCR pass with explicit engine options.

use std::time::Instant;

use console::style;

use ocrsweep::config::{default_output_path, validate_input, Config};
use ocrsweep::utils::format_duration;
use ocrsweep_analysis::tools::{OcrEngine, OcrMyPdf, OcrRequest};

use super::super::progress::spinner;
use super::OcrArgs;

/// Run one ocrmypdf pass over the whole document.
pub async fn cmd_ocr(config: &Config, args: OcrArgs) -> anyhow::Result<()> {
    validate_input(&args.input)?;
    let settings = config
        .conversion
        .clone()
        .merged(args.engine.overrides())
        .into_settings()?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut request = OcrRequest::new(&settings, &args.profile());
    request.force_ocr = !args.skip_text;

    let engine = OcrMyPdf::new(config.tools.expanded().ocrmypdf);
    let pb = spinner(format!("OCR {} ({})", args.input.display(), settings.language));
    let started = Instant::now();

    let input = args.input.clone();
    let target = output.clone();
    let result =
        tokio::task::spawn_blocking(move || engine.run_ocr(&input, &target, &request)).await?;
    pb.finish_and_clear();
    result?;

    println!(
        "{} Wrote {} in {}",
        style("✓").green(),
        output.display(),
        format_duration(started.elapsed())
    );
    Ok(())
}
