//! Full adaptive conversion.

use std::time::Instant;

use console::style;
use tokio::sync::mpsc;
use tracing::debug;

use ocrsweep::config::{default_output_path, validate_input, Config};
use ocrsweep::models::{JobSnapshot, PageStatus};
use ocrsweep::store::JobStore;
use ocrsweep::utils::format_duration;
use ocrsweep_analysis::{preflight, ConversionService, PipelineEvent, Toolchain};

use super::super::progress::spawn_progress_handler;
use super::ConvertArgs;

/// Convert a scanned PDF into a searchable one.
pub async fn cmd_convert(config: &Config, args: ConvertArgs) -> anyhow::Result<()> {
    validate_input(&args.input)?;
    let settings = config
        .conversion
        .clone()
        .merged(args.overrides()?)
        .into_settings()?;
    preflight(&config.tools)?;
    debug!("Resolved settings: {:?}", settings);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    let service = ConversionService::new(
        Toolchain::system(&config.tools),
        JobStore::new(),
        config.vocabulary.clone(),
    );
    let job = service.create_job(&output);
    debug!("Job {} writes {}", job, output.display());

    if !args.json {
        println!(
            "{} Converting {} ({} mode, {})",
            style("→").cyan(),
            args.input.display(),
            settings.mode(),
            settings.language
        );
    }

    let started = Instant::now();
    let (event_tx, event_rx) = mpsc::channel::<PipelineEvent>(256);
    let handler = spawn_progress_handler(event_rx, !args.json);

    let result = service.run(job, &args.input, settings, event_tx).await;
    let _ = handler.await;

    if let Some(snapshot) = service.store().snapshot(job) {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else if result.is_ok() {
            print_summary(&snapshot);
            println!(
                "{} Wrote {} in {}",
                style("✓").green(),
                snapshot.output.display(),
                format_duration(started.elapsed())
            );
        }
    }

    result?;
    Ok(())
}

fn print_summary(job: &JobSnapshot) {
    println!();
    println!(
        "{:<5} {:<8} {:<18} {:>6} {:>5} {:>5} {:>5} {:>5} {:>6} {:>6}  {}",
        "Page", "Status", "Profile", "Score", "Tries", "Full", "Tile", "Comb", "Words", "Lines",
        "Review"
    );
    println!("{}", "-".repeat(88));

    for page in &job.pages {
        if page.status == PageStatus::Done && page.attempts.is_empty() {
            println!(
                "{:<5} {:<8} {}",
                page.page,
                page.status.as_str(),
                style(&page.message).dim()
            );
            continue;
        }
        let review = if page.needs_review {
            style("yes").yellow().to_string()
        } else {
            style("ok").green().to_string()
        };
        println!(
            "{:<5} {:<8} {:<18} {:>6} {:>5} {:>5} {:>5} {:>5} {:>6} {:>6}  {}",
            page.page,
            page.status.as_str(),
            page.best_profile.as_deref().unwrap_or("-"),
            page.best_score,
            page.attempts.len(),
            page.scan_full_words,
            page.scan_tile_words,
            page.scan_combined_words,
            page.augmented_words,
            page.fallback_lines,
            review
        );
    }
    println!();

    let review = job.pages_needing_review();
    if !review.is_empty() {
        let pages: Vec<String> = review.iter().map(|p| p.to_string()).collect();
        println!(
            "{} Manual review recommended for page(s) {}",
            style("!").yellow(),
            pages.join(", ")
        );
    }

    let images: Vec<_> = job
        .pages
        .iter()
        .filter_map(|p| p.review_image.as_ref())
        .collect();
    if let Some(dir) = images.first().and_then(|p| p.parent()) {
        println!(
            "  {} {} review image(s) in {}",
            style("→").dim(),
            images.len(),
            dir.display()
        );
    }
}
