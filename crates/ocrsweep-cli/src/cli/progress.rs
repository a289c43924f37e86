//! Terminal progress for conversion jobs.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use ocrsweep_analysis::PipelineEvent;

fn page_bar(len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );
    progress
}

/// Spinner for single long-running steps.
pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb.set_message(message);
    pb
}

/// Spawn a task that drives a page progress bar from pipeline events.
///
/// With `show == false` events are drained silently. Returns a `JoinHandle`
/// the caller should `.await` after the job completes.
pub fn spawn_progress_handler(
    mut event_rx: mpsc::Receiver<PipelineEvent>,
    show: bool,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut bar: Option<ProgressBar> = None;

        while let Some(event) = event_rx.recv().await {
            if !show {
                continue;
            }
            match event {
                PipelineEvent::JobStarted {
                    total_pages,
                    selected_pages,
                } => {
                    if selected_pages < total_pages {
                        println!(
                            "  {} OCR on {} of {} pages",
                            style("→").dim(),
                            selected_pages,
                            total_pages
                        );
                    }
                    let progress = page_bar(total_pages as u64);
                    progress.set_message("starting...");
                    bar = Some(progress);
                }
                PipelineEvent::AttemptStarted {
                    page,
                    attempt,
                    planned,
                    profile,
                } => {
                    if let Some(ref progress) = bar {
                        progress.set_message(format!(
                            "page {}: {} ({}/{})",
                            page, profile, attempt, planned
                        ));
                    }
                }
                PipelineEvent::VerifyStarted { page } => {
                    if let Some(ref progress) = bar {
                        progress.set_message(format!("page {}: coverage check", page));
                    }
                }
                PipelineEvent::RescueStarted {
                    page,
                    profile,
                    reason,
                } => {
                    if let Some(ref progress) = bar {
                        progress.println(format!(
                            "  {} Page {}: rescue with {} ({})",
                            style("↻").yellow(),
                            page,
                            profile,
                            reason
                        ));
                    }
                }
                PipelineEvent::PageFinished {
                    page,
                    best_score,
                    needs_review,
                } => {
                    if let Some(ref progress) = bar {
                        if needs_review {
                            progress.println(format!(
                                "  {} Page {} needs review (score {})",
                                style("!").yellow(),
                                page,
                                best_score
                            ));
                        }
                        progress.inc(1);
                    }
                }
                PipelineEvent::PageSkipped { .. } => {
                    if let Some(ref progress) = bar {
                        progress.inc(1);
                    }
                }
                PipelineEvent::PageFailed { page, error } => {
                    if let Some(ref progress) = bar {
                        progress.println(format!(
                            "{} Page {} failed: {}",
                            style("✗").red(),
                            page,
                            error
                        ));
                    }
                }
                PipelineEvent::Merging { pages } => {
                    if let Some(ref progress) = bar {
                        progress.set_message(format!("merging {} pages", pages));
                    }
                }
                PipelineEvent::JobFinished { .. } | PipelineEvent::JobFailed { .. } => {
                    if let Some(progress) = bar.take() {
                        progress.finish_and_clear();
                    }
                }
                PipelineEvent::AttemptFinished { .. } => {}
            }
        }

        if let Some(progress) = bar.take() {
            progress.finish_and_clear();
        }
    })
}
