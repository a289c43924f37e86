//! Verification phase of one page: coverage scan, rescue escalation,
//! review image and overlay injection.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use ocrsweep::models::{Attempt, Coverage, JobId, OcrMode, PageStatus, Profile};
use ocrsweep::store::JobStore;

use super::attempts::{candidate_path, run_attempt, Candidate};
use super::{PageContext, PipelineError, PipelineEvent};
use crate::coverage::CoverageScanner;
use crate::overlay::{inject_box_overlay, inject_line_overlay, scan_rescue_lines, write_review_image};
use crate::rescue::{PageSignals, RescuePolicy};

const DRAWING_DPI: u32 = 320;
const STANDARD_DPI: u32 = 260;
/// Plain-text rescue scan resolution on drawings.
const RESCUE_TEXT_DPI: u32 = 420;

/// Final result of a verified page.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub page: u32,
    /// `ocr_page_NNNNN.pdf` in the job's work directory.
    pub output: PathBuf,
    pub best: Candidate,
    pub attempts: Vec<Attempt>,
    pub coverage: Coverage,
    pub augmented_words: usize,
    pub fallback_lines: usize,
    pub needs_review: bool,
    pub review_image: Option<PathBuf>,
}

impl PageOutcome {
    pub fn message(&self) -> &'static str {
        if self.needs_review {
            "manual review recommended"
        } else {
            "ok"
        }
    }

    /// Write the outcome to the page record and mark the page done.
    pub fn record(&self, store: &JobStore, job: JobId) {
        store.update_page(job, self.page, |d| {
            let done = self.attempts.len() as u32;
            d.attempts_done = done;
            d.attempts_planned = done;
            d.current_profile = None;
            d.best_profile = Some(self.best.profile.clone());
            d.best_score = self.best.analysis.score();
            d.best_selection_score = self.best.selection_score;
            d.attempts = self.attempts.clone();
            d.record_coverage(&self.coverage);
            d.augmented_words = self.augmented_words;
            d.fallback_lines = self.fallback_lines;
            d.needs_review = self.needs_review;
            d.review_image = self.review_image.clone();
        });
        store.set_page_status(job, self.page, PageStatus::Done, self.message());
        store.mark_page_completed(job, self.page);
    }
}

fn render_dpi(mode: OcrMode) -> u32 {
    match mode {
        OcrMode::Drawing => DRAWING_DPI,
        OcrMode::Standard => STANDARD_DPI,
    }
}

fn ensure_not_cancelled(ctx: &PageContext) -> Result<(), PipelineError> {
    if ctx.cancelled.load(Ordering::SeqCst) {
        return Err(PipelineError::Cancelled);
    }
    Ok(())
}

/// Run one rescue profile and keep it if it beats the current best.
#[allow(clippy::too_many_arguments)]
fn run_rescue(
    ctx: &PageContext,
    page: u32,
    page_input: &Path,
    profile: &Profile,
    suffix: &str,
    reason: &'static str,
    best: &mut Candidate,
    attempts: &mut Vec<Attempt>,
) -> Result<(), PipelineError> {
    ensure_not_cancelled(ctx)?;
    tracing::info!("Page {}: rescue pass {} ({})", page, profile.name, reason);
    ctx.store.update_page(ctx.job, page, |d| {
        d.current_profile = Some(profile.name.clone());
        d.message = format!("rescue pass: {}", reason);
    });
    ctx.events.emit(PipelineEvent::RescueStarted {
        page,
        profile: profile.name.clone(),
        reason,
    });

    let path = candidate_path(&ctx.work_dir, page, suffix);
    let attempt = attempts.len() as u32 + 1;
    let (scored, record) = run_attempt(ctx, page_input, &path, profile, attempt)?;
    attempts.push(record.clone());
    if best.keep_better(scored) {
        tracing::info!("Page {}: {} replaced the best candidate", page, profile.name);
    }
    ctx.events.emit(PipelineEvent::AttemptFinished {
        page,
        attempt: record,
    });
    Ok(())
}

/// Verify a page whose primary attempts are done. Tool failures abort the
/// page; the plain-text rescue scan, review image and injections degrade
/// to empty results.
pub(crate) fn verify_page(
    ctx: &PageContext,
    page: u32,
    page_input: &Path,
    mut best: Candidate,
    mut attempts: Vec<Attempt>,
) -> Result<PageOutcome, PipelineError> {
    let settings = &ctx.settings;
    let mode = settings.mode();
    let drawing = mode.is_drawing();
    let policy = RescuePolicy::new(mode, settings.deep_verify);

    let scan_dir = tempfile::Builder::new().prefix("ocrsweep_scan_").tempdir()?;
    let render = scan_dir.path().join(format!("page_{:05}.png", page));
    ctx.tools
        .renderer
        .render_page(page_input, &render, render_dpi(mode))?;

    let mut coverage = Coverage::default();
    let mut rescue_lines = Vec::new();

    if settings.deep_verify {
        ensure_not_cancelled(ctx)?;
        let scanner = CoverageScanner::new(ctx.tools.detector.as_ref(), &settings.language, &ctx.vocabulary);
        coverage = scanner.scan(&render, mode)?;
        tracing::debug!(
            "Page {}: coverage full={} tile={} combined={} vertical={} table={}",
            page,
            coverage.full_words,
            coverage.tile_words,
            coverage.combined_words,
            coverage.vertical_words,
            coverage.table_words
        );
        ctx.store
            .update_page(ctx.job, page, |d| d.record_coverage(&coverage));

        if drawing {
            rescue_lines = rescue_text_lines(ctx, page, page_input, scan_dir.path());
        }

        let signals = PageSignals::new(&best.analysis, &coverage);
        if let Some(reason) = policy.primary_rescue(&signals) {
            let profile = Profile::rescue(mode);
            run_rescue(ctx, page, page_input, &profile, "rescue", reason, &mut best, &mut attempts)?;
        }
    }

    let signals = PageSignals::new(&best.analysis, &coverage);
    if let Some(reason) = policy.secondary_rescue(&signals) {
        let profile = Profile::secondary_rescue(mode);
        run_rescue(ctx, page, page_input, &profile, "rescue2", reason, &mut best, &mut attempts)?;
    }

    let review_image = match write_review_image(&render, &coverage.boxes, &ctx.output, page) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("Page {}: review image not written: {}", page, e);
            None
        }
    };

    let output = ctx.work_dir.join(format!("ocr_page_{:05}.pdf", page));
    fs::copy(&best.path, &output)?;

    let mut augmented_words = 0;
    let mut fallback_lines = 0;
    if settings.deep_verify && drawing {
        if !coverage.boxes.is_empty() {
            augmented_words = inject_box_overlay(&output, &render, &coverage.boxes, &ctx.vocabulary)
                .unwrap_or_else(|e| {
                    tracing::warn!("Page {}: word overlay skipped: {}", page, e);
                    0
                });
        }
        if !rescue_lines.is_empty() {
            fallback_lines = inject_line_overlay(&output, &rescue_lines).unwrap_or_else(|e| {
                tracing::warn!("Page {}: line overlay skipped: {}", page, e);
                0
            });
        }
    }

    let signals = PageSignals::new(&best.analysis, &coverage).with_injected(augmented_words, fallback_lines);
    let mut needs_review = policy.needs_review(&signals).is_some();
    if needs_review {
        if let Some(reason) = policy.review_cleared(&signals) {
            tracing::debug!("Page {}: review cleared ({})", page, reason);
            needs_review = false;
        }
    }

    Ok(PageOutcome {
        page,
        output,
        best,
        attempts,
        coverage,
        augmented_words,
        fallback_lines,
        needs_review,
        review_image,
    })
}

/// High-resolution plain-text scan; failures leave the page without lines.
fn rescue_text_lines(ctx: &PageContext, page: u32, page_input: &Path, scan_dir: &Path) -> Vec<String> {
    let image = scan_dir.join(format!("page_{:05}_rescue.png", page));
    let scanned = ctx
        .tools
        .renderer
        .render_page(page_input, &image, RESCUE_TEXT_DPI)
        .and_then(|()| {
            scan_rescue_lines(
                ctx.tools.detector.as_ref(),
                &image,
                &ctx.settings.language,
                &ctx.vocabulary,
            )
        });
    match scanned {
        Ok(lines) => lines,
        Err(e) => {
            tracing::warn!("Page {}: plain-text rescue skipped: {}", page, e);
            Vec::new()
        }
    }
}
