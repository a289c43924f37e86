//! Primary profile attempts and candidate selection.

use std::path::{Path, PathBuf};

use ocrsweep::models::{Analysis, Attempt, PageStatus, Profile};

use super::{PageContext, PipelineError, PipelineEvent};
use crate::scoring::analyze_pdf;
use crate::tools::OcrRequest;

/// An OCR output file and how it scored.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub path: PathBuf,
    pub profile: String,
    pub analysis: Analysis,
    pub selection_score: u64,
}

impl Candidate {
    /// Replace `self` with `challenger` when it scores strictly higher.
    pub fn keep_better(&mut self, challenger: Candidate) -> bool {
        if challenger.selection_score > self.selection_score {
            *self = challenger;
            true
        } else {
            false
        }
    }
}

/// `ocr_page_00003_try_2.pdf`, `ocr_page_00003_rescue.pdf`, ...
pub(crate) fn candidate_path(work_dir: &Path, page: u32, suffix: &str) -> PathBuf {
    work_dir.join(format!("ocr_page_{:05}_{}.pdf", page, suffix))
}

/// Run one profile over the page and score its text layer.
pub(crate) fn run_attempt(
    ctx: &PageContext,
    page_input: &Path,
    candidate: &Path,
    profile: &Profile,
    attempt: u32,
) -> Result<(Candidate, Attempt), PipelineError> {
    let request = OcrRequest::new(&ctx.settings, profile);
    ctx.tools.ocr.run_ocr(page_input, candidate, &request)?;
    let analysis = analyze_pdf(ctx.tools.extractor.as_ref(), candidate)?;

    let mode = ctx.settings.mode();
    let record = Attempt::new(attempt, &profile.name, &analysis, mode);
    tracing::debug!(
        "Attempt {} ({}) scored {} / selection {}",
        attempt,
        profile.name,
        record.score,
        record.selection_score
    );
    let scored = Candidate {
        path: candidate.to_path_buf(),
        profile: profile.name.clone(),
        selection_score: analysis.selection_score(mode),
        analysis,
    };
    Ok((scored, record))
}

/// Run the primary profile set in order; the first attempt seeds the best
/// candidate and later ones replace it only with a strictly higher
/// selection score.
pub(crate) fn run_primary_attempts(
    ctx: &PageContext,
    page: u32,
    page_input: &Path,
) -> Result<(Candidate, Vec<Attempt>), PipelineError> {
    let profiles = ctx.settings.primary_profiles();
    let planned = profiles.len() as u32;
    let mut attempts = Vec::with_capacity(profiles.len());
    let mut best: Option<Candidate> = None;

    for (idx, profile) in profiles.iter().enumerate() {
        let attempt = idx as u32 + 1;
        ctx.store.set_page_status(
            ctx.job,
            page,
            PageStatus::Running,
            &format!("OCR attempt {}/{}", attempt, planned),
        );
        ctx.store.update_page(ctx.job, page, |d| {
            d.attempts_done = attempt;
            d.current_profile = Some(profile.name.clone());
        });
        ctx.events.emit(PipelineEvent::AttemptStarted {
            page,
            attempt,
            planned,
            profile: profile.name.clone(),
        });

        let path = candidate_path(&ctx.work_dir, page, &format!("try_{}", attempt));
        let (scored, record) = run_attempt(ctx, page_input, &path, profile, attempt)?;
        attempts.push(record.clone());

        match best.as_mut() {
            Some(current) => {
                current.keep_better(scored);
            }
            None => best = Some(scored),
        }

        if let Some(current) = &best {
            let history = attempts.clone();
            ctx.store.update_page(ctx.job, page, |d| {
                d.attempts = history;
                d.best_score = current.analysis.score();
                d.best_selection_score = current.selection_score;
                d.best_profile = Some(current.profile.clone());
            });
        }
        ctx.events.emit(PipelineEvent::AttemptFinished {
            page,
            attempt: record,
        });
    }

    let best = best.ok_or(PipelineError::NoCandidate { page })?;
    tracing::info!(
        "Page {}: best primary profile {} (score {})",
        page,
        best.profile,
        best.analysis.score()
    );
    Ok((best, attempts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, selection_score: u64) -> Candidate {
        Candidate {
            path: PathBuf::from(format!("{}.pdf", name)),
            profile: name.to_string(),
            analysis: Analysis::default(),
            selection_score,
        }
    }

    #[test]
    fn test_keep_better_requires_strictly_higher() {
        let mut best = candidate("a", 100);
        assert!(!best.keep_better(candidate("b", 100)));
        assert_eq!(best.profile, "a");
        assert!(best.keep_better(candidate("c", 101)));
        assert_eq!(best.profile, "c");
        assert!(!best.keep_better(candidate("d", 5)));
        assert_eq!(best.profile, "c");
    }

    #[test]
    fn test_candidate_path() {
        let dir = Path::new("/tmp/work");
        assert_eq!(
            candidate_path(dir, 3, "try_2"),
            PathBuf::from("/tmp/work/ocr_page_00003_try_2.pdf")
        );
        assert_eq!(
            candidate_path(dir, 12, "rescue2"),
            PathBuf::from("/tmp/work/ocr_page_00012_rescue2.pdf")
        );
    }
}
