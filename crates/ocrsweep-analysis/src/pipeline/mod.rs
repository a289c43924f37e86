//! Page pipeline and job orchestration.
//!
//! A job splits the input into single pages and, page by page, runs the
//! primary OCR attempts in order. Each page then moves on to a
//! verification worker (coverage scan, rescue passes, overlay injection)
//! while the next page's attempts start. Verification runs on a
//! single-permit pool, so pages finish out of submission order but never
//! verify concurrently. The finished pages are merged back in page order.

mod attempts;
mod verify;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use futures::stream::FuturesUnordered;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use ocrsweep::config::{validate_input, ConfigError, ConversionSettings, ToolPaths, Vocabulary};
use ocrsweep::models::{Attempt, JobId, PageStatus};
use ocrsweep::pdf::{merge_pages, split_pages, PdfError};
use ocrsweep::store::JobStore;

use crate::coverage::ScanError;
use crate::tools::{
    missing_tools, OcrEngine, OcrMyPdf, PageRenderer, Pdftoppm, Pdftotext, TesseractCli,
    TextExtractor, ToolError, WordDetector,
};

pub use attempts::Candidate;
pub use verify::PageOutcome;

/// Verification phases allowed to run at once per job.
const VERIFY_WORKERS: usize = 1;

/// Errors that abort a conversion job.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required tools missing: {0}")]
    MissingTools(String),

    #[error("Unknown job: {0}")]
    UnknownJob(JobId),

    #[error("No OCR result produced for page {page}")]
    NoCandidate { page: u32 },

    #[error("Page {page} failed: {source}")]
    PageFailed {
        page: u32,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Verification skipped after an earlier page failed")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// Configuration and input problems, as opposed to processing failures.
    pub fn is_config(&self) -> bool {
        match self {
            Self::Config(_) | Self::MissingTools(_) => true,
            Self::Tool(ToolError::NotFound { .. }) => true,
            Self::Pdf(PdfError::NoPages) => true,
            Self::PageFailed { source, .. } => source.is_config(),
            _ => false,
        }
    }
}

/// Progress notifications emitted while a job runs.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    JobStarted {
        total_pages: u32,
        selected_pages: u32,
    },
    AttemptStarted {
        page: u32,
        attempt: u32,
        planned: u32,
        profile: String,
    },
    AttemptFinished {
        page: u32,
        attempt: Attempt,
    },
    VerifyStarted {
        page: u32,
    },
    RescueStarted {
        page: u32,
        profile: String,
        reason: &'static str,
    },
    PageFinished {
        page: u32,
        best_score: u64,
        needs_review: bool,
    },
    PageSkipped {
        page: u32,
    },
    PageFailed {
        page: u32,
        error: String,
    },
    Merging {
        pages: usize,
    },
    JobFinished {
        output: PathBuf,
    },
    JobFailed {
        error: String,
    },
}

/// Non-blocking event sender; progress is advisory, so a full or closed
/// channel drops the event.
#[derive(Clone)]
pub(crate) struct EventSink(mpsc::Sender<PipelineEvent>);

impl EventSink {
    pub(crate) fn emit(&self, event: PipelineEvent) {
        if let Err(e) = self.0.try_send(event) {
            tracing::trace!("Dropped pipeline event: {}", e);
        }
    }
}

/// The external tools a job runs against.
#[derive(Clone)]
pub struct Toolchain {
    pub ocr: Arc<dyn OcrEngine>,
    pub renderer: Arc<dyn PageRenderer>,
    pub detector: Arc<dyn WordDetector>,
    pub extractor: Arc<dyn TextExtractor>,
}

impl Toolchain {
    /// Command-line tools resolved from `paths`.
    pub fn system(paths: &ToolPaths) -> Self {
        let paths = paths.expanded();
        Self {
            ocr: Arc::new(OcrMyPdf::new(paths.ocrmypdf)),
            renderer: Arc::new(Pdftoppm::new(paths.pdftoppm)),
            detector: Arc::new(TesseractCli::new(paths.tesseract)),
            extractor: Arc::new(Pdftotext::new(paths.pdftotext)),
        }
    }
}

/// Fail when any required executable is missing from `PATH`.
pub fn preflight(paths: &ToolPaths) -> Result<(), PipelineError> {
    let missing = missing_tools(paths);
    if missing.is_empty() {
        return Ok(());
    }
    let names: Vec<String> = missing
        .iter()
        .map(|t| format!("{} (install {})", t.program, t.hint))
        .collect();
    Err(PipelineError::MissingTools(names.join(", ")))
}

/// Everything a page worker needs, cheap to clone into blocking tasks.
#[derive(Clone)]
pub(crate) struct PageContext {
    pub tools: Toolchain,
    pub store: JobStore,
    pub job: JobId,
    pub settings: Arc<ConversionSettings>,
    pub vocabulary: Arc<Vocabulary>,
    pub work_dir: PathBuf,
    pub output: PathBuf,
    pub events: EventSink,
    /// Set once a page fails; queued verifications skip their work.
    pub cancelled: Arc<AtomicBool>,
}

type VerifyTask = JoinHandle<(u32, Result<PathBuf, PipelineError>)>;

/// Runs conversion jobs and records their progress in a [`JobStore`].
pub struct ConversionService {
    tools: Toolchain,
    store: JobStore,
    vocabulary: Arc<Vocabulary>,
}

impl ConversionService {
    pub fn new(tools: Toolchain, store: JobStore, vocabulary: Vocabulary) -> Self {
        Self {
            tools,
            store,
            vocabulary: Arc::new(vocabulary),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Register a job writing to `output`; run it with [`Self::run`].
    pub fn create_job(&self, output: &Path) -> JobId {
        self.store.create(output.to_path_buf())
    }

    /// Create and run a job in one step.
    pub async fn convert(
        &self,
        input: &Path,
        output: &Path,
        settings: ConversionSettings,
        events: mpsc::Sender<PipelineEvent>,
    ) -> Result<JobId, PipelineError> {
        let job = self.create_job(output);
        self.run(job, input, settings, events).await?;
        Ok(job)
    }

    /// Run a created job to completion. On failure the job is marked
    /// `error` with the failure message before the error is returned.
    pub async fn run(
        &self,
        job: JobId,
        input: &Path,
        settings: ConversionSettings,
        events: mpsc::Sender<PipelineEvent>,
    ) -> Result<(), PipelineError> {
        let events = EventSink(events);
        match self.run_job(job, input, settings, &events).await {
            Ok(output) => {
                tracing::info!("Job {} finished: {}", job, output.display());
                events.emit(PipelineEvent::JobFinished { output });
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Job {} failed: {}", job, e);
                self.store.fail(job, e.to_string());
                events.emit(PipelineEvent::JobFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_job(
        &self,
        job: JobId,
        input: &Path,
        settings: ConversionSettings,
        events: &EventSink,
    ) -> Result<PathBuf, PipelineError> {
        let output = self
            .store
            .snapshot(job)
            .map(|j| j.output)
            .ok_or(PipelineError::UnknownJob(job))?;
        self.store.start(job);

        validate_input(input)?;
        let settings = Arc::new(settings.validate()?);

        let work = tempfile::Builder::new().prefix("ocrsweep_pages_").tempdir()?;
        let work_dir = work.path().to_path_buf();

        let page_inputs = {
            let input = input.to_path_buf();
            let dir = work_dir.clone();
            tokio::task::spawn_blocking(move || split_pages(&input, &dir)).await??
        };
        let total = page_inputs.len() as u32;
        if let Some(selection) = &settings.pages {
            selection.check_against(total)?;
        }
        let selected = (1..=total).filter(|p| settings.selects_page(*p)).count() as u32;

        self.store.init_pages(job, total, settings.planned_attempts());
        tracing::info!(
            "Job {}: {} pages ({} selected), mode {}",
            job,
            total,
            selected,
            settings.mode().as_str()
        );
        events.emit(PipelineEvent::JobStarted {
            total_pages: total,
            selected_pages: selected,
        });

        let ctx = PageContext {
            tools: self.tools.clone(),
            store: self.store.clone(),
            job,
            settings: settings.clone(),
            vocabulary: self.vocabulary.clone(),
            work_dir,
            output: output.clone(),
            events: events.clone(),
            cancelled: Arc::new(AtomicBool::new(false)),
        };

        let mut verifying: FuturesUnordered<VerifyTask> = FuturesUnordered::new();
        let processed = self
            .process_pages(&ctx, &page_inputs, &mut verifying, events)
            .await;
        if processed.is_err() {
            // Blocking verification threads still use the work dir.
            stop_verification(&ctx, &mut verifying).await;
        }
        let ordered = processed?;

        events.emit(PipelineEvent::Merging {
            pages: ordered.len(),
        });
        {
            let output = output.clone();
            tokio::task::spawn_blocking(move || merge_pages(&ordered, &output)).await??;
        }

        if !self.store.finish(job) {
            tracing::warn!("Job {} merged but not every page reported done", job);
        }
        drop(work);
        Ok(output)
    }

    /// Run every page and collect the per-page outputs in page order.
    async fn process_pages(
        &self,
        ctx: &PageContext,
        page_inputs: &[PathBuf],
        verifying: &mut FuturesUnordered<VerifyTask>,
        events: &EventSink,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        let job = ctx.job;
        let settings = &ctx.settings;
        let mut outputs: Vec<Option<PathBuf>> = vec![None; page_inputs.len()];
        let semaphore = Arc::new(Semaphore::new(VERIFY_WORKERS));

        for (idx, page_input) in page_inputs.iter().enumerate() {
            let page = idx as u32 + 1;

            if !settings.selects_page(page) {
                self.pass_through(job, page);
                events.emit(PipelineEvent::PageSkipped { page });
                outputs[idx] = Some(page_input.clone());
                continue;
            }

            let primary = {
                let ctx = ctx.clone();
                let page_input = page_input.clone();
                tokio::task::spawn_blocking(move || attempts::run_primary_attempts(&ctx, page, &page_input))
                    .await
                    .map_err(PipelineError::from)
                    .and_then(|r| r)
            };
            let (best, attempts) = match primary {
                Ok(v) => v,
                Err(e) => return Err(self.page_failed(events, job, page, e)),
            };

            self.store
                .set_page_status(job, page, PageStatus::Verifying, "coverage check");
            self.store.update_page(job, page, |d| {
                d.attempts_done = attempts.len() as u32;
                d.current_profile = Some("verify".to_string());
            });
            verifying.push(spawn_verify(
                ctx.clone(),
                semaphore.clone(),
                page,
                page_input.clone(),
                best,
                attempts,
            ));

            // Surface verification failures before starting the next page.
            while let Some(Some(joined)) = verifying.next().now_or_never() {
                self.settle(events, job, joined, &mut outputs)?;
            }
        }

        while let Some(joined) = verifying.next().await {
            self.settle(events, job, joined, &mut outputs)?;
        }

        outputs
            .into_iter()
            .enumerate()
            .map(|(idx, path)| path.ok_or(PipelineError::NoCandidate { page: idx as u32 + 1 }))
            .collect()
    }

    fn pass_through(&self, job: JobId, page: u32) {
        self.store.update_page(job, page, |d| {
            d.attempts_planned = 0;
            d.current_profile = None;
        });
        self.store
            .set_page_status(job, page, PageStatus::Done, "outside page range");
        self.store.mark_page_completed(job, page);
    }

    fn settle(
        &self,
        events: &EventSink,
        job: JobId,
        joined: Result<(u32, Result<PathBuf, PipelineError>), tokio::task::JoinError>,
        outputs: &mut [Option<PathBuf>],
    ) -> Result<(), PipelineError> {
        let (page, result) = joined?;
        match result {
            Ok(path) => {
                if let Some(slot) = page.checked_sub(1).and_then(|i| outputs.get_mut(i as usize)) {
                    *slot = Some(path);
                }
                Ok(())
            }
            Err(e) => Err(self.page_failed(events, job, page, e)),
        }
    }

    fn page_failed(
        &self,
        events: &EventSink,
        job: JobId,
        page: u32,
        error: PipelineError,
    ) -> PipelineError {
        let message = error.to_string();
        tracing::warn!("Page {} failed: {}", page, message);
        self.store
            .set_page_status(job, page, PageStatus::Error, &message);
        events.emit(PipelineEvent::PageFailed {
            page,
            error: message,
        });
        PipelineError::PageFailed {
            page,
            source: Box::new(error),
        }
    }
}

/// Cancel queued verifications and wait for running ones to return.
async fn stop_verification(ctx: &PageContext, verifying: &mut FuturesUnordered<VerifyTask>) {
    ctx.cancelled.store(true, Ordering::SeqCst);
    while let Some(joined) = verifying.next().await {
        match joined {
            Ok((page, Ok(_))) => tracing::debug!("Page {} verified after the job failed", page),
            Ok((_, Err(PipelineError::Cancelled))) => {}
            Ok((page, Err(e))) => tracing::debug!("Page {} verification failed: {}", page, e),
            Err(e) => tracing::warn!("Verification worker failed: {}", e),
        }
    }
}

/// Queue a page for verification; the task records the outcome itself so
/// snapshots update as soon as the page is done.
fn spawn_verify(
    ctx: PageContext,
    semaphore: Arc<Semaphore>,
    page: u32,
    page_input: PathBuf,
    best: Candidate,
    attempts: Vec<Attempt>,
) -> VerifyTask {
    tokio::spawn(async move {
        let _permit = semaphore.acquire_owned().await.ok();
        if ctx.cancelled.load(Ordering::SeqCst) {
            return (page, Err(PipelineError::Cancelled));
        }
        ctx.events.emit(PipelineEvent::VerifyStarted { page });

        let worker = ctx.clone();
        let result = tokio::task::spawn_blocking(move || {
            verify::verify_page(&worker, page, &page_input, best, attempts)
        })
        .await
        .map_err(PipelineError::from)
        .and_then(|r| r);

        let result = result.map(|outcome| {
            outcome.record(&ctx.store, ctx.job);
            ctx.events.emit(PipelineEvent::PageFinished {
                page,
                best_score: outcome.best.analysis.score(),
                needs_review: outcome.needs_review,
            });
            outcome.output
        });
        (page, result)
    })
}
