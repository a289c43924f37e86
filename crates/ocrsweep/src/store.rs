//! In-memory job store.
//!
//! A keyed table of job records behind a single lock. Writers mutate a
//! record in place; readers take a cloned snapshot and release the lock
//! immediately, so status queries never wait on OCR work.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::models::{Job, JobId, JobSnapshot, JobStatus, PageDetail, PageStatus};

/// Cloneable handle to the shared job table.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<Mutex<HashMap<JobId, Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<JobId, Job>> {
        // A panicking writer leaves plain data behind; keep serving it.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_job<R>(&self, id: JobId, f: impl FnOnce(&mut Job) -> R) -> Option<R> {
        self.table().get_mut(&id).map(f)
    }

    /// Register a new job in `queued` state.
    pub fn create(&self, output: PathBuf) -> JobId {
        let job = Job::new(output);
        let id = job.id;
        self.table().insert(id, job);
        tracing::debug!("Created job {}", id);
        id
    }

    pub fn start(&self, id: JobId) {
        self.with_job(id, |job| {
            job.status = JobStatus::Running;
            job.error = None;
            job.total_pages = 0;
            job.completed_pages.clear();
        });
    }

    /// Create `pending` page records once the page count is known.
    pub fn init_pages(&self, id: JobId, total_pages: u32, attempts_planned: u32) {
        self.with_job(id, |job| {
            job.total_pages = total_pages;
            job.pages = (1..=total_pages)
                .map(|page| PageDetail::new(page, attempts_planned))
                .collect();
        });
    }

    /// Mutate one page record. Returns false if the job or page is unknown.
    pub fn update_page(&self, id: JobId, page: u32, f: impl FnOnce(&mut PageDetail)) -> bool {
        self.with_job(id, |job| job.page_mut(page).map(f).is_some())
            .unwrap_or(false)
    }

    /// Move a page to `status`, ignoring illegal transitions.
    pub fn set_page_status(&self, id: JobId, page: u32, status: PageStatus, message: &str) {
        self.update_page(id, page, |detail| {
            if detail.status.can_transition_to(status) {
                detail.status = status;
                detail.message = message.to_string();
            } else {
                tracing::warn!(
                    "Ignoring page {} transition {} -> {}",
                    page,
                    detail.status,
                    status
                );
            }
        });
    }

    pub fn mark_page_completed(&self, id: JobId, page: u32) {
        self.with_job(id, |job| {
            if !job.completed_pages.contains(&page) {
                job.completed_pages.push(page);
                job.completed_pages.sort_unstable();
            }
        });
    }

    /// Mark the job `done`. Refused unless every page is `done`.
    pub fn finish(&self, id: JobId) -> bool {
        self.with_job(id, |job| {
            if !job.all_pages_done() {
                return false;
            }
            job.status = JobStatus::Done;
            job.finished_at = Some(Utc::now());
            true
        })
        .unwrap_or(false)
    }

    /// Mark the job failed. Page records are kept for inspection.
    pub fn fail(&self, id: JobId, message: impl Into<String>) {
        let message = message.into();
        self.with_job(id, |job| {
            job.status = JobStatus::Error;
            job.error = Some(message);
            job.finished_at = Some(Utc::now());
        });
    }

    /// Copy of the job's current state.
    pub fn snapshot(&self, id: JobId) -> Option<JobSnapshot> {
        self.table().get(&id).cloned()
    }

    pub fn review_image(&self, id: JobId, page: u32) -> Option<PathBuf> {
        self.table()
            .get(&id)
            .and_then(|job| job.page(page))
            .and_then(|detail| detail.review_image.clone())
    }

    pub fn remove(&self, id: JobId) -> Option<Job> {
        self.table().remove(&id)
    }

    /// Drop terminal jobs that finished before `cutoff`.
    pub fn purge_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut table = self.table();
        let before = table.len();
        table.retain(|_, job| {
            !(job.status.is_terminal() && job.finished_at.is_some_and(|t| t < cutoff))
        });
        before - table.len()
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store_with_job(pages: u32) -> (JobStore, JobId) {
        let store = JobStore::new();
        let id = store.create(PathBuf::from("/tmp/out.pdf"));
        store.start(id);
        store.init_pages(id, pages, 4);
        (store, id)
    }

    #[test]
    fn test_create_is_queued() {
        let store = JobStore::new();
        let id = store.create(PathBuf::from("out.pdf"));
        let snap = store.snapshot(id).unwrap();
        assert_eq!(snap.status, JobStatus::Queued);
        assert!(snap.pages.is_empty());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let (store, id) = store_with_job(2);
        let before = store.snapshot(id).unwrap();
        store.update_page(id, 1, |d| d.best_score = 42);
        assert_eq!(before.pages[0].best_score, 0);
        assert_eq!(store.snapshot(id).unwrap().pages[0].best_score, 42);
    }

    #[test]
    fn test_update_unknown_page() {
        let (store, id) = store_with_job(1);
        assert!(!store.update_page(id, 2, |_| {}));
        assert!(!store.update_page(JobId::new(), 1, |_| {}));
    }

    #[test]
    fn test_illegal_transition_ignored() {
        let (store, id) = store_with_job(1);
        store.set_page_status(id, 1, PageStatus::Verifying, "skip ahead");
        assert_eq!(store.snapshot(id).unwrap().pages[0].status, PageStatus::Pending);
        store.set_page_status(id, 1, PageStatus::Running, "ocr");
        store.set_page_status(id, 1, PageStatus::Verifying, "verify");
        assert_eq!(store.snapshot(id).unwrap().pages[0].status, PageStatus::Verifying);
    }

    #[test]
    fn test_finish_requires_all_pages_done() {
        let (store, id) = store_with_job(2);
        for page in 1..=2 {
            store.set_page_status(id, page, PageStatus::Running, "");
            store.set_page_status(id, page, PageStatus::Verifying, "");
        }
        store.set_page_status(id, 2, PageStatus::Done, "ok");
        store.mark_page_completed(id, 2);
        assert!(!store.finish(id));
        assert_eq!(store.snapshot(id).unwrap().status, JobStatus::Running);

        store.set_page_status(id, 1, PageStatus::Done, "ok");
        store.mark_page_completed(id, 1);
        store.mark_page_completed(id, 1);
        assert!(store.finish(id));
        let snap = store.snapshot(id).unwrap();
        assert_eq!(snap.status, JobStatus::Done);
        assert_eq!(snap.completed_pages, vec![1, 2]);
    }

    #[test]
    fn test_fail_keeps_page_details() {
        let (store, id) = store_with_job(1);
        store.update_page(id, 1, |d| d.message = "attempt 2/4".to_string());
        store.fail(id, "tesseract exploded");
        let snap = store.snapshot(id).unwrap();
        assert_eq!(snap.status, JobStatus::Error);
        assert_eq!(snap.error.as_deref(), Some("tesseract exploded"));
        assert_eq!(snap.pages[0].message, "attempt 2/4");
    }

    #[test]
    fn test_purge_only_old_terminal_jobs() {
        let (store, failed) = store_with_job(1);
        store.fail(failed, "boom");
        let running = store.create(PathBuf::from("b.pdf"));
        store.start(running);

        assert_eq!(store.purge_finished_before(Utc::now() - Duration::hours(1)), 0);
        assert_eq!(store.purge_finished_before(Utc::now() + Duration::seconds(1)), 1);
        assert!(store.snapshot(failed).is_none());
        assert!(store.snapshot(running).is_some());
        assert_eq!(store.len(), 1);
    }
}
