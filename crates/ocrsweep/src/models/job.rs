//! Conversion job records.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::page::{PageDetail, PageStatus};

/// Opaque job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::try_parse(s).ok().map(Self)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Overall job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One conversion request and its per-page progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub output: PathBuf,
    pub total_pages: u32,
    /// Page numbers that reached `done`, ascending.
    pub completed_pages: Vec<u32>,
    /// Index `i` holds page `i + 1`.
    pub pages: Vec<PageDetail>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(output: PathBuf) -> Self {
        Self {
            id: JobId::new(),
            status: JobStatus::Queued,
            output,
            total_pages: 0,
            completed_pages: Vec::new(),
            pages: Vec::new(),
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn page(&self, page: u32) -> Option<&PageDetail> {
        page.checked_sub(1).and_then(|i| self.pages.get(i as usize))
    }

    pub fn page_mut(&mut self, page: u32) -> Option<&mut PageDetail> {
        page.checked_sub(1).and_then(|i| self.pages.get_mut(i as usize))
    }

    /// True once every page has reached `done`.
    pub fn all_pages_done(&self) -> bool {
        !self.pages.is_empty() && self.pages.iter().all(|p| p.status == PageStatus::Done)
    }

    pub fn pages_needing_review(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|p| p.needs_review)
            .map(|p| p.page)
            .collect()
    }
}

/// Point-in-time copy of a job handed to status readers.
pub type JobSnapshot = Job;
