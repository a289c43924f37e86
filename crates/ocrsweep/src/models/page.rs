//! Per-page progress and result records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::analysis::Attempt;
use super::coverage::Coverage;

/// Processing state of a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// Waiting for its primary OCR attempts.
    Pending,
    /// Primary profile attempts in progress.
    Running,
    /// Coverage scan, rescue passes and overlay injection.
    Verifying,
    /// Final page output is ready.
    Done,
    /// Processing failed.
    Error,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Verifying => "verifying",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "verifying" => Some(Self::Verifying),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// `pending -> running -> verifying -> done`; `error` from anywhere.
    ///
    /// Pages outside the selected range go straight from `pending` to `done`.
    pub fn can_transition_to(&self, next: PageStatus) -> bool {
        use PageStatus::*;
        match (self, next) {
            (_, Error) => true,
            (a, b) if *a == b => true,
            (Pending, Running) | (Running, Verifying) | (Verifying, Done) => true,
            (Pending, Done) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress and diagnostics of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDetail {
    /// Page number (1-indexed).
    pub page: u32,
    pub status: PageStatus,
    pub attempts_done: u32,
    pub attempts_planned: u32,
    pub current_profile: Option<String>,
    pub best_profile: Option<String>,
    pub best_score: u64,
    pub best_selection_score: u64,
    pub needs_review: bool,
    pub message: String,
    pub attempts: Vec<Attempt>,
    pub scan_full_words: usize,
    pub scan_tile_words: usize,
    pub scan_combined_words: usize,
    pub scan_gain_ratio: f64,
    pub scan_vertical_words: usize,
    pub table_words: usize,
    /// Invisible words injected from coverage boxes.
    pub augmented_words: usize,
    /// Invisible lines injected from the plain-text rescue scan.
    pub fallback_lines: usize,
    pub review_image: Option<PathBuf>,
}

impl PageDetail {
    pub fn new(page: u32, attempts_planned: u32) -> Self {
        Self {
            page,
            status: PageStatus::Pending,
            attempts_done: 0,
            attempts_planned,
            current_profile: None,
            best_profile: None,
            best_score: 0,
            best_selection_score: 0,
            needs_review: false,
            message: String::new(),
            attempts: Vec::new(),
            scan_full_words: 0,
            scan_tile_words: 0,
            scan_combined_words: 0,
            scan_gain_ratio: 0.0,
            scan_vertical_words: 0,
            table_words: 0,
            augmented_words: 0,
            fallback_lines: 0,
            review_image: None,
        }
    }

    /// Copy coverage metrics onto the record.
    pub fn record_coverage(&mut self, coverage: &Coverage) {
        self.scan_full_words = coverage.full_words;
        self.scan_tile_words = coverage.tile_words;
        self.scan_combined_words = coverage.combined_words;
        self.scan_gain_ratio = coverage.gain_ratio;
        self.scan_vertical_words = coverage.vertical_words;
        self.table_words = coverage.table_words;
    }
}
