//! Candidate text analysis and attempt records.

use serde::{Deserialize, Serialize};

use super::profile::OcrMode;

/// Text statistics of one OCR candidate.
///
/// The base score is derived, never stored:
/// `score = alnum_chars + 2 * tokens + 5 * eng_tokens`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub alnum_chars: u64,
    pub tokens: u64,
    /// Alphanumeric codes mixing letters and digits (tags, part numbers).
    pub eng_tokens: u64,
    pub numeric_tokens: u64,
}

impl Analysis {
    pub fn new(alnum_chars: u64, tokens: u64, eng_tokens: u64, numeric_tokens: u64) -> Self {
        Self {
            alnum_chars,
            tokens,
            eng_tokens,
            numeric_tokens,
        }
    }

    pub fn score(&self) -> u64 {
        self.alnum_chars + 2 * self.tokens + 5 * self.eng_tokens
    }

    /// Mode-weighted score used to rank candidates against each other.
    pub fn selection_score(&self, mode: OcrMode) -> u64 {
        match mode {
            OcrMode::Drawing => {
                self.score() + 65 * self.eng_tokens + 30 * self.numeric_tokens + 2 * self.tokens
            }
            OcrMode::Standard => self.score() + 20 * self.eng_tokens + 8 * self.numeric_tokens,
        }
    }
}

/// Outcome of one profile run, as reported per page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based attempt index within the page.
    pub attempt: u32,
    pub profile: String,
    pub score: u64,
    pub tokens: u64,
    pub eng_tokens: u64,
    pub num_tokens: u64,
    pub selection_score: u64,
}

impl Attempt {
    pub fn new(attempt: u32, profile: &str, analysis: &Analysis, mode: OcrMode) -> Self {
        Self {
            attempt,
            profile: profile.to_string(),
            score: analysis.score(),
            tokens: analysis.tokens,
            eng_tokens: analysis.eng_tokens,
            num_tokens: analysis.numeric_tokens,
            selection_score: analysis.selection_score(mode),
        }
    }
}
