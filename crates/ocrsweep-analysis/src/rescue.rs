//! Rescue escalation and manual-review decisions.
//!
//! Each decision is an ordered rule table evaluated top to bottom; the
//! first matching rule names the reason. Drawing and standard pages use
//! separate tables, and the secondary-rescue gate keeps its own drawing
//! thresholds apart from the primary ones.

use ocrsweep::models::{Analysis, Coverage, OcrMode};

/// Metrics the rules look at for one page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageSignals {
    pub score: u64,
    pub eng_tokens: u64,
    pub full_words: usize,
    pub tile_words: usize,
    pub combined_words: usize,
    pub gain_ratio: f64,
    /// Invisible words injected from coverage boxes.
    pub augmented_words: usize,
    /// Invisible lines injected from the plain-text rescue scan.
    pub fallback_lines: usize,
}

impl PageSignals {
    pub fn new(analysis: &Analysis, coverage: &Coverage) -> Self {
        Self {
            score: analysis.score(),
            eng_tokens: analysis.eng_tokens,
            full_words: coverage.full_words,
            tile_words: coverage.tile_words,
            combined_words: coverage.combined_words,
            gain_ratio: coverage.gain_ratio,
            augmented_words: 0,
            fallback_lines: 0,
        }
    }

    pub fn with_injected(mut self, augmented_words: usize, fallback_lines: usize) -> Self {
        self.augmented_words = augmented_words;
        self.fallback_lines = fallback_lines;
        self
    }

    fn tile_bonus(&self) -> i64 {
        self.tile_words as i64 - self.full_words as i64
    }
}

/// A named predicate over page signals.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&PageSignals) -> bool,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// First rule in `rules` that applies.
pub fn first_match(rules: &[Rule], signals: &PageSignals) -> Option<&'static str> {
    rules
        .iter()
        .find(|rule| (rule.applies)(signals))
        .map(|rule| rule.name)
}

pub const DRAWING_RESCUE: &[Rule] = &[
    Rule {
        name: "score < 420",
        applies: |s| s.score < 420,
    },
    Rule {
        name: "eng tokens < 8 with tile words >= 25",
        applies: |s| s.eng_tokens < 8 && s.tile_words >= 25,
    },
    Rule {
        name: "combined words < 55",
        applies: |s| s.combined_words < 55,
    },
    Rule {
        name: "tile gain >= 30 at ratio >= 0.35 with score < 700",
        applies: |s| s.tile_bonus() >= 30 && s.gain_ratio >= 0.35 && s.score < 700,
    },
];

pub const STANDARD_RESCUE: &[Rule] = &[Rule {
    name: "score < 120",
    applies: |s| s.score < 120,
}];

pub const DRAWING_REVIEW: &[Rule] = &[
    Rule {
        name: "score < 260",
        applies: |s| s.score < 260,
    },
    Rule {
        name: "eng tokens < 6 with tile words < 20",
        applies: |s| s.eng_tokens < 6 && s.tile_words < 20,
    },
    Rule {
        name: "combined words < 40",
        applies: |s| s.combined_words < 40,
    },
    Rule {
        name: "gain ratio > 1.2 with combined words < 120",
        applies: |s| s.gain_ratio > 1.2 && s.combined_words < 120,
    },
];

pub const STANDARD_REVIEW: &[Rule] = STANDARD_RESCUE;

/// Extra gate a flagged drawing page must pass before the secondary rescue.
pub const DRAWING_SECONDARY_GATE: &[Rule] = &[
    Rule {
        name: "score < 300",
        applies: |s| s.score < 300,
    },
    Rule {
        name: "eng tokens < 6",
        applies: |s| s.eng_tokens < 6,
    },
    Rule {
        name: "combined words < 45",
        applies: |s| s.combined_words < 45,
    },
];

/// Injected text that compensates for weak OCR on a drawing page.
pub const DRAWING_REVIEW_CLEAR: &[Rule] = &[
    Rule {
        name: "injected words >= 120 with combined words >= 120",
        applies: |s| s.augmented_words >= 120 && s.combined_words >= 120,
    },
    Rule {
        name: "injected lines >= 20 with combined words >= 80",
        applies: |s| s.fallback_lines >= 20 && s.combined_words >= 80,
    },
];

/// Escalation decisions for one job's mode and verification setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescuePolicy {
    pub mode: OcrMode,
    pub deep_verify: bool,
}

impl RescuePolicy {
    pub fn new(mode: OcrMode, deep_verify: bool) -> Self {
        Self { mode, deep_verify }
    }

    /// Reason to run the first rescue pass, if any.
    pub fn primary_rescue(&self, signals: &PageSignals) -> Option<&'static str> {
        if !self.deep_verify {
            return None;
        }
        match self.mode {
            OcrMode::Drawing => first_match(DRAWING_RESCUE, signals),
            OcrMode::Standard => first_match(STANDARD_RESCUE, signals),
        }
    }

    /// Reason the page should be checked by hand, if any.
    pub fn needs_review(&self, signals: &PageSignals) -> Option<&'static str> {
        match self.mode {
            OcrMode::Drawing => first_match(DRAWING_REVIEW, signals),
            OcrMode::Standard => first_match(STANDARD_REVIEW, signals),
        }
    }

    /// Reason to run the secondary rescue: the page is still flagged for
    /// review and, for drawings, also fails the secondary gate.
    pub fn secondary_rescue(&self, signals: &PageSignals) -> Option<&'static str> {
        if !self.deep_verify {
            return None;
        }
        let review = self.needs_review(signals)?;
        match self.mode {
            OcrMode::Drawing => first_match(DRAWING_SECONDARY_GATE, signals),
            OcrMode::Standard => Some(review),
        }
    }

    /// Reason a drawing page's review flag can be dropped after injection.
    pub fn review_cleared(&self, signals: &PageSignals) -> Option<&'static str> {
        match self.mode {
            OcrMode::Drawing => first_match(DRAWING_REVIEW_CLEAR, signals),
            OcrMode::Standard => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong_drawing() -> PageSignals {
        PageSignals {
            score: 900,
            eng_tokens: 40,
            full_words: 200,
            tile_words: 210,
            combined_words: 260,
            gain_ratio: 0.05,
            ..Default::default()
        }
    }

    #[test]
    fn test_standard_rescue_threshold() {
        let policy = RescuePolicy::new(OcrMode::Standard, true);
        let weak = PageSignals {
            score: 50,
            ..Default::default()
        };
        let fine = PageSignals {
            score: 200,
            ..Default::default()
        };
        assert_eq!(policy.primary_rescue(&weak), Some("score < 120"));
        assert_eq!(policy.primary_rescue(&fine), None);
    }

    #[test]
    fn test_no_rescue_without_deep_verify() {
        let policy = RescuePolicy::new(OcrMode::Drawing, false);
        let signals = PageSignals::default();
        assert_eq!(policy.primary_rescue(&signals), None);
        assert_eq!(policy.secondary_rescue(&signals), None);
        assert!(policy.needs_review(&signals).is_some());
    }

    #[test]
    fn test_strong_drawing_page_passes_everything() {
        let policy = RescuePolicy::new(OcrMode::Drawing, true);
        let signals = strong_drawing();
        assert_eq!(policy.primary_rescue(&signals), None);
        assert_eq!(policy.needs_review(&signals), None);
        assert_eq!(policy.secondary_rescue(&signals), None);
    }

    #[test]
    fn test_drawing_rules_in_order() {
        let policy = RescuePolicy::new(OcrMode::Drawing, true);
        let mut signals = strong_drawing();
        signals.eng_tokens = 7;
        assert_eq!(
            policy.primary_rescue(&signals),
            Some("eng tokens < 8 with tile words >= 25")
        );

        let mut signals = strong_drawing();
        signals.full_words = 100;
        signals.tile_words = 130;
        signals.gain_ratio = 0.3;
        signals.score = 650;
        assert_eq!(policy.primary_rescue(&signals), None);
        signals.gain_ratio = 0.35;
        assert_eq!(
            policy.primary_rescue(&signals),
            Some("tile gain >= 30 at ratio >= 0.35 with score < 700")
        );
    }

    #[test]
    fn test_low_combined_words_always_flags_review() {
        let policy = RescuePolicy::new(OcrMode::Drawing, true);
        let mut signals = strong_drawing();
        signals.combined_words = 30;
        assert_eq!(policy.needs_review(&signals), Some("combined words < 40"));
    }

    #[test]
    fn test_secondary_gate_is_stricter_than_review() {
        let policy = RescuePolicy::new(OcrMode::Drawing, true);
        // flagged for review by score < 260 but eng tokens and words are fine
        let mut signals = strong_drawing();
        signals.score = 250;
        assert!(policy.needs_review(&signals).is_some());
        assert_eq!(policy.secondary_rescue(&signals), Some("score < 300"));

        // flagged by gain ratio only: the gate does not open
        let mut signals = strong_drawing();
        signals.gain_ratio = 1.5;
        signals.combined_words = 100;
        assert!(policy.needs_review(&signals).is_some());
        assert_eq!(policy.secondary_rescue(&signals), None);
    }

    #[test]
    fn test_standard_secondary_follows_review() {
        let policy = RescuePolicy::new(OcrMode::Standard, true);
        let weak = PageSignals {
            score: 80,
            ..Default::default()
        };
        assert_eq!(policy.secondary_rescue(&weak), Some("score < 120"));
    }

    #[test]
    fn test_review_cleared_by_injection() {
        let policy = RescuePolicy::new(OcrMode::Drawing, true);
        let base = PageSignals {
            combined_words: 120,
            ..Default::default()
        };
        assert_eq!(policy.review_cleared(&base.with_injected(119, 0)), None);
        assert!(policy.review_cleared(&base.with_injected(120, 0)).is_some());
        assert!(policy.review_cleared(&base.with_injected(0, 20)).is_some());

        let sparse = PageSignals {
            combined_words: 79,
            ..Default::default()
        };
        assert_eq!(policy.review_cleared(&sparse.with_injected(500, 500)), None);
        let standard = RescuePolicy::new(OcrMode::Standard, true);
        assert_eq!(standard.review_cleared(&base.with_injected(500, 500)), None);
    }

    #[test]
    fn test_rescue_is_monotonic_in_score() {
        for mode in [OcrMode::Drawing, OcrMode::Standard] {
            let policy = RescuePolicy::new(mode, true);
            for combined_words in [0, 50, 60, 300] {
                for (full_words, tile_words, gain_ratio) in [(0, 0, 0.0), (100, 140, 0.4), (10, 300, 29.0)] {
                    for eng_tokens in [0, 7, 50] {
                        let mut triggered = false;
                        for score in (0..=1000).rev().step_by(10) {
                            let signals = PageSignals {
                                score,
                                eng_tokens,
                                full_words,
                                tile_words,
                                combined_words,
                                gain_ratio,
                                ..Default::default()
                            };
                            let now = policy.primary_rescue(&signals).is_some();
                            assert!(!triggered || now, "rescue turned off at score {score}");
                            triggered = now;
                        }
                    }
                }
            }
        }
    }
}
