//! Coverage scan results.

use serde::{Deserialize, Serialize};

use super::word_box::WordBox;

/// Independent estimate of how much text a page carries.
///
/// Word counts are per strategy; `boxes` is the deduplicated union of
/// every strategy and is what overlay injection consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub full_words: usize,
    pub tile_words: usize,
    pub combined_words: usize,
    pub vertical_words: usize,
    pub table_words: usize,
    pub gain_ratio: f64,
    #[serde(skip)]
    pub boxes: Vec<WordBox>,
}

impl Coverage {
    /// `(tile - full) / max(full, 1)` when tiling found more, else 0.
    pub fn gain_ratio_for(full_words: usize, tile_words: usize) -> f64 {
        if tile_words > full_words {
            (tile_words - full_words) as f64 / full_words.max(1) as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_ratio() {
        assert_eq!(Coverage::gain_ratio_for(10, 5), 0.0);
        assert_eq!(Coverage::gain_ratio_for(10, 10), 0.0);
        assert!((Coverage::gain_ratio_for(10, 25) - 1.5).abs() < 1e-9);
        assert_eq!(Coverage::gain_ratio_for(0, 7), 7.0);
    }
}
