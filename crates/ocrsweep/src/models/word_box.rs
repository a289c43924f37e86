//! Word bounding boxes reported by the word detector.

use serde::{Deserialize, Serialize};

/// A detected word in image pixel coordinates.
///
/// `left`/`top` address the upper-left corner with the Y axis pointing
/// down. Confidence is the detector's 0-100 score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub text: String,
    pub confidence: f32,
}

impl WordBox {
    pub fn new(
        left: i32,
        top: i32,
        width: i32,
        height: i32,
        text: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            left,
            top,
            width,
            height,
            text: text.into(),
            confidence,
        }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    /// Same box shifted by a tile origin.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..self.clone()
        }
    }
}
