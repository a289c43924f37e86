//! OCR profiles: named parameter sets for one OCR-to-PDF attempt.

use serde::{Deserialize, Serialize};

/// Operating mode of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrMode {
    /// Prose-style scans.
    Standard,
    /// Technical drawings: sparse, rotated and tabular text.
    Drawing,
}

impl OcrMode {
    pub fn from_drawing_flag(drawing: bool) -> Self {
        if drawing {
            Self::Drawing
        } else {
            Self::Standard
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, Self::Drawing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Drawing => "drawing",
        }
    }
}

impl std::fmt::Display for OcrMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Binarization strategy handed to the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Thresholding {
    Auto,
    Otsu,
    AdaptiveOtsu,
    Sauvola,
}

impl Thresholding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Otsu => "otsu",
            Self::AdaptiveOtsu => "adaptive-otsu",
            Self::Sauvola => "sauvola",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "otsu" => Some(Self::Otsu),
            "adaptive-otsu" | "adaptive_otsu" => Some(Self::AdaptiveOtsu),
            "sauvola" => Some(Self::Sauvola),
            _ => None,
        }
    }
}

impl std::fmt::Display for Thresholding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named configuration for one OCR attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Tesseract page segmentation mode (0-13).
    pub psm: Option<u8>,
    /// Rasterization DPI before OCR.
    pub oversample: Option<u32>,
    pub remove_background: bool,
    pub clean: bool,
    pub clean_final: bool,
    pub remove_vectors: bool,
    pub thresholding: Option<Thresholding>,
}

impl Profile {
    fn preset(
        name: &str,
        psm: u8,
        oversample: u32,
        remove_background: bool,
        remove_vectors: bool,
        thresholding: Thresholding,
    ) -> Self {
        Self {
            name: name.to_string(),
            psm: Some(psm),
            oversample: Some(oversample),
            remove_background,
            clean: false,
            clean_final: false,
            remove_vectors,
            thresholding: Some(thresholding),
        }
    }

    /// Engine defaults with no tuning.
    pub fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            psm: None,
            oversample: None,
            remove_background: false,
            clean: false,
            clean_final: false,
            remove_vectors: false,
            thresholding: None,
        }
    }

    /// Fixed primary profile set run for every page, in order.
    pub fn primary_set(mode: OcrMode) -> Vec<Profile> {
        match mode {
            OcrMode::Standard => vec![Self::standard()],
            OcrMode::Drawing => vec![
                Self::preset("draw-sparse-a", 11, 450, true, false, Thresholding::AdaptiveOtsu),
                Self::preset("draw-lines-b", 6, 650, false, true, Thresholding::Sauvola),
                Self::preset("draw-grid-c", 4, 550, true, false, Thresholding::Otsu),
            ],
        }
    }

    /// Profile for the first rescue pass.
    pub fn rescue(mode: OcrMode) -> Self {
        match mode {
            OcrMode::Drawing => {
                Self::preset("draw-rescue", 11, 750, false, true, Thresholding::Sauvola)
            }
            OcrMode::Standard => {
                Self::preset("standard-rescue", 6, 450, false, false, Thresholding::AdaptiveOtsu)
            }
        }
    }

    /// Profile for the more aggressive secondary rescue pass.
    pub fn secondary_rescue(mode: OcrMode) -> Self {
        match mode {
            OcrMode::Drawing => {
                Self::preset("draw-rescue-2", 6, 900, true, true, Thresholding::AdaptiveOtsu)
            }
            OcrMode::Standard => Self::preset(
                "standard-rescue-2",
                4,
                550,
                false,
                false,
                Thresholding::AdaptiveOtsu,
            ),
        }
    }
}
