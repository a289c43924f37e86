//! Conversion settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::pages::PageSelection;
use super::ConfigError;
use crate::models::{OcrMode, Profile};

/// Longest accepted language specification, e.g. `"rus+eng+deu"`.
const MAX_LANGUAGE_LEN: usize = 20;

/// Options for one conversion job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSettings {
    /// Tesseract language(s), `+`-joined.
    pub language: String,
    /// Output optimization level (0-3).
    pub optimize: u8,
    /// Worker processes the OCR engine may use per page.
    pub jobs: u32,
    pub rotate_pages: bool,
    pub deskew: bool,
    /// Tune profiles and verification for technical drawings.
    pub drawing_mode: bool,
    /// Run the coverage scan, rescue passes and overlay injection.
    pub deep_verify: bool,
    /// Reduce OCR engine output.
    pub quiet: bool,
    /// Pages to OCR; the rest are copied through unchanged.
    pub pages: Option<PageSelection>,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            language: "rus+eng".to_string(),
            optimize: 1,
            jobs: 1,
            rotate_pages: true,
            deskew: true,
            drawing_mode: true,
            deep_verify: true,
            quiet: false,
            pages: None,
        }
    }
}

impl ConversionSettings {
    /// Check every option; consumes and returns the settings so callers
    /// only hold validated values.
    pub fn validate(self) -> Result<Self, ConfigError> {
        validate_language(&self.language)?;
        if self.optimize > 3 {
            return Err(ConfigError::InvalidOption {
                name: "optimize",
                message: format!("{} is not in 0..=3", self.optimize),
            });
        }
        if self.jobs < 1 {
            return Err(ConfigError::InvalidOption {
                name: "jobs",
                message: "must be >= 1".to_string(),
            });
        }
        Ok(self)
    }

    pub fn mode(&self) -> OcrMode {
        OcrMode::from_drawing_flag(self.drawing_mode)
    }

    pub fn primary_profiles(&self) -> Vec<Profile> {
        Profile::primary_set(self.mode())
    }

    /// Rescue attempts that may follow the primary set.
    pub fn verify_budget(&self) -> u32 {
        match (self.deep_verify, self.mode()) {
            (false, _) => 0,
            (true, OcrMode::Drawing) => 2,
            (true, OcrMode::Standard) => 1,
        }
    }

    pub fn planned_attempts(&self) -> u32 {
        self.primary_profiles().len() as u32 + self.verify_budget()
    }

    pub fn selects_page(&self, page: u32) -> bool {
        self.pages.as_ref().map_or(true, |sel| sel.contains(page))
    }
}

/// Language codes are passed to external tools as arguments; allow only
/// `[A-Za-z0-9_+]`.
fn validate_language(lang: &str) -> Result<(), ConfigError> {
    if lang.is_empty() || lang.len() > MAX_LANGUAGE_LEN {
        return Err(ConfigError::InvalidLanguage(
            lang.to_string(),
            format!("length must be 1..={}", MAX_LANGUAGE_LEN),
        ));
    }
    if let Some(c) = lang
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '+' && *c != '_')
    {
        return Err(ConfigError::InvalidLanguage(
            lang.to_string(),
            format!("invalid character '{}'", c),
        ));
    }
    Ok(())
}

/// Input must exist and carry a `.pdf` extension.
pub fn validate_input(input: &Path) -> Result<(), ConfigError> {
    if !input.exists() {
        return Err(ConfigError::InputNotFound(input.to_path_buf()));
    }
    let is_pdf = input
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(ConfigError::NotAPdf(input.to_path_buf()));
    }
    Ok(())
}

/// `<dir>/<stem>_searchable.pdf` beside the input.
/// Mixed language sets such as `rus+eng` get extra English-only passes.
pub fn is_mixed_english(language: &str) -> bool {
    language.contains("eng") && language != "eng"
}

pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_searchable.pdf", stem))
}
