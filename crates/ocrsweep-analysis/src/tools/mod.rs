//! External tool adapters.
//!
//! Every collaborator is a trait so the pipeline can run against fakes:
//! - `OcrEngine`: single-pass OCR into a searchable PDF (ocrmypdf)
//! - `PageRenderer`: PDF page to grayscale PNG (pdftoppm)
//! - `WordDetector`: word boxes and plain text from an image (tesseract)
//! - `TextExtractor`: text layer of a PDF (pdftotext)

mod check;
mod ocrmypdf;
mod poppler;
mod tesseract;

pub use check::{check_tools, missing_tools, ToolStatus};
pub use ocrmypdf::{build_args, OcrMyPdf};
pub use poppler::{Pdftoppm, Pdftotext};
pub use tesseract::{parse_tsv, TesseractCli};

use std::path::Path;
use std::process::Command;

use thiserror::Error;

use ocrsweep::config::ConversionSettings;
use ocrsweep::models::{Profile, WordBox};

/// Errors from external tool invocations.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} not found (install {hint})")]
    NotFound { tool: String, hint: &'static str },

    #[error("{tool} failed ({status}): {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for one OCR engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    pub language: String,
    pub optimize: u8,
    pub jobs: u32,
    /// Rasterize and OCR every page even if it already has text.
    pub force_ocr: bool,
    pub rotate_pages: bool,
    pub deskew: bool,
    pub quiet: bool,
    pub profile: Profile,
}

impl OcrRequest {
    pub fn new(settings: &ConversionSettings, profile: &Profile) -> Self {
        Self {
            language: settings.language.clone(),
            optimize: settings.optimize,
            jobs: settings.jobs,
            force_ocr: true,
            rotate_pages: settings.rotate_pages,
            deskew: settings.deskew,
            quiet: settings.quiet,
            profile: profile.clone(),
        }
    }
}

/// Burns a text layer into a PDF.
pub trait OcrEngine: Send + Sync {
    fn run_ocr(&self, input: &Path, output: &Path, request: &OcrRequest) -> Result<(), ToolError>;
}

/// Rasterizes the first page of a PDF.
pub trait PageRenderer: Send + Sync {
    fn render_page(&self, pdf: &Path, png: &Path, dpi: u32) -> Result<(), ToolError>;
}

/// Finds words on an image.
pub trait WordDetector: Send + Sync {
    /// Word boxes with confidence of at least `min_conf`.
    fn detect_words(
        &self,
        image: &Path,
        lang: &str,
        psm: u8,
        min_conf: f32,
    ) -> Result<Vec<WordBox>, ToolError>;

    /// Plain recognized text, one line per text line.
    fn detect_text(&self, image: &Path, lang: &str, psm: u8) -> Result<String, ToolError>;
}

/// Reads the text layer of a PDF.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, pdf: &Path) -> Result<String, ToolError>;
}

/// Run `command` to completion and return its stdout.
///
/// `tool` names the program in errors; a missing executable becomes
/// `ToolError::NotFound` with `hint` as the package to install.
pub(crate) fn run_tool(
    tool: &str,
    hint: &'static str,
    command: &mut Command,
) -> Result<Vec<u8>, ToolError> {
    tracing::debug!("Running {:?}", command);
    match command.output() {
        Ok(output) if output.status.success() => Ok(output.stdout),
        Ok(output) => Err(ToolError::Failed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ToolError::NotFound {
            tool: tool.to_string(),
            hint,
        }),
        Err(e) => Err(ToolError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_tool_not_found() {
        let mut cmd = Command::new("ocrsweep-definitely-missing-binary");
        let err = run_tool("missing", "nothing", &mut cmd).unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
        assert_eq!(err.to_string(), "missing not found (install nothing)");
    }

    #[test]
    fn test_run_tool_failure_keeps_stderr() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo boom >&2; exit 3"]);
        match run_tool("sh", "sh", &mut cmd).unwrap_err() {
            ToolError::Failed { tool, stderr, .. } => {
                assert_eq!(tool, "sh");
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_request_from_settings() {
        let settings = ConversionSettings {
            quiet: true,
            ..Default::default()
        };
        let request = OcrRequest::new(&settings, &Profile::standard());
        assert!(request.force_ocr);
        assert!(request.quiet);
        assert_eq!(request.language, "rus+eng");
        assert_eq!(request.profile.name, "standard");
    }
}
