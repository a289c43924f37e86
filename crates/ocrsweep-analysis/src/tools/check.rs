//! Availability of the external executables.

use std::path::PathBuf;

use ocrsweep::config::ToolPaths;

/// Resolution result for one executable.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub program: String,
    pub hint: &'static str,
    /// Resolved location, if found.
    pub path: Option<PathBuf>,
}

impl ToolStatus {
    fn resolve(name: &'static str, program: &str, hint: &'static str) -> Self {
        Self {
            name,
            program: program.to_string(),
            hint,
            path: which::which(program).ok(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Check every executable a conversion needs.
///
/// qpdf and Ghostscript are not called directly but ocrmypdf cannot run
/// without them.
pub fn check_tools(paths: &ToolPaths) -> Vec<ToolStatus> {
    let paths = paths.expanded();
    vec![
        ToolStatus::resolve("ocrmypdf", &paths.ocrmypdf, "ocrmypdf"),
        ToolStatus::resolve("tesseract", &paths.tesseract, "tesseract-ocr"),
        ToolStatus::resolve("qpdf", "qpdf", "qpdf"),
        ToolStatus::resolve("gs", "gs", "ghostscript"),
        ToolStatus::resolve("pdftoppm", &paths.pdftoppm, "poppler-utils"),
        ToolStatus::resolve("pdftotext", &paths.pdftotext, "poppler-utils"),
    ]
}

/// Executables that could not be found.
pub fn missing_tools(paths: &ToolPaths) -> Vec<ToolStatus> {
    check_tools(paths)
        .into_iter()
        .filter(|status| !status.is_available())
        .collect()
}
