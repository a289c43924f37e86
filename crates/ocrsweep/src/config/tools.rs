//! Locations of the external executables the pipeline drives.

use serde::{Deserialize, Serialize};

/// Executable names or paths. Defaults resolve through `PATH`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ocrmypdf: String,
    pub tesseract: String,
    pub pdftoppm: String,
    pub pdftotext: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ocrmypdf: "ocrmypdf".to_string(),
            tesseract: "tesseract".to_string(),
            pdftoppm: "pdftoppm".to_string(),
            pdftotext: "pdftotext".to_string(),
        }
    }
}

impl ToolPaths {
    /// Expand `~` and environment variables in every entry.
    pub fn expanded(&self) -> Self {
        let expand = |s: &str| {
            shellexpand::full(s)
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };
        Self {
            ocrmypdf: expand(&self.ocrmypdf),
            tesseract: expand(&self.tesseract),
            pdftoppm: expand(&self.pdftoppm),
            pdftotext: expand(&self.pdftotext),
        }
    }
}
