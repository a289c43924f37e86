//! Poppler utilities: page rasterization and text layer extraction.

use std::path::Path;
use std::process::Command;

use super::{run_tool, PageRenderer, TextExtractor, ToolError};

const POPPLER_HINT: &str = "poppler-utils";

/// Renders pages with `pdftoppm`.
pub struct Pdftoppm {
    program: String,
}

impl Pdftoppm {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PageRenderer for Pdftoppm {
    fn render_page(&self, pdf: &Path, png: &Path, dpi: u32) -> Result<(), ToolError> {
        // -singlefile writes exactly `<prefix>.png`
        let prefix = png.with_extension("");
        let mut command = Command::new(&self.program);
        command
            .args(["-png", "-gray", "-singlefile", "-r", &dpi.to_string()])
            .arg(pdf)
            .arg(&prefix);
        run_tool("pdftoppm", POPPLER_HINT, &mut command)?;

        let written = prefix.with_extension("png");
        if written != png {
            std::fs::rename(&written, png)?;
        }
        if !png.exists() {
            return Err(ToolError::Failed {
                tool: "pdftoppm".to_string(),
                status: "exit status: 0".to_string(),
                stderr: format!("no image generated for {}", pdf.display()),
            });
        }
        Ok(())
    }
}

/// Extracts the text layer with `pdftotext`.
pub struct Pdftotext {
    program: String,
}

impl Pdftotext {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Pdftotext {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

impl TextExtractor for Pdftotext {
    fn extract_text(&self, pdf: &Path) -> Result<String, ToolError> {
        let mut command = Command::new(&self.program);
        command
            .args(["-layout", "-enc", "UTF-8"])
            .arg(pdf)
            .arg("-");
        let stdout = run_tool("pdftotext", POPPLER_HINT, &mut command)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}
