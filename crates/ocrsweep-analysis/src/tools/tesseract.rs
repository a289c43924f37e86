//! Tesseract word detector.

use std::path::Path;
use std::process::Command;

use ocrsweep::models::WordBox;

use super::{run_tool, ToolError, WordDetector};

const TSV_COLUMNS: usize = 12;

/// Parse `tesseract ... tsv` output into word boxes.
///
/// The header row is skipped. Rows that are short, blank, unparsable,
/// below `min_conf` or without area are dropped.
pub fn parse_tsv(tsv: &str, min_conf: f32) -> Vec<WordBox> {
    tsv.lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < TSV_COLUMNS {
                return None;
            }
            let text = parts[11].trim();
            if text.is_empty() {
                return None;
            }
            let confidence: f32 = parts[10].trim().parse().ok()?;
            let left: i32 = parts[6].trim().parse().ok()?;
            let top: i32 = parts[7].trim().parse().ok()?;
            let width: i32 = parts[8].trim().parse().ok()?;
            let height: i32 = parts[9].trim().parse().ok()?;
            if confidence < min_conf || width <= 0 || height <= 0 {
                return None;
            }
            Some(WordBox::new(left, top, width, height, text, confidence))
        })
        .collect()
}

/// Runs the `tesseract` executable.
pub struct TesseractCli {
    program: String,
}

impl TesseractCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, image: &Path, lang: &str, psm: u8, tsv: bool) -> Result<String, ToolError> {
        let mut command = Command::new(&self.program);
        command
            .arg(image)
            .arg("stdout")
            .args(["-l", lang, "--psm", &psm.to_string()]);
        if tsv {
            command.arg("tsv");
        }
        let stdout = run_tool("tesseract", "tesseract-ocr", &mut command)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl WordDetector for TesseractCli {
    fn detect_words(
        &self,
        image: &Path,
        lang: &str,
        psm: u8,
        min_conf: f32,
    ) -> Result<Vec<WordBox>, ToolError> {
        let tsv = self.run(image, lang, psm, true)?;
        Ok(parse_tsv(&tsv, min_conf))
    }

    fn detect_text(&self, image: &Path, lang: &str, psm: u8) -> Result<String, ToolError> {
        self.run(image, lang, psm, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn row(left: i32, top: i32, w: i32, h: i32, conf: &str, text: &str) -> String {
        format!("5\t1\t1\t1\t1\t1\t{left}\t{top}\t{w}\t{h}\t{conf}\t{text}")
    }

    #[test]
    fn test_parse_tsv() {
        let tsv = [
            HEADER.to_string(),
            row(10, 20, 30, 12, "91.5", "TAG-101"),
            row(50, 20, 30, 12, "12", "low"),
            "1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t".to_string(),
            row(70, 20, 0, 12, "95", "flat"),
            row(90, 20, 10, 12, "x", "bad"),
            "5\t1\t1".to_string(),
        ]
        .join("\n");

        let boxes = parse_tsv(&tsv, 40.0);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0], WordBox::new(10, 20, 30, 12, "TAG-101", 91.5));
    }

    #[test]
    fn test_parse_tsv_header_only() {
        assert!(parse_tsv(HEADER, 0.0).is_empty());
        assert!(parse_tsv("", 0.0).is_empty());
    }

    #[test]
    fn test_parse_tsv_zero_threshold_keeps_low_confidence() {
        let tsv = format!("{HEADER}\n{}", row(1, 2, 3, 4, "0", "7"));
        assert_eq!(parse_tsv(&tsv, 0.0).len(), 1);
    }
}
