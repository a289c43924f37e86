//! Text-layer scoring for OCR candidates.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use ocrsweep::models::Analysis;

use crate::tools::{TextExtractor, ToolError};

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-zА-Яа-я0-9][A-Za-zА-Яа-я0-9._/-]*").unwrap());

/// Alphanumeric codes mixing letters and digits: tags, line numbers, dimensions.
static ENGINEERING_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:[A-Za-z]{1,6}[-_/]?\d{1,8}[A-Za-z0-9._/-]*)|(?:\d{1,8}[A-Za-z]{1,6}[A-Za-z0-9._/-]*)",
    )
    .unwrap()
});

static NUMERIC_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());

/// Count the features of an extracted text layer.
pub fn analyze_text(text: &str) -> Analysis {
    let alnum_chars = text.chars().filter(|c| c.is_alphanumeric()).count() as u64;
    let tokens = TOKEN
        .find_iter(text)
        .filter(|m| m.as_str().chars().count() >= 2)
        .count() as u64;
    let eng_tokens = ENGINEERING_TOKEN.find_iter(text).count() as u64;
    let numeric_tokens = NUMERIC_TOKEN.find_iter(text).count() as u64;
    Analysis::new(alnum_chars, tokens, eng_tokens, numeric_tokens)
}

/// Extract and score the text layer of an OCR output.
pub fn analyze_pdf(extractor: &dyn TextExtractor, pdf: &Path) -> Result<Analysis, ToolError> {
    let text = extractor.extract_text(pdf)?;
    Ok(analyze_text(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocrsweep::models::OcrMode;

    #[test]
    fn test_empty_text() {
        let analysis = analyze_text("");
        assert_eq!(analysis, Analysis::new(0, 0, 0, 0));
        assert_eq!(analysis.score(), 0);
    }

    #[test]
    fn test_drawing_labels() {
        // tokens: LINE, P-101, DN50, 12.5 ; eng: P-101, DN50 ; numeric: 101, 50, 12.5
        let analysis = analyze_text("LINE P-101 DN50 12.5 a");
        assert_eq!(analysis.tokens, 4);
        assert_eq!(analysis.eng_tokens, 2);
        assert_eq!(analysis.numeric_tokens, 3);
        assert_eq!(analysis.alnum_chars, 16);
        assert_eq!(analysis.score(), 16 + 2 * 4 + 5 * 2);
    }

    #[test]
    fn test_cyrillic_tokens() {
        // "1,6" splits into single-char tokens that do not count
        let analysis = analyze_text("давление 1,6 МПа");
        assert_eq!(analysis.tokens, 2);
        assert_eq!(analysis.eng_tokens, 0);
        assert_eq!(analysis.numeric_tokens, 1);
    }

    #[test]
    fn test_engineering_text_ranks_higher_in_drawing_mode() {
        let analysis = analyze_text("TAG-101 TAG-102 PSV-7 100x50");
        assert!(
            analysis.selection_score(OcrMode::Drawing)
                > analysis.selection_score(OcrMode::Standard)
        );
    }
}
