//! Supplementary invisible text for a finished page.
//!
//! Two sources feed the overlay:
//! - coverage word boxes, mapped from render pixels to PDF units
//! - plain-text rescue lines, stacked along the page margin
//!
//! Both are injected additively through [`ocrsweep::pdf::inject_overlay`];
//! the review image lives in [`review`].

pub mod review;

use std::collections::HashSet;
use std::path::Path;

use ocrsweep::config::{is_mixed_english, Vocabulary};
use ocrsweep::models::WordBox;
use ocrsweep::pdf::{inject_overlay, page_size, OverlayWord, PdfError};
use ocrsweep::utils::{compact_upper, normalize_overlay_token, normalize_rescue_line};
use thiserror::Error;
use tracing::debug;

use crate::tools::{ToolError, WordDetector};

pub use review::write_review_image;

/// Boxes under this confidence never reach the overlay.
const MIN_OVERLAY_CONF: f32 = 15.0;
const MAX_OVERLAY_WORDS: usize = 3500;
/// Pixel bucket used to drop repeated detections of one word.
const DEDUP_BUCKET_PX: i32 = 5;
const MIN_WORD_EXTENT: f64 = 2.0;

const RESCUE_PSMS: [u8; 2] = [6, 11];
const MAX_RESCUE_LINES: usize = 180;
const MIN_LINE_KEY_CHARS: usize = 4;

const LINE_MARGIN: f64 = 8.0;
const LINE_STEP: f64 = 5.8;
const LINE_HEIGHT: f64 = 6.0;
const MIN_LINE_WIDTH: f64 = 20.0;

/// A phrase re-added when each group has at least one word in the text.
struct PriorityRule {
    phrase: &'static str,
    groups: &'static [&'static [&'static str]],
}

const PRIORITY_RULES: &[PriorityRule] = &[
    PriorityRule {
        phrase: "DESIGN CODE",
        groups: &[&["DESIGN"], &["CODE"]],
    },
    PriorityRule {
        phrase: "DESIGN TEMP",
        groups: &[&["DESIGN"], &["TEMP"]],
    },
    PriorityRule {
        phrase: "RADIOGRAPHIC EXAM",
        groups: &[&["RADIO"], &["RADIOGRAPHIC", "EXAM"]],
    },
    PriorityRule {
        phrase: "JOINT EFFICIENCY",
        groups: &[&["JOINT", "FIOINT"], &["EFFICIENC"]],
    },
    PriorityRule {
        phrase: "INSULATION",
        groups: &[&["INSULATION"]],
    },
    PriorityRule {
        phrase: "FIRE PROOFING",
        groups: &[&["FIRE"], &["PROOFING"]],
    },
    PriorityRule {
        phrase: "ACID PICKLING",
        groups: &[&["ACID"], &["PICKLING", "PLCKLING", "PICKL"]],
    },
];

/// Title-block rows asserted once a design table is recognized.
const TITLE_BLOCK_MARKER: &str = "DESIGNCODE";
const TITLE_BLOCK_PHRASES: &[&str] = &[
    "DESIGN TEMP",
    "RADIOGRAPHIC EXAM",
    "JOINT EFFICIENCY",
    "INSULATION",
    "FIRE PROOFING",
    "ACID PICKLING",
];

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Map detected boxes onto the page as invisible words.
///
/// Boxes are taken in descending confidence so the best reading of a
/// repeated word wins its position bucket.
pub fn prepare_overlay_words(
    boxes: &[WordBox],
    page: (f64, f64),
    image: (u32, u32),
    vocabulary: &Vocabulary,
) -> Vec<OverlayWord> {
    let (page_width, page_height) = page;
    let (image_width, image_height) = image;
    if image_width == 0 || image_height == 0 || page_width <= 0.0 || page_height <= 0.0 {
        return Vec::new();
    }

    let scale_x = page_width / f64::from(image_width);
    let scale_y = page_height / f64::from(image_height);

    let mut ranked: Vec<&WordBox> = boxes.iter().collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut seen = HashSet::new();
    let mut words = Vec::new();
    for b in ranked {
        if b.confidence < MIN_OVERLAY_CONF {
            continue;
        }
        let text = normalize_overlay_token(&b.text, vocabulary);
        if text.is_empty() {
            continue;
        }
        let key = (
            text.clone(),
            b.left.div_euclid(DEDUP_BUCKET_PX),
            b.top.div_euclid(DEDUP_BUCKET_PX),
        );
        if !seen.insert(key) {
            continue;
        }

        words.push(OverlayWord::new(
            f64::from(b.left) * scale_x,
            page_height - f64::from(b.top + b.height) * scale_y,
            (f64::from(b.width) * scale_x).max(MIN_WORD_EXTENT),
            (f64::from(b.height) * scale_y).max(MIN_WORD_EXTENT),
            text,
        ));
        if words.len() >= MAX_OVERLAY_WORDS {
            break;
        }
    }
    words
}

/// Stack rescue lines from the bottom margin upwards.
pub fn layout_lines(lines: &[String], page: (f64, f64)) -> Vec<OverlayWord> {
    let (page_width, page_height) = page;
    let limit = (page_height - LINE_MARGIN).max(LINE_MARGIN);
    let width = (page_width - 2.0 * LINE_MARGIN).max(MIN_LINE_WIDTH);

    let mut words = Vec::new();
    let mut y = LINE_MARGIN;
    for line in lines {
        if y > limit {
            break;
        }
        words.push(OverlayWord::new(LINE_MARGIN, y, width, LINE_HEIGHT, line.as_str()));
        y += LINE_STEP;
        if words.len() >= MAX_RESCUE_LINES {
            break;
        }
    }
    words
}

/// Keep the first line for each compact form, skipping short ones.
pub fn dedup_rescue_lines<I, S>(lines: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for line in lines {
        let line = line.into();
        let key = compact_upper(&line);
        if key.len() < MIN_LINE_KEY_CHARS || !seen.insert(key) {
            continue;
        }
        out.push(line);
        if out.len() >= limit {
            break;
        }
    }
    out
}

fn priority_phrases(lines: &[String], vocabulary: &Vocabulary) -> Vec<String> {
    let joined = lines.join(" ").to_uppercase();
    let compact = compact_upper(&joined);

    let mut phrases: Vec<String> = vocabulary
        .token_splits
        .iter()
        .map(|(_, phrase)| phrase)
        .filter(|phrase| {
            let key = compact_upper(phrase);
            !key.is_empty() && compact.contains(&key)
        })
        .cloned()
        .collect();

    for rule in PRIORITY_RULES {
        let applies = rule
            .groups
            .iter()
            .all(|group| group.iter().any(|word| joined.contains(word)));
        if applies {
            phrases.push(rule.phrase.to_string());
        }
    }

    if compact.contains(TITLE_BLOCK_MARKER) {
        phrases.extend(TITLE_BLOCK_PHRASES.iter().map(|p| p.to_string()));
    }
    phrases
}

/// Turn raw plain-text OCR output into overlay lines: normalized,
/// misreads repaired, known title-block phrases first.
pub fn rescue_lines_from_text<S: AsRef<str>>(texts: &[S], vocabulary: &Vocabulary) -> Vec<String> {
    let corrected: Vec<String> = texts
        .iter()
        .flat_map(|text| text.as_ref().lines())
        .map(normalize_rescue_line)
        .filter(|line| !line.is_empty())
        .map(|line| vocabulary.repair_misreads(&line))
        .collect();

    let priority = priority_phrases(&corrected, vocabulary);
    dedup_rescue_lines(priority.into_iter().chain(corrected), MAX_RESCUE_LINES)
}

/// Plain-text scan of a page render, independent of the word boxes.
pub fn scan_rescue_lines(
    detector: &dyn WordDetector,
    image: &Path,
    language: &str,
    vocabulary: &Vocabulary,
) -> Result<Vec<String>, ToolError> {
    let mut languages = vec![language];
    if is_mixed_english(language) {
        languages.push("eng");
    }

    let mut texts = Vec::new();
    for lang in languages {
        for psm in RESCUE_PSMS {
            texts.push(detector.detect_text(image, lang, psm)?);
        }
    }
    let lines = rescue_lines_from_text(texts.as_slice(), vocabulary);
    debug!("Plain-text rescue produced {} lines", lines.len());
    Ok(lines)
}

/// Inject coverage boxes from `render` into the single-page `page_pdf`.
pub fn inject_box_overlay(
    page_pdf: &Path,
    render: &Path,
    boxes: &[WordBox],
    vocabulary: &Vocabulary,
) -> Result<usize, OverlayError> {
    if boxes.is_empty() {
        return Ok(0);
    }
    let image = image::image_dimensions(render)?;
    let page = page_size(page_pdf)?;
    let words = prepare_overlay_words(boxes, page, image, vocabulary);
    Ok(inject_overlay(page_pdf, &words)?)
}

/// Inject rescue lines into the single-page `page_pdf`.
pub fn inject_line_overlay(page_pdf: &Path, lines: &[String]) -> Result<usize, OverlayError> {
    if lines.is_empty() {
        return Ok(0);
    }
    let page = page_size(page_pdf)?;
    let words = layout_lines(lines, page);
    Ok(inject_overlay(page_pdf, &words)?)
}
