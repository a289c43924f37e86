//! Design-table region detection.
//!
//! Title blocks on piping and vessel drawings carry a label/value table
//! ("DESIGN PRESSURE", "DESIGN TEMPERATURE", ...). Whole-page passes miss
//! most of the short values, so the table is located from the labels the
//! page scan already found and every value row is re-read on its own.

use std::path::Path;

use image::GrayImage;

use ocrsweep::config::Vocabulary;
use ocrsweep::geometry::{dedup_boxes, Tile};
use ocrsweep::models::WordBox;
use ocrsweep::utils::{compact_upper, normalize_overlay_token};

use super::raster;
use super::ScanError;
use crate::tools::WordDetector;

const ANCHOR_REGION: f64 = 0.55;
const UNIFORM_ROWS: i32 = 24;
const MIN_ROW_PX: i32 = 10;
const MIN_VALUE_COLUMN_PX: i32 = 80;
const ROW_PSMS: [u8; 2] = [7, 6];

fn frac(value: i32, ratio: f64) -> i32 {
    (value as f64 * ratio) as i32
}

/// Pick the "DESIGN" token that heads the table.
///
/// A "DESIGN" with a "CODE" beside it (same row band, not to its left)
/// is preferred; otherwise the topmost, most confident "DESIGN".
pub fn find_anchor(boxes: &[WordBox], image_height: i32) -> Option<&WordBox> {
    let limit = frac(image_height, ANCHOR_REGION);
    let in_region = |needle: &str| {
        boxes
            .iter()
            .filter(|b| b.top < limit && compact_upper(&b.text).contains(needle))
            .collect::<Vec<&WordBox>>()
    };

    let mut designs = in_region("DESIGN");
    if designs.is_empty() {
        return None;
    }
    designs.sort_by(|a, b| {
        a.top
            .cmp(&b.top)
            .then(b.confidence.total_cmp(&a.confidence))
    });
    let codes = in_region("CODE");

    let mut best: Option<(f64, &WordBox)> = None;
    for design in &designs {
        let tolerance = 36.max(frac(design.height, 1.6));
        for code in &codes {
            let dy = (code.top - design.top).abs();
            if dy > tolerance || code.left + 15 < design.left {
                continue;
            }
            let distance = (code.left - design.left).abs() as f64 + dy as f64 * 0.4;
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, *design));
            }
        }
    }
    best.map(|(_, b)| b).or(designs.first().copied())
}

/// One representative label per visual row.
fn cluster_label_rows<'a>(mut labels: Vec<&'a WordBox>) -> Vec<&'a WordBox> {
    if labels.is_empty() {
        return Vec::new();
    }
    labels.sort_by_key(|b| b.top);
    let avg_height = 6.max(labels.iter().map(|b| b.height).sum::<i32>() / labels.len() as i32);
    let merge_gap = 6.max(frac(avg_height, 0.65));

    let mut groups: Vec<Vec<&WordBox>> = Vec::new();
    for label in labels {
        match groups.last_mut() {
            Some(group) if group.last().is_some_and(|prev| label.top - prev.top <= merge_gap) => {
                group.push(label)
            }
            _ => groups.push(vec![label]),
        }
    }

    let rank = |b: &WordBox| (b.confidence, compact_upper(&b.text).len(), b.width);
    groups
        .into_iter()
        .filter_map(|group| {
            group.into_iter().fold(None, |best: Option<&WordBox>, candidate| match best {
                Some(current) if rank(candidate).partial_cmp(&rank(current))
                    != Some(std::cmp::Ordering::Greater) =>
                {
                    Some(current)
                }
                _ => Some(candidate),
            })
        })
        .collect()
}

/// Geometry of a located design table, in image pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    /// Left edge of the value column.
    pub value_left: i32,
    /// Row edges from `top` to `bottom`, ascending.
    pub boundaries: Vec<i32>,
}

impl TableLayout {
    /// Locate the table from boxes already found on a `width`×`height` page.
    pub fn locate(
        boxes: &[WordBox],
        width: i32,
        height: i32,
        vocabulary: &Vocabulary,
    ) -> Option<Self> {
        let anchor = find_anchor(boxes, height)?;

        let left = (anchor.left - 80.max(anchor.width)).max(0);
        let top = (anchor.top - 90.max(frac(anchor.height, 1.6))).max(0);
        let mut right = width.min(left + frac(width, 0.2).max(anchor.width * 8));
        let mut bottom = height.min(top + frac(height, 0.45));

        let region: Vec<&WordBox> = boxes
            .iter()
            .filter(|b| {
                b.left < right + 60
                    && b.right() > left - 60
                    && b.top < bottom + 60
                    && b.bottom() > top - 60
            })
            .collect();
        let max_right = region.iter().map(|b| b.right()).max()?;
        let max_bottom = region.iter().map(|b| b.bottom()).max()?;

        right = width.min(right.max(max_right + 20));
        bottom = height.min(bottom.max((top + frac(height, 0.62)).min(max_bottom + 30)));
        bottom = bottom.min(top + frac(height, 0.32));
        let table_width = right - left;

        let labels: Vec<&WordBox> = region
            .iter()
            .copied()
            .filter(|b| {
                vocabulary.is_table_label(&compact_upper(&b.text))
                    && b.left <= left + frac(table_width, 0.62)
            })
            .collect();
        let rows = cluster_label_rows(labels);

        let fallback_divide = left + frac(table_width, 0.41);
        let (avg_height, mut label_right) = if rows.is_empty() {
            (10.max((bottom - top) / UNIFORM_ROWS), fallback_divide)
        } else {
            let sum: i32 = rows.iter().map(|r| r.height).sum();
            let label_right = rows.iter().map(|r| r.right()).max().unwrap_or(fallback_divide);
            (8.max(sum / rows.len() as i32), label_right)
        };
        if label_right >= right - 70 {
            label_right = fallback_divide;
        }

        let divider = left + frac(table_width, 0.43);
        let value_left = (width - 1).min((label_right + 8).max(divider));
        if right - value_left < MIN_VALUE_COLUMN_PX {
            return None;
        }

        let center_gap = 6.max(frac(avg_height, 0.55));
        let mut centers: Vec<i32> = Vec::new();
        let mut sorted_rows = rows;
        sorted_rows.sort_by_key(|r| r.top);
        for row in sorted_rows {
            let center = (row.top as f64 + row.height as f64 / 2.0) as i32;
            match centers.last_mut() {
                Some(last) if center - *last <= center_gap => *last = (*last + center) / 2,
                _ => centers.push(center),
            }
        }

        let boundaries = if centers.len() >= 5 {
            let mut edges = vec![top];
            edges.extend(centers.windows(2).map(|w| (w[0] + w[1]) / 2));
            edges.push(bottom);
            edges
        } else {
            let row_height = 10.max((bottom - top) / UNIFORM_ROWS);
            let mut edges: Vec<i32> = (top..bottom).step_by(row_height as usize).collect();
            if edges.first() != Some(&top) {
                edges.insert(0, top);
            }
            if edges.last() != Some(&bottom) {
                edges.push(bottom);
            }
            edges
        };

        Some(Self {
            left,
            top,
            right,
            bottom,
            value_left,
            boundaries,
        })
    }

    /// Value-column cells tall enough to scan, top to bottom.
    pub fn value_cells(&self) -> Vec<Tile> {
        self.boundaries
            .windows(2)
            .filter(|w| w[1] - w[0] >= MIN_ROW_PX)
            .map(|w| Tile {
                left: self.value_left.max(0) as u32,
                top: w[0].max(0) as u32,
                right: self.right.max(0) as u32,
                bottom: w[1].max(0) as u32,
            })
            .collect()
    }
}

/// Re-read every value cell of the design table on `image`.
///
/// Cells are upscaled 2× and scanned with English plus `language` under
/// two segmentation modes. A failing cell scan is skipped.
pub fn scan_design_table(
    image: &GrayImage,
    base_boxes: &[WordBox],
    detector: &dyn WordDetector,
    language: &str,
    vocabulary: &Vocabulary,
    work_dir: &Path,
) -> Result<Vec<WordBox>, ScanError> {
    let (width, height) = image.dimensions();
    let Some(layout) = TableLayout::locate(base_boxes, width as i32, height as i32, vocabulary)
    else {
        return Ok(Vec::new());
    };
    tracing::debug!(
        "Design table at ({}, {})-({}, {}), {} row edges",
        layout.left,
        layout.top,
        layout.right,
        layout.bottom,
        layout.boundaries.len()
    );

    let mut languages = vec!["eng"];
    if language != "eng" {
        languages.push(language);
    }

    let mut found = Vec::new();
    for (index, cell) in layout.value_cells().iter().enumerate() {
        let cropped = raster::crop(image, cell);
        let (crop_w, crop_h) = cropped.dimensions();
        if crop_w == 0 || crop_h == 0 {
            continue;
        }
        let scaled_w = 120.max(crop_w * 2);
        let scaled_h = 28.max(crop_h * 2);
        let scaled = raster::resize(&cropped, scaled_w, scaled_h);
        let path = raster::save_png(&scaled, work_dir, &format!("row_{:03}.png", index))?;
        let scale_x = crop_w as f64 / scaled_w as f64;
        let scale_y = crop_h as f64 / scaled_h as f64;

        for lang in &languages {
            for psm in ROW_PSMS {
                let boxes = match detector.detect_words(&path, lang, psm, 0.0) {
                    Ok(boxes) => boxes,
                    Err(e) => {
                        tracing::warn!("Table row {} scan failed ({} psm {}): {}", index, lang, psm, e);
                        continue;
                    }
                };
                for b in boxes {
                    let normalized = normalize_overlay_token(&b.text, vocabulary);
                    let text = if normalized.is_empty() { b.text } else { normalized };
                    found.push(WordBox::new(
                        cell.left as i32 + (b.left as f64 * scale_x) as i32,
                        cell.top as i32 + (b.top as f64 * scale_y) as i32,
                        1.max((b.width as f64 * scale_x) as i32),
                        1.max((b.height as f64 * scale_y) as i32),
                        text,
                        b.confidence,
                    ));
                }
            }
        }
    }
    Ok(dedup_boxes(found))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(left: i32, top: i32, width: i32, height: i32, text: &str, conf: f32) -> WordBox {
        WordBox::new(left, top, width, height, text, conf)
    }

    #[test]
    fn test_anchor_requires_design_in_upper_region() {
        let boxes = vec![word(100, 800, 80, 20, "DESIGN", 90.0)];
        assert!(find_anchor(&boxes, 1000).is_none());
    }

    #[test]
    fn test_anchor_prefers_design_next_to_code() {
        let boxes = vec![
            word(500, 50, 80, 20, "DESIGN", 95.0),
            word(100, 300, 80, 20, "DESIGN", 60.0),
            word(190, 305, 60, 20, "CODE", 80.0),
        ];
        let anchor = find_anchor(&boxes, 1000).unwrap();
        assert_eq!(anchor.top, 300);
    }

    #[test]
    fn test_anchor_rejects_code_left_of_design() {
        let boxes = vec![
            word(500, 50, 80, 20, "DESIGN", 95.0),
            word(400, 300, 80, 20, "DESIGN", 60.0),
            word(100, 305, 60, 20, "CODE", 80.0),
        ];
        assert_eq!(find_anchor(&boxes, 1000).unwrap().top, 50);
    }

    #[test]
    fn test_anchor_without_code_ties_on_confidence() {
        let boxes = vec![
            word(100, 40, 80, 20, "DESIGN", 70.0),
            word(300, 40, 80, 20, "DESIGN:", 90.0),
        ];
        assert_eq!(find_anchor(&boxes, 1000).unwrap().left, 300);
    }

    #[test]
    fn test_cluster_keeps_one_label_per_row() {
        let boxes = vec![
            word(10, 100, 60, 20, "DESIGN", 80.0),
            word(80, 104, 90, 20, "PRESSURE", 80.0),
            word(10, 160, 60, 20, "FLUID", 70.0),
        ];
        let rows = cluster_label_rows(boxes.iter().collect());
        assert_eq!(rows.len(), 2);
        // equal confidence: longer token wins
        assert_eq!(rows[0].text, "PRESSURE");
        assert_eq!(rows[1].text, "FLUID");
    }

    fn title_block(rows: usize) -> Vec<WordBox> {
        let stems = ["PRESSURE", "TEMP", "FLUID", "WEIGHT", "JOINT", "CORROSION", "INSULATION"];
        let mut boxes = vec![
            word(1000, 100, 120, 24, "DESIGN", 90.0),
            word(1140, 100, 80, 24, "CODE", 90.0),
        ];
        for (i, stem) in stems.iter().take(rows).enumerate() {
            let top = 150 + i as i32 * 40;
            boxes.push(word(960, top, 180, 24, stem, 85.0));
            boxes.push(word(1500, top, 60, 24, "1.6", 60.0));
        }
        boxes
    }

    #[test]
    fn test_locate_with_label_rows() {
        let layout =
            TableLayout::locate(&title_block(6), 2400, 1800, &Vocabulary::default()).unwrap();
        assert_eq!(layout.left, 880);
        assert_eq!(layout.top, 10);
        // 880 + max(480, 960) = 1840
        assert_eq!(layout.right, 1840);
        // the 43% divider lies right of every label
        assert_eq!(layout.value_left, 880 + (960.0 * 0.43) as i32);
        // DESIGN counts as a label too: seven centers, six midpoints, two edges
        assert_eq!(layout.boundaries.len(), 8);
        assert_eq!(layout.boundaries[0], 10);
        assert_eq!(layout.boundaries[1], 137);
        assert_eq!(*layout.boundaries.last().unwrap(), layout.bottom);
        assert!(layout.bottom <= layout.top + (1800.0 * 0.32) as i32);
    }

    #[test]
    fn test_locate_uniform_rows_with_few_labels() {
        let boxes = vec![word(1000, 100, 120, 24, "DESIGN", 90.0)];
        let layout = TableLayout::locate(&boxes, 2400, 1800, &Vocabulary::default()).unwrap();
        assert_eq!(layout.boundaries[0], layout.top);
        assert_eq!(*layout.boundaries.last().unwrap(), layout.bottom);
        let row_height = 10.max((layout.bottom - layout.top) / 24);
        assert_eq!(layout.boundaries[1] - layout.boundaries[0], row_height);
        assert!(layout.value_cells().iter().all(|c| c.height() >= 10));
    }

    #[test]
    fn test_locate_rejects_narrow_value_column() {
        // Tiny page: the table cannot leave 80 px for values.
        let boxes = vec![word(10, 10, 20, 8, "DESIGN", 90.0)];
        assert!(TableLayout::locate(&boxes, 120, 200, &Vocabulary::default()).is_none());
    }
}
