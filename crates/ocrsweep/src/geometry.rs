//! Box geometry: rotation remapping, tiling and deduplication.
//!
//! All functions are pure and operate on image pixel coordinates.

use std::collections::HashMap;

use crate::models::WordBox;
use crate::utils::dedup_text_key;

/// Pixel bucket used when deciding two boxes are the same word.
pub const DEDUP_BUCKET_PX: i32 = 6;

/// Quarter-turn the page image was rotated by before detection.
///
/// Angles are counter-clockwise, so `Ccw90` turns a W×H image into an
/// H×W image whose top edge was the original right edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Ccw90,
    Ccw270,
}

impl Rotation {
    pub fn degrees(&self) -> u32 {
        match self {
            Self::Ccw90 => 90,
            Self::Ccw270 => 270,
        }
    }

    pub fn inverse(&self) -> Self {
        match self {
            Self::Ccw90 => Self::Ccw270,
            Self::Ccw270 => Self::Ccw90,
        }
    }
}

/// Map a box detected on a rotated image back into the un-rotated frame.
///
/// `orig_width`/`orig_height` are the dimensions of the un-rotated image.
/// The result is clamped so it never leaves the original bounds.
pub fn map_rotated_box(b: &WordBox, rotation: Rotation, orig_width: i32, orig_height: i32) -> WordBox {
    let (left, top) = match rotation {
        Rotation::Ccw90 => (orig_width - (b.top + b.height), b.left),
        Rotation::Ccw270 => (b.top, orig_height - (b.left + b.width)),
    };

    let left = left.clamp(0, (orig_width - 1).max(0));
    let top = top.clamp(0, (orig_height - 1).max(0));
    let width = b.height.min(orig_width - left).max(1);
    let height = b.width.min(orig_height - top).max(1);

    WordBox {
        left,
        top,
        width,
        height,
        text: b.text.clone(),
        confidence: b.confidence,
    }
}

/// Whether a remapped box reads as a vertical run of text.
pub fn is_vertical_run(b: &WordBox) -> bool {
    // Integer truncation mirrors the height threshold of the detector output.
    b.height >= (b.width as f64 * 1.15) as i32
}

/// Rectangular crop region of an image, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Tile {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Grid layout used to cut an image into overlapping tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    pub rows: u32,
    pub cols: u32,
    pub overlap_ratio: f64,
    /// Shift of the whole grid as a fraction of one cell.
    pub offset_frac: f64,
}

impl TileGrid {
    pub const MIN_TILE_PX: u32 = 8;

    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            overlap_ratio: 0.12,
            offset_frac: 0.0,
        }
    }

    pub fn offset(mut self, frac: f64) -> Self {
        self.offset_frac = frac;
        self
    }

    /// Tiles for a `width`×`height` image; slivers under 8 px are skipped.
    pub fn tiles(&self, width: u32, height: u32) -> Vec<Tile> {
        let rows = self.rows.max(1);
        let cols = self.cols.max(1);
        let step_x = (width / cols).max(1) as i64;
        let step_y = (height / rows).max(1) as i64;
        let overlap_x = ((step_x as f64 * self.overlap_ratio) as i64).max(1);
        let overlap_y = ((step_y as f64 * self.overlap_ratio) as i64).max(1);
        let shift_x = (step_x as f64 * self.offset_frac) as i64;
        let shift_y = (step_y as f64 * self.offset_frac) as i64;
        let (w, h) = (width as i64, height as i64);

        let mut tiles = Vec::new();
        for row in 0..rows as i64 {
            for col in 0..cols as i64 {
                let left = (shift_x + col * step_x - overlap_x).max(0);
                let top = (shift_y + row * step_y - overlap_y).max(0);
                let right = (shift_x + (col + 1) * step_x + overlap_x).min(w);
                let bottom = (shift_y + (row + 1) * step_y + overlap_y).min(h);
                if right - left < Self::MIN_TILE_PX as i64 || bottom - top < Self::MIN_TILE_PX as i64 {
                    continue;
                }
                tiles.push(Tile {
                    left: left as u32,
                    top: top as u32,
                    right: right as u32,
                    bottom: bottom as u32,
                });
            }
        }
        tiles
    }
}

/// Tiles of several grids in order, each distinct tile once.
pub fn merge_tile_grids(grids: &[TileGrid], width: u32, height: u32) -> Vec<Tile> {
    let mut seen = std::collections::HashSet::new();
    grids
        .iter()
        .flat_map(|g| g.tiles(width, height))
        .filter(|t| seen.insert(*t))
        .collect()
}

/// Collapse duplicate detections of the same word.
///
/// Two boxes are duplicates when their normalized text matches and both
/// `left` and `top` fall in the same 6-pixel bucket; the higher-confidence
/// box wins and keeps the slot of the first occurrence. Boxes whose text
/// normalizes to nothing are dropped.
pub fn dedup_boxes(boxes: impl IntoIterator<Item = WordBox>) -> Vec<WordBox> {
    let mut slots: HashMap<(String, i32, i32), usize> = HashMap::new();
    let mut kept: Vec<WordBox> = Vec::new();

    for b in boxes {
        let normalized = dedup_text_key(&b.text);
        if normalized.is_empty() {
            continue;
        }
        let key = (
            normalized,
            b.left.div_euclid(DEDUP_BUCKET_PX),
            b.top.div_euclid(DEDUP_BUCKET_PX),
        );
        match slots.get(&key) {
            Some(&idx) => {
                if b.confidence > kept[idx].confidence {
                    kept[idx] = b;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(b);
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wb(left: i32, top: i32, width: i32, height: i32, text: &str, conf: f32) -> WordBox {
        WordBox::new(left, top, width, height, text, conf)
    }

    #[test]
    fn test_rotation_mapping_examples() {
        let b = wb(10, 20, 30, 40, "X", 50.0);
        let m90 = map_rotated_box(&b, Rotation::Ccw90, 200, 100);
        assert_eq!((m90.left, m90.top, m90.width, m90.height), (140, 10, 40, 30));
        let m270 = map_rotated_box(&b, Rotation::Ccw270, 200, 100);
        assert_eq!((m270.left, m270.top, m270.width, m270.height), (20, 60, 40, 30));
    }

    #[test]
    fn test_rotation_roundtrip() {
        let (w, h) = (200, 100);
        let b = wb(37, 12, 25, 9, "TAG", 70.0);
        // A box on the 90°-rotated image lives in an h×w frame.
        let back = map_rotated_box(&map_rotated_box(&b, Rotation::Ccw90, w, h), Rotation::Ccw270, h, w);
        assert_eq!((back.left, back.top, back.width, back.height), (37, 12, 25, 9));
        let back = map_rotated_box(&map_rotated_box(&b, Rotation::Ccw270, w, h), Rotation::Ccw90, h, w);
        assert_eq!((back.left, back.top, back.width, back.height), (37, 12, 25, 9));
    }

    #[test]
    fn test_rotation_roundtrip_square() {
        let b = wb(37, 12, 25, 9, "TAG", 70.0);
        for rotation in [Rotation::Ccw90, Rotation::Ccw270] {
            let there = map_rotated_box(&b, rotation, 100, 100);
            let back = map_rotated_box(&there, rotation.inverse(), 100, 100);
            assert_eq!(back, b);
        }
    }

    #[test]
    fn test_rotation_clamps_into_bounds() {
        let b = wb(90, 95, 50, 30, "EDGE", 40.0);
        let m = map_rotated_box(&b, Rotation::Ccw90, 100, 120);
        assert!(m.left >= 0 && m.top >= 0);
        assert!(m.right() <= 100 && m.bottom() <= 120);
        assert!(m.width >= 1 && m.height >= 1);
    }

    #[test]
    fn test_vertical_run() {
        assert!(is_vertical_run(&wb(0, 0, 10, 12, "A", 1.0)));
        assert!(!is_vertical_run(&wb(0, 0, 10, 10, "A", 1.0)));
        assert!(!is_vertical_run(&wb(0, 0, 40, 12, "A", 1.0)));
    }

    #[test]
    fn test_tiles_cover_image_with_overlap() {
        let tiles = TileGrid::new(3, 3).tiles(300, 300);
        assert_eq!(tiles.len(), 9);
        assert_eq!(tiles[0], Tile { left: 0, top: 0, right: 112, bottom: 112 });
        assert_eq!(tiles[4], Tile { left: 88, top: 88, right: 212, bottom: 212 });
        assert_eq!(tiles[8].right, 300);
    }

    #[test]
    fn test_tiles_skip_slivers() {
        assert!(TileGrid::new(4, 4).tiles(10, 10).is_empty());
    }

    #[test]
    fn test_offset_grid_and_merge() {
        let offset = TileGrid::new(4, 4).offset(0.5).tiles(400, 400);
        assert_eq!(offset[0].left, 38);
        let merged = merge_tile_grids(&[TileGrid::new(3, 3), TileGrid::new(3, 3)], 300, 300);
        assert_eq!(merged.len(), 9);
    }

    #[test]
    fn test_dedup_keeps_highest_confidence() {
        let boxes = vec![
            wb(10, 10, 20, 10, "TAG-101", 90.0),
            wb(11, 10, 20, 10, "TAG-101", 80.0),
        ];
        let out = dedup_boxes(boxes);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].confidence, 90.0);
    }

    #[test]
    fn test_dedup_replaces_in_place() {
        let boxes = vec![
            wb(0, 0, 5, 5, "A1", 10.0),
            wb(50, 50, 5, 5, "B2", 10.0),
            wb(1, 1, 5, 5, "a1", 60.0),
        ];
        let out = dedup_boxes(boxes);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "a1");
        assert_eq!(out[1].text, "B2");
    }

    #[test]
    fn test_dedup_drops_empty_text_and_is_idempotent() {
        let boxes = vec![
            wb(0, 0, 5, 5, "--", 99.0),
            wb(0, 0, 5, 5, "P-1", 50.0),
            wb(7, 0, 5, 5, "P1", 55.0),
            wb(30, 30, 5, 5, "P1", 20.0),
        ];
        let once = dedup_boxes(boxes);
        assert_eq!(once.len(), 3);
        let twice = dedup_boxes(once.clone());
        assert_eq!(once, twice);
    }
}
