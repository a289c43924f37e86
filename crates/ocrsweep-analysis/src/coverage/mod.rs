//! Coverage scan.
//!
//! Estimates how much text a rendered page really carries, independently
//! of any OCR attempt:
//! - standard mode: one whole-page word pass
//! - drawing mode: whole-page passes under several segmentation modes,
//!   quarter-turned passes for vertical labels, overlapping tiles with a
//!   denser re-tile when the page looks under-read, and the design table
//!
//! Every strategy's boxes are deduplicated into the page's combined set.

pub mod raster;
pub mod table;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::GrayImage;
use thiserror::Error;

use ocrsweep::config::{is_mixed_english, Vocabulary};
use ocrsweep::geometry::{
    dedup_boxes, is_vertical_run, map_rotated_box, merge_tile_grids, Rotation, Tile, TileGrid,
};
use ocrsweep::models::{Coverage, OcrMode, WordBox};

use crate::tools::{ToolError, WordDetector};

pub use table::{scan_design_table, TableLayout};

/// Errors from the coverage scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which language set a pass uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassLang {
    Configured,
    /// Only run when the configured set mixes English with another language.
    EnglishOnly,
}

/// One word-detection pass: language, segmentation mode, confidence floor.
#[derive(Debug, Clone, Copy)]
struct Pass {
    lang: PassLang,
    psm: u8,
    min_conf: f32,
}

const fn pass(psm: u8, min_conf: f32) -> Pass {
    Pass {
        lang: PassLang::Configured,
        psm,
        min_conf,
    }
}

const fn english(psm: u8, min_conf: f32) -> Pass {
    Pass {
        lang: PassLang::EnglishOnly,
        psm,
        min_conf,
    }
}

const STANDARD_PASS: Pass = pass(6, 40.0);
const FULL_PASSES: &[Pass] = &[pass(11, 30.0), pass(6, 32.0), pass(4, 34.0), english(6, 28.0)];
const VERTICAL_PASSES: &[Pass] = &[pass(6, 16.0), english(6, 14.0)];
const VERTICAL_FALLBACK_PASSES: &[Pass] = &[pass(11, 14.0)];
const QUICK_TILE_PASSES: &[Pass] = &[pass(11, 24.0), pass(6, 24.0), english(6, 22.0)];
const DENSE_TILE_PASSES: &[Pass] = &[pass(4, 22.0), english(4, 20.0)];
const SPARSE_DENSE_PASS: Pass = pass(11, 22.0);

const ROTATIONS: [Rotation; 2] = [Rotation::Ccw90, Rotation::Ccw270];
const MIN_VERTICAL_BOXES: usize = 20;

/// Whether the quick tiles left enough doubt to re-tile more densely.
pub fn needs_dense_scan(combined: usize, tile: usize, full: usize) -> bool {
    combined < 85 || tile < 30 || (tile as i64 - full as i64 >= 8 && full < 180)
}

/// Runs the coverage scan for one rendered page.
pub struct CoverageScanner<'a> {
    detector: &'a dyn WordDetector,
    language: &'a str,
    vocabulary: &'a Vocabulary,
}

/// Per-page scan state: the loaded image and cached derived images.
struct PageScan<'s> {
    png: &'s Path,
    image: GrayImage,
    work_dir: &'s Path,
    rotated: HashMap<Rotation, PathBuf>,
    tiles: HashMap<Tile, PathBuf>,
}

impl<'a> CoverageScanner<'a> {
    pub fn new(detector: &'a dyn WordDetector, language: &'a str, vocabulary: &'a Vocabulary) -> Self {
        Self {
            detector,
            language,
            vocabulary,
        }
    }

    fn enabled<'p>(&self, passes: &'p [Pass]) -> impl Iterator<Item = &'p Pass> + 'p {
        let mixed = is_mixed_english(self.language);
        passes
            .iter()
            .filter(move |p| p.lang == PassLang::Configured || mixed)
    }

    fn lang_of(&self, pass: &Pass) -> &str {
        match pass.lang {
            PassLang::Configured => self.language,
            PassLang::EnglishOnly => "eng",
        }
    }

    fn detect(&self, image: &Path, pass: &Pass) -> Result<Vec<WordBox>, ToolError> {
        self.detector
            .detect_words(image, self.lang_of(pass), pass.psm, pass.min_conf)
    }

    /// Scan the rendered page at `png`.
    pub fn scan(&self, png: &Path, mode: OcrMode) -> Result<Coverage, ScanError> {
        if !mode.is_drawing() {
            let full = dedup_boxes(self.detect(png, &STANDARD_PASS)?);
            let combined = full.clone();
            return Ok(summarize(full, Vec::new(), Vec::new(), Vec::new(), combined));
        }

        let work_dir = tempfile::Builder::new()
            .prefix("ocrsweep_scan_")
            .tempdir()?;
        let mut page = PageScan {
            png,
            image: raster::load_gray(png)?,
            work_dir: work_dir.path(),
            rotated: HashMap::new(),
            tiles: HashMap::new(),
        };

        let mut full_raw = Vec::new();
        for pass in self.enabled(FULL_PASSES) {
            full_raw.extend(self.detect(page.png, pass)?);
        }
        let full = dedup_boxes(full_raw);

        let vertical = self.scan_vertical(&mut page)?;

        let quick_grids = [TileGrid::new(3, 3)];
        let mut quick_raw = Vec::new();
        for pass in self.enabled(QUICK_TILE_PASSES) {
            quick_raw.extend(self.scan_tiles(&mut page, &quick_grids, pass)?);
        }
        let mut tile = dedup_boxes(quick_raw.clone());
        let combined = dedup_boxes(
            full.iter()
                .chain(tile.iter())
                .chain(vertical.iter())
                .cloned(),
        );

        if needs_dense_scan(combined.len(), tile.len(), full.len()) {
            tracing::debug!(
                "Dense tile scan: combined={} tile={} full={}",
                combined.len(),
                tile.len(),
                full.len()
            );
            let dense_grids = [
                TileGrid::new(3, 3),
                TileGrid::new(4, 4),
                TileGrid::new(4, 4).offset(0.5),
            ];
            let mut passes: Vec<Pass> = self.enabled(DENSE_TILE_PASSES).copied().collect();
            if combined.len() < 55 {
                passes.push(SPARSE_DENSE_PASS);
            }
            let mut dense_raw = quick_raw;
            for pass in &passes {
                dense_raw.extend(self.scan_tiles(&mut page, &dense_grids, pass)?);
            }
            tile = dedup_boxes(dense_raw);
        }

        let combined = dedup_boxes(
            full.iter()
                .chain(tile.iter())
                .chain(vertical.iter())
                .cloned(),
        );
        let table = scan_design_table(
            &page.image,
            &combined,
            self.detector,
            self.language,
            self.vocabulary,
            page.work_dir,
        )?;

        Ok(summarize(full, tile, vertical, table, combined))
    }

    /// Quarter-turned passes, keeping only boxes that read as vertical runs
    /// on the upright page.
    fn scan_vertical(&self, page: &mut PageScan<'_>) -> Result<Vec<WordBox>, ScanError> {
        let mut raw = Vec::new();
        for pass in self.enabled(VERTICAL_PASSES) {
            for rotation in ROTATIONS {
                raw.extend(self.scan_rotated(page, rotation, pass)?);
            }
        }
        if raw.len() < MIN_VERTICAL_BOXES {
            for pass in VERTICAL_FALLBACK_PASSES {
                for rotation in ROTATIONS {
                    raw.extend(self.scan_rotated(page, rotation, pass)?);
                }
            }
        }
        Ok(dedup_boxes(raw))
    }

    fn scan_rotated(
        &self,
        page: &mut PageScan<'_>,
        rotation: Rotation,
        pass: &Pass,
    ) -> Result<Vec<WordBox>, ScanError> {
        let (width, height) = page.image.dimensions();
        let path = match page.rotated.get(&rotation) {
            Some(path) => path.clone(),
            None => {
                let rotated = raster::rotate_ccw(&page.image, rotation);
                let name = format!("rot_{}.png", rotation.degrees());
                let path = raster::save_png(&rotated, page.work_dir, &name)?;
                page.rotated.insert(rotation, path.clone());
                path
            }
        };

        Ok(self
            .detect(&path, pass)?
            .iter()
            .map(|b| map_rotated_box(b, rotation, width as i32, height as i32))
            .filter(is_vertical_run)
            .collect())
    }

    /// Scan every distinct tile of `grids`, offsetting boxes into page space.
    fn scan_tiles(
        &self,
        page: &mut PageScan<'_>,
        grids: &[TileGrid],
        pass: &Pass,
    ) -> Result<Vec<WordBox>, ScanError> {
        let (width, height) = page.image.dimensions();
        let mut boxes = Vec::new();
        for tile in merge_tile_grids(grids, width, height) {
            let path = match page.tiles.get(&tile) {
                Some(path) => path.clone(),
                None => {
                    let name = format!("tile_{:02}.png", page.tiles.len() + 1);
                    let path = raster::save_png(&raster::crop(&page.image, &tile), page.work_dir, &name)?;
                    page.tiles.insert(tile, path.clone());
                    path
                }
            };
            boxes.extend(
                self.detect(&path, pass)?
                    .iter()
                    .map(|b| b.offset(tile.left as i32, tile.top as i32)),
            );
        }
        Ok(boxes)
    }
}

fn summarize(
    full: Vec<WordBox>,
    tile: Vec<WordBox>,
    vertical: Vec<WordBox>,
    table: Vec<WordBox>,
    combined: Vec<WordBox>,
) -> Coverage {
    let table_words = table.len();
    let combined = if table.is_empty() {
        combined
    } else {
        dedup_boxes(combined.into_iter().chain(table))
    };
    Coverage {
        full_words: full.len(),
        tile_words: tile.len(),
        combined_words: combined.len(),
        vertical_words: vertical.len(),
        table_words,
        gain_ratio: Coverage::gain_ratio_for(full.len(), tile.len()),
        boxes: combined,
    }
}
