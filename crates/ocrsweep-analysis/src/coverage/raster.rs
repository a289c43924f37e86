//! Raster helpers for the coverage scan.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageError};

use ocrsweep::geometry::{Rotation, Tile};

/// Load a rendered page as 8-bit grayscale.
pub fn load_gray(path: &Path) -> Result<GrayImage, ImageError> {
    Ok(image::open(path)?.to_luma8())
}

/// Rotate counter-clockwise by `rotation`, growing the canvas.
pub fn rotate_ccw(image: &GrayImage, rotation: Rotation) -> GrayImage {
    match rotation {
        Rotation::Ccw90 => imageops::rotate270(image),
        Rotation::Ccw270 => imageops::rotate90(image),
    }
}

pub fn crop(image: &GrayImage, tile: &Tile) -> GrayImage {
    imageops::crop_imm(image, tile.left, tile.top, tile.width(), tile.height()).to_image()
}

pub fn resize(image: &GrayImage, width: u32, height: u32) -> GrayImage {
    imageops::resize(image, width, height, FilterType::CatmullRom)
}

/// Write `image` as `<dir>/<name>` and return the path.
pub fn save_png(image: &GrayImage, dir: &Path, name: &str) -> Result<PathBuf, ImageError> {
    let path = dir.join(name);
    image.save(&path)?;
    Ok(path)
}
