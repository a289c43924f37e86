//! Review image: the page render with every coverage box outlined.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageError, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use ocrsweep::models::WordBox;

const OUTLINE: Rgb<u8> = Rgb([255, 217, 0]);
const OUTLINE_WIDTH: i32 = 2;

/// `<output dir>/<output stem>_ocr_review/`.
pub fn review_dir(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let parent = output.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{}_ocr_review", stem))
}

/// Outline `boxes` on `render` and save `page_NNN.png` beside `output`.
pub fn write_review_image(
    render: &Path,
    boxes: &[WordBox],
    output: &Path,
    page: u32,
) -> Result<PathBuf, ImageError> {
    let dir = review_dir(output);
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("page_{:03}.png", page));

    let mut canvas = image::open(render)?.to_rgb8();
    for b in boxes {
        // inclusive corners, stroke grows inwards
        for inset in 0..OUTLINE_WIDTH {
            let width = b.width + 1 - 2 * inset;
            let height = b.height + 1 - 2 * inset;
            if width <= 0 || height <= 0 {
                break;
            }
            let rect = Rect::at(b.left + inset, b.top + inset).of_size(width as u32, height as u32);
            draw_hollow_rect_mut(&mut canvas, rect, OUTLINE);
        }
    }
    canvas.save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use tempfile::TempDir;

    #[test]
    fn test_review_dir() {
        assert_eq!(
            review_dir(Path::new("/out/plan_searchable.pdf")),
            PathBuf::from("/out/plan_searchable_ocr_review")
        );
    }

    #[test]
    fn test_write_review_image() {
        let dir = TempDir::new().unwrap();
        let render = dir.path().join("render.png");
        GrayImage::from_pixel(60, 40, Luma([255])).save(&render).unwrap();

        let output = dir.path().join("result.pdf");
        let boxes = vec![WordBox::new(10, 10, 20, 8, "TAG", 90.0)];
        let path = write_review_image(&render, &boxes, &output, 7).unwrap();

        assert_eq!(path, dir.path().join("result_ocr_review").join("page_007.png"));
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(*img.get_pixel(10, 10), OUTLINE);
        assert_eq!(*img.get_pixel(11, 11), OUTLINE);
        assert_eq!(*img.get_pixel(30, 18), OUTLINE);
        assert_eq!(*img.get_pixel(20, 14), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(50, 30), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_write_review_image_missing_render() {
        let dir = TempDir::new().unwrap();
        let result = write_review_image(&dir.path().join("nope.png"), &[], &dir.path().join("o.pdf"), 1);
        assert!(result.is_err());
    }
}
