//! Shared test utilities for the lead-stitch test suite.
//!
//! Provides deterministic raster fixtures so tests can compare pixels
//! before and after stitching without shipping binary files.
//!
//! # Usage
//!
//! ```rust
//! use crate::imaging::load_image;
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("photo.png");
//! write_test_png(&path, 300, 200);
//! assert_eq!(load_image(&path).unwrap(), gradient_image(300, 200));
//! ```

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use std::path::Path;

/// A width × height image where every pixel depends on its position.
///
/// No pixel equals the banner accent or pure white, so stray banner pixels
/// in the photo region always show up as a mismatch.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 200) as u8, (y % 200) as u8, ((x + y) % 97) as u8 + 100])
    })
}

/// Write [`gradient_image`] as a PNG file.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    let img = gradient_image(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
}

#[test]
fn gradient_avoids_banner_colors() {
    let accent = crate::imaging::rgb_from_hex(crate::imaging::ACCENT_COLOR);
    let white = Rgb([255, 255, 255]);
    assert!(
        gradient_image(400, 300)
            .pixels()
            .all(|p| *p != accent && *p != white)
    );
}
