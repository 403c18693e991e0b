//! Text backend trait and shared error types.
//!
//! The [`TextBackend`] trait defines the three things the compositor needs
//! from a font engine: measure a string, report the ascent, and rasterize a
//! string onto a canvas.
//!
//! The production implementation is
//! [`RustTypeBackend`](super::rust_backend::RustTypeBackend), pure Rust on
//! top of `rusttype`. Tests use the recording `MockBackend` below.

use super::params::FontSpec;
use image::{Rgb, RgbImage};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No usable font found for family '{0}'")]
    NotFound(String),
    #[error("Failed to parse font file {0}")]
    Invalid(PathBuf),
}

/// Trait for text measurement and rendering backends.
///
/// Implementations must be deterministic: the same font and text always
/// measure the same. Any layout scratch state lives only for the duration of
/// one call, so a backend is safe to share across threads.
pub trait TextBackend: Sync {
    /// Horizontal pixel extent of `text` rendered in `font`.
    fn measure_width(&self, font: &FontSpec, text: &str) -> u32;

    /// Ascent of `font` in pixels, or `None` when it cannot be resolved.
    fn ascent(&self, font: &FontSpec) -> Option<u32>;

    /// Rasterize `text` with its baseline starting at `baseline`, painting
    /// glyph pixels in `color` and leaving every other pixel as it was.
    /// Glyphs are clipped to the canvas.
    fn draw_text(
        &self,
        canvas: &mut RgbImage,
        font: &FontSpec,
        text: &str,
        baseline: (i32, i32),
        color: Rgb<u8>,
    );
}
