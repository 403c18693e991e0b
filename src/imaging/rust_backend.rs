//! Pure Rust text backend on top of `rusttype`.
//!
//! Everything is statically linked into the binary; the only runtime input is
//! the font file itself.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Parse TTF/OTF | `rusttype::Font::try_from_vec` |
//! | Measure width | `Font::layout` (advances + kerning) |
//! | Ascent | `Font::v_metrics` |
//! | Rasterize | `PositionedGlyph::draw` coverage, thresholded to a solid mask |
//! | Locate font file | [`fonts`](super::fonts) (`walkdir` over font dirs) |
//!
//! Glyphs are not anti-aliased: a pixel is either painted in the caption color
//! or left alone, so a banner only ever holds its two colors.
//!
//! Point sizes follow em semantics: at size `n` the font's em square is `n`
//! pixels tall. `rusttype::Scale` instead measures ascent-to-descent, so every
//! size goes through [`RustTypeBackend::scale`].

use super::backend::{FontError, TextBackend};
use super::fonts::{FontSource, ResolvedFont, resolve_font_file};
use super::params::FontSpec;
use image::{Rgb, RgbImage};
use rusttype::{Font, Scale, point};
use std::path::{Path, PathBuf};

/// Minimum glyph coverage for a pixel to be painted.
const COVERAGE_THRESHOLD: f32 = 0.5;

/// Text backend backed by a single parsed font file.
///
/// The parsed font is immutable; every measure or draw call lays out glyphs
/// into its own scratch state and drops it on return.
pub struct RustTypeBackend {
    font: Font<'static>,
    source: PathBuf,
    /// Font-unit height of the line box divided by units per em.
    line_to_em: f32,
}

impl RustTypeBackend {
    /// Parse a font from raw TTF/OTF bytes. `origin` is only used in errors.
    pub fn from_bytes(bytes: Vec<u8>, origin: &Path) -> Result<Self, FontError> {
        let font =
            Font::try_from_vec(bytes).ok_or_else(|| FontError::Invalid(origin.to_path_buf()))?;

        let units_per_em = font.units_per_em();
        let v_metrics = font.v_metrics_unscaled();
        let line = v_metrics.ascent - v_metrics.descent;
        if units_per_em == 0 || line <= 0.0 {
            return Err(FontError::Invalid(origin.to_path_buf()));
        }

        Ok(Self {
            font,
            source: origin.to_path_buf(),
            line_to_em: line / units_per_em as f32,
        })
    }

    /// Load and parse a font file.
    pub fn from_path(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes, path)
    }

    /// Locate a font for `source` and load it.
    pub fn discover(source: &FontSource) -> Result<(Self, ResolvedFont), FontError> {
        let resolved = resolve_font_file(source)?;
        log::debug!("loading font {}", resolved.path.display());
        let backend = Self::from_path(&resolved.path)?;
        Ok((backend, resolved))
    }

    /// File the font was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// `rusttype` scale that makes the em square `size` pixels tall.
    pub fn scale(&self, size: u32) -> Scale {
        Scale::uniform(size as f32 * self.line_to_em)
    }
}

impl TextBackend for RustTypeBackend {
    fn measure_width(&self, font: &FontSpec, text: &str) -> u32 {
        let scale = self.scale(font.size);
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
            .map_or(0, |width| width.round().max(0.0) as u32)
    }

    fn ascent(&self, font: &FontSpec) -> Option<u32> {
        let ascent = self.font.v_metrics(self.scale(font.size)).ascent.round();
        (ascent >= 1.0).then_some(ascent as u32)
    }

    fn draw_text(
        &self,
        canvas: &mut RgbImage,
        font: &FontSpec,
        text: &str,
        baseline: (i32, i32),
        color: Rgb<u8>,
    ) {
        let scale = self.scale(font.size);
        let origin = point(baseline.0 as f32, baseline.1 as f32);
        let (width, height) = (canvas.width() as i32, canvas.height() as i32);

        for glyph in self.font.layout(text, scale, origin) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let x = gx as i32 + bb.min.x;
                let y = gy as i32 + bb.min.y;
                if x < 0 || y < 0 || x >= width || y >= height || !is_inked(coverage) {
                    return;
                }
                canvas.put_pixel(x as u32, y as u32, color);
            });
        }
    }
}

fn is_inked(coverage: f32) -> bool {
    coverage >= COVERAGE_THRESHOLD
}
