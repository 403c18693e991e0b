//! Parameter types for banner operations.
//!
//! These structs describe *what* to draw, not *how*. They sit between the
//! high-level [`operations`](super::operations) module (which decides the
//! banner layout) and the [`backend`](super::backend) (which measures and
//! rasterizes text). Keeping them plain data lets tests swap in a mock backend
//! without touching layout logic.
//!
//! ## Types
//!
//! - [`FontSpec`]: family, style and point size. Size is clamped to ≥ 1.
//! - [`BannerStyle`]: the fixed constants of a banner: caption, family,
//!   colors, fallback value and the font-size search range.
//! - [`BannerGeometry`]: pixel layout derived for one stitch call.
//! - [`BannerPlan`]: the chosen font plus its geometry.

use image::Rgb;
use serde::Serialize;
use std::ops::Range;

/// Family used when nothing else is configured.
pub const DEFAULT_FONT_FAMILY: &str = "Open Sans";

/// Caption drawn by default.
pub const DEFAULT_CAPTION: &str = "CAPTION";

/// Banner background, `#BA131A`.
pub const ACCENT_COLOR: u32 = 0xBA131A;

/// Value substituted for the font size, caption x offset and ascent whenever
/// they cannot be resolved.
pub const FALLBACK_VALUE: u32 = 1;

/// Convert a packed `0xRRGGBB` value into an RGB pixel.
pub fn rgb_from_hex(value: u32) -> Rgb<u8> {
    Rgb([
        ((value >> 16) & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        (value & 0xFF) as u8,
    ])
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Plain,
}

/// A font family at a given point size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontSpec {
    pub family: String,
    pub style: FontStyle,
    pub size: u32,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: u32) -> Self {
        Self {
            family: family.into(),
            style: FontStyle::Plain,
            size: size.max(1),
        }
    }
}

/// Constants that shape every banner.
///
/// [`Default`] yields the production values; tests substitute their own.
#[derive(Debug, Clone, PartialEq)]
pub struct BannerStyle {
    pub caption: String,
    pub font_family: String,
    pub accent: Rgb<u8>,
    pub caption_color: Rgb<u8>,
    pub fallback: u32,
    /// Candidate point sizes, scanned in order.
    pub font_sizes: Range<u32>,
}

impl BannerStyle {
    pub fn font(&self, size: u32) -> FontSpec {
        FontSpec::new(self.font_family.clone(), size)
    }
}

impl Default for BannerStyle {
    fn default() -> Self {
        Self {
            caption: DEFAULT_CAPTION.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            accent: rgb_from_hex(ACCENT_COLOR),
            caption_color: Rgb([255, 255, 255]),
            fallback: FALLBACK_VALUE,
            font_sizes: 1..500,
        }
    }
}

/// Pixel layout of one stitched image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BannerGeometry {
    pub banner_height: u32,
    /// Caption baseline origin. `baseline_x` is the rendered width of the
    /// chosen size reused as an offset, not a centering computation.
    pub baseline_x: u32,
    pub baseline_y: u32,
    pub output_width: u32,
    pub output_height: u32,
}

/// Everything decided before a single pixel is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerPlan {
    pub font: FontSpec,
    pub caption_ascent: u32,
    /// `false` when the size search resolved nothing and fallbacks were used.
    pub searched: bool,
    pub geometry: BannerGeometry,
}
