//! Pure calculation functions for banner layout.
//!
//! Nothing here touches a font or a pixel: measurements come in through a
//! closure, so the search and the geometry are unit testable with synthetic
//! widths.

use super::params::BannerGeometry;
use std::collections::BTreeMap;
use std::ops::Range;

/// Rendered caption widths mapped to the font size that produced them.
///
/// Built by scanning the size range in order. When two sizes render to the
/// same width the first one scanned is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeSamples {
    by_width: BTreeMap<u32, u32>,
}

impl SizeSamples {
    /// Measure every size in `sizes` and record `width → size`.
    pub fn collect(sizes: Range<u32>, mut measure: impl FnMut(u32) -> u32) -> Self {
        let mut by_width = BTreeMap::new();
        for size in sizes {
            by_width.entry(measure(size)).or_insert(size);
        }
        Self { by_width }
    }

    pub fn len(&self) -> usize {
        self.by_width.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_width.is_empty()
    }

    /// Distinct widths in ascending order.
    pub fn widths(&self) -> Vec<u32> {
        self.by_width.keys().copied().collect()
    }

    pub fn size_for(&self, width: u32) -> Option<u32> {
        self.by_width.get(&width).copied()
    }

    /// Resolve `target` to a `(width, size)` sample.
    ///
    /// See [`resolve_sample_index`] for which index a miss lands on. Returns
    /// `None` when that index falls past the last width.
    pub fn resolve(&self, target: u32) -> Option<SizeChoice> {
        let widths = self.widths();
        let index = resolve_sample_index(&widths, target);
        let width = *widths.get(index)?;
        let size = self.size_for(width)?;
        Some(SizeChoice {
            font_size: size,
            anchor_x: width,
        })
    }
}

/// A font size and the rendered width it was picked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeChoice {
    pub font_size: u32,
    /// Rendered width, reused verbatim as the caption x offset.
    pub anchor_x: u32,
}

/// Caption width to aim for: a third of the image width, integer division.
pub fn target_caption_width(image_width: u32) -> u32 {
    image_width / 3
}

/// Index of `target` in ascending `widths`, with the miss convention kept.
///
/// A hit returns its own index. A miss at insertion point `p` is encoded as
/// `-(p) - 1` and its absolute value taken, which lands on `p + 1`: one past
/// the first width larger than the target, not the nearer neighbour.
///
/// # Examples
/// ```
/// # use lead_stitch::imaging::resolve_sample_index;
/// let widths = [4, 8, 12, 16];
/// assert_eq!(resolve_sample_index(&widths, 8), 1);
/// // 9 would insert at 2; the result is 3
/// assert_eq!(resolve_sample_index(&widths, 9), 3);
/// ```
pub fn resolve_sample_index(widths: &[u32], target: u32) -> usize {
    match widths.binary_search(&target) {
        Ok(index) => index,
        Err(insertion) => insertion + 1,
    }
}

/// Scan `sizes` and pick the size whose width matches a third of the image.
///
/// Returns `None` for a zero-width image (search skipped) and when the search
/// resolves nothing; callers fall back to their default size and offset.
pub fn choose_font_size(
    image_width: u32,
    sizes: Range<u32>,
    measure: impl FnMut(u32) -> u32,
) -> Option<SizeChoice> {
    if image_width == 0 {
        return None;
    }
    let samples = SizeSamples::collect(sizes, measure);
    samples.resolve(target_caption_width(image_width))
}

/// Derive banner layout from the caption ascent.
///
/// The band is twice the ascent tall; the baseline sits at 1.25 × ascent,
/// leaving a little less room above the caption than below it.
pub fn calculate_banner_geometry(
    caption_ascent: u32,
    baseline_x: u32,
    original: (u32, u32),
) -> BannerGeometry {
    let (width, height) = original;
    let banner_height = caption_ascent * 2;
    BannerGeometry {
        banner_height,
        baseline_x,
        baseline_y: (caption_ascent as f64 * 1.25).round() as u32,
        output_width: width,
        output_height: banner_height + height,
    }
}
