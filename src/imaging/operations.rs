//! High-level banner operations.
//!
//! These functions combine the pure [`calculations`](super::calculations)
//! with a [`TextBackend`]. [`plan_banner`] decides font and layout without
//! touching pixels; [`composite`] draws a plan; [`stitch`] does both.

use super::backend::TextBackend;
use super::calculations::{calculate_banner_geometry, choose_font_size};
use super::params::{BannerPlan, BannerStyle};
use image::{RgbImage, imageops};

/// Pick the caption font and lay out the banner for an image of the given size.
///
/// Only the width drives the font choice; the height just extends the
/// output. A zero-width image, or a search that resolves nothing, falls back
/// to `style.fallback` for both the size and the caption x offset.
pub fn plan_banner(
    backend: &impl TextBackend,
    style: &BannerStyle,
    width: u32,
    height: u32,
) -> BannerPlan {
    let choice = choose_font_size(width, style.font_sizes.clone(), |size| {
        backend.measure_width(&style.font(size), &style.caption)
    });

    let (font_size, baseline_x) = match choice {
        Some(choice) => (choice.font_size, choice.anchor_x),
        None => (style.fallback, style.fallback),
    };
    let font = style.font(font_size);
    let caption_ascent = backend.ascent(&font).unwrap_or(style.fallback);
    let geometry = calculate_banner_geometry(caption_ascent, baseline_x, (width, height));

    log::debug!(
        "banner for {width}x{height}: size {} (searched: {}), ascent {caption_ascent}, \
         band {}px, caption at ({}, {})",
        font.size,
        choice.is_some(),
        geometry.banner_height,
        geometry.baseline_x,
        geometry.baseline_y,
    );

    BannerPlan {
        font,
        caption_ascent,
        searched: choice.is_some(),
        geometry,
    }
}

/// Draw `plan` into a new image: accent band on top, `original` below it.
///
/// `original` is copied unscaled; it is never modified.
pub fn composite(
    backend: &impl TextBackend,
    style: &BannerStyle,
    plan: &BannerPlan,
    original: &RgbImage,
) -> RgbImage {
    let geometry = &plan.geometry;
    let mut canvas =
        RgbImage::from_pixel(geometry.output_width, geometry.output_height, style.accent);

    imageops::replace(&mut canvas, original, 0, i64::from(geometry.banner_height));

    // Caption pixels are confined to the band rows.
    let mut band =
        imageops::crop_imm(&canvas, 0, 0, geometry.output_width, geometry.banner_height)
            .to_image();
    backend.draw_text(
        &mut band,
        &plan.font,
        &style.caption,
        (geometry.baseline_x as i32, geometry.baseline_y as i32),
        style.caption_color,
    );
    imageops::replace(&mut canvas, &band, 0, 0);

    canvas
}

/// Stack a captioned accent band on top of `original`.
///
/// Never fails: degenerate input takes the fallback path described in
/// [`plan_banner`].
pub fn stitch(backend: &impl TextBackend, style: &BannerStyle, original: &RgbImage) -> RgbImage {
    let plan = plan_banner(backend, style, original.width(), original.height());
    composite(backend, style, &plan, original)
}
