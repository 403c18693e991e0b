//! Banner compositing in pure Rust, with no system font-rendering library.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` → RGB8 |
//! | **Measure / ascent** | `rusttype` layout + vertical metrics |
//! | **Font size search** | [`SizeSamples`] over sizes 1..500, binary search |
//! | **Composite** | `image::imageops::replace` + thresholded glyph coverage |
//! | **Encode** | `image` codecs, atomic temp-file rename |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for the size search and geometry (unit testable)
//! - **Parameters**: Data structures describing a banner
//! - **Backend**: [`TextBackend`] trait + [`RustTypeBackend`]
//! - **Fonts**: Locating a font file for a family name
//! - **Operations**: High-level functions combining calculations + backend
//! - **Raster**: Loading and saving image files

pub mod backend;
mod calculations;
pub mod fonts;
pub mod operations;
mod params;
pub mod raster;
pub mod rust_backend;

pub use backend::{FontError, TextBackend};
pub use calculations::{
    SizeChoice, SizeSamples, calculate_banner_geometry, choose_font_size, resolve_sample_index,
    target_caption_width,
};
pub use fonts::{FontSource, ResolvedFont};
pub use operations::{composite, plan_banner, stitch};
pub use params::{
    ACCENT_COLOR, BannerGeometry, BannerPlan, BannerStyle, DEFAULT_CAPTION, DEFAULT_FONT_FAMILY,
    FALLBACK_VALUE, FontSpec, FontStyle, rgb_from_hex,
};
pub use raster::{OutputFormat, RasterError, load_image, save_image};
pub use rust_backend::RustTypeBackend;
