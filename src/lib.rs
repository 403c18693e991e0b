//! # Lead Stitch
//!
//! Turns a photo into a "lead" image: a crimson banner carrying a one-line
//! white caption, stacked above the untouched original.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │           CAPTION            │  banner: 2 × caption ascent
//! ├──────────────────────────────┤
//! │                              │
//! │        original photo        │  copied pixel for pixel
//! │                              │
//! └──────────────────────────────┘
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Font size search, banner geometry, compositing, font lookup, raster IO |
//! | [`process`] | Batch jobs: output naming, conflict checks, parallel stitching |
//! | [`config`] | `lead-stitch.toml` loading, layering over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Metrics Behind a Trait
//!
//! Everything that depends on a real font (advance widths, ascent, glyph
//! rasterization) sits behind [`imaging::TextBackend`]. The size search and
//! the geometry are pure functions over the numbers the backend returns, so
//! the whole layout can be tested with a fake backend whose widths are
//! simple arithmetic. The production backend is [`imaging::RustTypeBackend`].
//!
//! ## Size Search
//!
//! Captions are sampled at every point size from 1 to 499. Widths are kept
//! in an ordered map (first size wins on a tie) and the target, a third of
//! the image width, is binary searched among them. An exact hit uses that
//! width; otherwise the search steps one past the insertion point, so the
//! chosen caption is usually a little wider than the target. When nothing is
//! found every layout quantity falls back to `1`.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and encoding use the `image` crate and glyphs are rendered with
//! `rusttype`. No system graphics library is needed; the only thing read
//! from the host is a font file.
//!
//! ## Atomic Output
//!
//! Each result is encoded to a temporary file next to its destination and
//! renamed into place, so a failed encode never leaves a truncated image.

pub mod config;
pub mod imaging;
pub mod output;
pub mod process;

#[cfg(test)]
pub(crate) mod test_helpers;
