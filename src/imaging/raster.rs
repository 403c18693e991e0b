//! Raster IO: decode an image file into RGB pixels, encode RGB pixels to disk.
//!
//! | Format | Decode | Encode |
//! |---|---|---|
//! | JPEG | `image` | `JpegEncoder` with quality |
//! | PNG | `image` | `PngEncoder` |
//! | WebP | `image` | `WebPEncoder` (lossless only) |
//! | TIFF | `image` | `TiffEncoder` |
//!
//! Saving is atomic: the encoder writes into a temp file next to the target,
//! which is renamed over the target only once encoding succeeded. A failed
//! encode leaves the destination untouched.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageReader, ImageResult, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("Failed to encode {path}: {reason}")]
    Encode { path: String, reason: String },
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Encodings `save_image` can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
    Tiff,
}

impl OutputFormat {
    /// Parse a format name or file extension, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self, RasterError> {
        match name.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            "tif" | "tiff" => Ok(Self::Tiff),
            other => Err(RasterError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Format implied by a path's extension, if it names one we encode.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| Self::from_name(e).ok())
    }

    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
        };
        f.write_str(name)
    }
}

/// Load and decode an image, converting it to 8-bit RGB.
///
/// The format is sniffed from the file contents, so a misnamed extension
/// still decodes.
pub fn load_image(path: &Path) -> Result<RgbImage, RasterError> {
    let decode_error = |reason: String| RasterError::Decode {
        path: path.display().to_string(),
        reason,
    };
    let img = ImageReader::open(path)
        .map_err(|e| decode_error(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?
        .decode()
        .map_err(|e| decode_error(e.to_string()))?;
    Ok(img.to_rgb8())
}

/// Encode `img` as `format` and atomically write it to `path`.
///
/// `quality` (1-100) only applies to JPEG. Any failure, including a missing
/// or read-only destination directory, is an [`RasterError::Encode`] and
/// leaves an existing file at `path` untouched.
pub fn save_image(
    img: &RgbImage,
    path: &Path,
    format: OutputFormat,
    quality: u8,
) -> Result<(), RasterError> {
    let encode_error = |reason: String| RasterError::Encode {
        path: path.display().to_string(),
        reason,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| encode_error(e.to_string()))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let encoded = match format {
            OutputFormat::Jpeg => encode(
                JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100)),
                img,
            ),
            OutputFormat::Png => encode(PngEncoder::new(&mut writer), img),
            OutputFormat::Webp => encode(WebPEncoder::new_lossless(&mut writer), img),
            OutputFormat::Tiff => encode(TiffEncoder::new(&mut writer), img),
        };
        encoded.map_err(|e| encode_error(e.to_string()))?;
        writer.flush().map_err(|e| encode_error(e.to_string()))?;
    }

    tmp.persist(path).map_err(|e| encode_error(e.error.to_string()))?;
    Ok(())
}

fn encode(encoder: impl ImageEncoder, img: &RgbImage) -> ImageResult<()> {
    encoder.write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
}
