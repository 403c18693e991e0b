//! Configuration module.
//!
//! Handles loading, validating, and merging `lead-stitch.toml`. Stock
//! defaults are overridden by the user file, which only needs the keys it
//! wants to change.
//!
//! ## Config File Location
//!
//! `lead-stitch.toml` in the working directory, or any file passed with
//! `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [caption]
//! text = "CAPTION"          # Single line, drawn in white on the banner
//!
//! [font]
//! family = "Open Sans"      # Family looked up in the font directories
//! # path = "/usr/share/fonts/truetype/open-sans/OpenSans-Regular.ttf"
//! search_dirs = []          # Empty = platform font directories
//!
//! [output]
//! format = "jpeg"           # jpeg | png | webp | tiff
//! quality = 90              # JPEG quality (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! The banner color and placement are fixed and deliberately not part of
//! the file. Unknown keys are rejected to catch typos early.

use crate::imaging::{BannerStyle, FontSource, OutputFormat, ResolvedFont};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in a directory by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "lead-stitch.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `lead-stitch.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StitchConfig {
    pub caption: CaptionConfig,
    pub font: FontConfig,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
}

impl StitchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.caption.text.trim().is_empty() {
            return Err(ConfigError::Validation("caption.text must not be empty".into()));
        }
        if self.caption.text.contains('\n') {
            return Err(ConfigError::Validation("caption.text must be a single line".into()));
        }
        if self.font.family.trim().is_empty() && self.font.path.is_none() {
            return Err(ConfigError::Validation(
                "font.family must not be empty unless font.path is set".into(),
            ));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation("output.quality must be 1-100".into()));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Banner constants with the configured caption and family.
    pub fn banner_style(&self) -> BannerStyle {
        BannerStyle {
            caption: self.caption.text.clone(),
            font_family: self.font.family.clone(),
            ..BannerStyle::default()
        }
    }

    /// Like [`banner_style`](Self::banner_style), but names the face that was
    /// actually loaded when the configured family had to be substituted.
    pub fn banner_style_for(&self, font: &ResolvedFont) -> BannerStyle {
        let mut style = self.banner_style();
        if font.substituted {
            style.font_family = font.face_name();
        }
        style
    }

    /// Where the text backend should look for its font.
    pub fn font_source(&self) -> FontSource {
        FontSource {
            family: self.font.family.clone(),
            path: self.font.path.clone(),
            search_dirs: self.font.search_dirs.clone(),
        }
    }
}

/// Caption settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    pub text: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            text: crate::imaging::DEFAULT_CAPTION.to_string(),
        }
    }
}

/// Font lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontConfig {
    pub family: String,
    /// Explicit font file; bypasses the family lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub search_dirs: Vec<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: crate::imaging::DEFAULT_FONT_FAMILY.to_string(),
            path: None,
            search_dirs: Vec::new(),
        }
    }
}

/// Encoding settings for stitched images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Used when the output path has no recognized extension.
    pub format: OutputFormat,
    /// JPEG quality (1-100).
    pub quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 90,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel stitch workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer that user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(StitchConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load `lead-stitch.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    load_raw_config_file(&config_path).map(Some)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<StitchConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: StitchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `lead-stitch.toml` in `dir`, or stock defaults if absent.
pub fn load_config(dir: &Path) -> Result<StitchConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Load config from an explicit file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<StitchConfig, ConfigError> {
    resolve_config(stock_defaults_value(), Some(load_raw_config_file(path)?))
}

/// Returns a fully-commented stock `lead-stitch.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# lead-stitch Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Caption
# ---------------------------------------------------------------------------
[caption]
# Text drawn on the banner. A single line; the font size is chosen so the
# text spans about a third of the image width.
text = "CAPTION"

# ---------------------------------------------------------------------------
# Font
# ---------------------------------------------------------------------------
[font]
# Family name, matched against font file names (OpenSans-Regular.ttf).
# When it is not installed a common sans family is substituted.
family = "Open Sans"

# Explicit font file. Takes precedence over the family lookup.
# path = "/usr/share/fonts/truetype/open-sans/OpenSans-Regular.ttf"

# Directories to search for the family. Empty = platform font directories.
search_dirs = []

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Encoding used when the output file name has no recognized extension.
# One of: jpeg, png, webp (lossless), tiff.
format = "jpeg"

# JPEG quality (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel stitch workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = StitchConfig::default();
        assert_eq!(config.caption.text, "CAPTION");
        assert_eq!(config.font.family, "Open Sans");
        assert_eq!(config.font.path, None);
        assert!(config.font.search_dirs.is_empty());
        assert_eq!(config.output.format, OutputFormat::Jpeg);
        assert_eq!(config.output.quality, 90);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[caption]
text = "LEAD"
"#;
        let config: StitchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.caption.text, "LEAD");
        // Default values preserved
        assert_eq!(config.font.family, "Open Sans");
        assert_eq!(config.output.quality, 90);
    }

    #[test]
    fn parse_output_and_font() {
        let toml = r#"
[font]
family = "DejaVu Sans"
path = "/fonts/DejaVuSans.ttf"
search_dirs = ["/opt/fonts"]

[output]
format = "png"
quality = 75
"#;
        let config: StitchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.font.family, "DejaVu Sans");
        assert_eq!(config.font.path, Some(PathBuf::from("/fonts/DejaVuSans.ttf")));
        assert_eq!(config.font.search_dirs, vec![PathBuf::from("/opt/fonts")]);
        assert_eq!(config.output.format, OutputFormat::Png);
        assert_eq!(config.output.quality, 75);
    }

    #[test]
    fn banner_style_carries_caption_and_family() {
        let mut config = StitchConfig::default();
        config.caption.text = "LEAD".into();
        config.font.family = "Noto Sans".into();

        let style = config.banner_style();
        assert_eq!(style.caption, "LEAD");
        assert_eq!(style.font_family, "Noto Sans");
        // Fixed constants untouched
        assert_eq!(style.accent, BannerStyle::default().accent);
        assert_eq!(style.font_sizes, 1..500);
    }

    #[test]
    fn banner_style_names_substituted_face() {
        let config = StitchConfig::default();
        let substituted = ResolvedFont {
            path: PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
            substituted: true,
        };
        assert_eq!(config.banner_style_for(&substituted).font_family, "DejaVuSans");

        let installed = ResolvedFont {
            path: PathBuf::from("/usr/share/fonts/truetype/open-sans/OpenSans-Regular.ttf"),
            substituted: false,
        };
        assert_eq!(config.banner_style_for(&installed).font_family, "Open Sans");
    }

    #[test]
    fn font_source_from_config() {
        let mut config = StitchConfig::default();
        config.font.path = Some("/fonts/a.ttf".into());
        let source = config.font_source();
        assert_eq!(source.family, "Open Sans");
        assert_eq!(source.path, Some(PathBuf::from("/fonts/a.ttf")));
    }

    // =========================================================================
    // validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(StitchConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_empty_caption() {
        let mut config = StitchConfig::default();
        config.caption.text = "   ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_multiline_caption() {
        let mut config = StitchConfig::default();
        config.caption.text = "TWO\nLINES".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_empty_family_needs_path() {
        let mut config = StitchConfig::default();
        config.font.family = String::new();
        assert!(config.validate().is_err());

        config.font.path = Some("/fonts/a.ttf".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = StitchConfig::default();
        config.output.quality = 0;
        assert!(config.validate().is_err());
        config.output.quality = 101;
        assert!(config.validate().is_err());
        config.output.quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_zero_processes() {
        let mut config = StitchConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // effective_threads tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    // =========================================================================
    // merge / load tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_nested_tables() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[output]\nquality = 70").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["output"]["quality"].as_integer(), Some(70));
        assert_eq!(merged["output"]["format"].as_str(), Some("jpeg"));
        assert_eq!(merged["caption"]["text"].as_str(), Some("CAPTION"));
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value();
        let table = value.as_table().unwrap();
        for section in ["caption", "font", "output", "processing"] {
            assert!(table.contains_key(section), "missing [{section}]");
        }
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.caption.text, "CAPTION");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[caption]\ntext = \"NEWS\"\n[processing]\nmax_processes = 2\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.caption.text, "NEWS");
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.font.family, "Open Sans");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "[caption\ntext = ").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "[output]\nquality = 0\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_config_file_requires_file() {
        assert!(matches!(
            load_config_file(Path::new("/nonexistent/lead-stitch.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[caption]\ntext = \"A\"\ncolor = \"#ff0000\"\n").unwrap();
        assert!(matches!(load_config_file(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_section_rejected() {
        let toml = "[banner]\nheight = 40\n";
        let result: Result<StitchConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_output_format_rejected() {
        let toml = "[output]\nformat = \"gif\"\n";
        let result: Result<StitchConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: StitchConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = StitchConfig::default();
        assert_eq!(config.caption.text, defaults.caption.text);
        assert_eq!(config.font.family, defaults.font.family);
        assert_eq!(config.output.format, defaults.output.format);
        assert_eq!(config.output.quality, defaults.output.quality);
        assert_eq!(config.processing.max_processes, None);
    }
}
