//! Font file discovery.
//!
//! Resolves a family name to a TrueType/OpenType file on disk. There is no
//! fontconfig involved: candidate files are found by walking the platform font
//! directories and matched by file name, which is how nearly every
//! distribution names its fonts (`OpenSans-Regular.ttf`, `DejaVuSans.ttf`).
//!
//! Resolution order:
//!
//! 1. An explicit path, when configured.
//! 2. A file whose name matches the requested family (regular weight).
//! 3. The first match among [`SUBSTITUTE_FAMILIES`].
//! 4. Any regular-weight font file found, in path order.
//!
//! Steps 3 and 4 are a substitution, logged at `warn` and reported through
//! [`ResolvedFont::substituted`], never an error.

use super::backend::FontError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Families tried, in order, when the requested one is not installed.
pub const SUBSTITUTE_FAMILIES: &[&str] = &[
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Arial",
    "Helvetica",
    "FreeSans",
];

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

/// Name fragments that mark a non-regular face.
const STYLE_MARKERS: &[&str] = &[
    "bold", "italic", "oblique", "light", "thin", "medium", "black", "heavy", "condensed",
    "narrow", "mono", "semi", "extra",
];

/// Where to look for a font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSource {
    pub family: String,
    pub path: Option<PathBuf>,
    /// Directories to walk. Empty means [`default_font_dirs`].
    pub search_dirs: Vec<PathBuf>,
}

/// A font file picked for a family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFont {
    pub path: PathBuf,
    /// `true` when the file does not belong to the requested family.
    pub substituted: bool,
}

impl ResolvedFont {
    /// Face name taken from the file stem, e.g. `DejaVuSans`.
    pub fn face_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Platform font directories that exist on this machine.
pub fn default_font_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = [
        "/usr/share/fonts",
        "/usr/local/share/fonts",
        "/Library/Fonts",
        "/System/Library/Fonts",
        "C:\\Windows\\Fonts",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();

    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join(".fonts"));
        dirs.push(home.join("Library/Fonts"));
    }

    dirs.into_iter().filter(|d| d.is_dir()).collect()
}

/// Lowercase a family or file name and drop everything but letters and digits.
///
/// `"Open Sans"`, `"open-sans"` and `"OpenSans"` all become `"opensans"`.
pub fn normalize_family(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FONT_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)))
}

fn normalized_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(normalize_family)
        .unwrap_or_default()
}

fn is_regular_face(rest: &str) -> bool {
    !STYLE_MARKERS.iter().any(|m| rest.contains(m))
}

/// Collect font files under `dirs`, sorted by path.
pub fn scan_font_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = dirs
        .iter()
        .flat_map(|dir| WalkDir::new(dir).follow_links(true).into_iter())
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_font_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files.dedup();
    files
}

/// Find the regular face of `family` among `files`.
///
/// An exact stem (`OpenSans.ttf`) or `-Regular` stem wins over a longer name
/// that merely starts with the family (`OpenSans[wdth,wght].ttf`).
pub fn match_family<'a>(files: &'a [PathBuf], family: &str) -> Option<&'a PathBuf> {
    let wanted = normalize_family(family);
    if wanted.is_empty() {
        return None;
    }
    let regular = format!("{wanted}regular");

    files
        .iter()
        .find(|f| {
            let stem = normalized_stem(f);
            stem == wanted || stem == regular
        })
        .or_else(|| {
            files.iter().find(|f| {
                normalized_stem(f)
                    .strip_prefix(&wanted)
                    .is_some_and(is_regular_face)
            })
        })
}

/// Pick a font file for `family` out of `files`, substituting when needed.
pub fn pick_font_file(files: &[PathBuf], family: &str) -> Option<ResolvedFont> {
    if let Some(path) = match_family(files, family) {
        return Some(ResolvedFont {
            path: path.clone(),
            substituted: false,
        });
    }

    SUBSTITUTE_FAMILIES
        .iter()
        .find_map(|substitute| match_family(files, substitute))
        .or_else(|| files.iter().find(|f| is_regular_face(&normalized_stem(f))))
        .or_else(|| files.first())
        .map(|path| ResolvedFont {
            path: path.clone(),
            substituted: true,
        })
}

/// Resolve a [`FontSource`] to a file on disk.
pub fn resolve_font_file(source: &FontSource) -> Result<ResolvedFont, FontError> {
    if let Some(path) = &source.path {
        if !path.is_file() {
            return Err(FontError::NotFound(format!(
                "{} ({})",
                source.family,
                path.display()
            )));
        }
        return Ok(ResolvedFont {
            path: path.clone(),
            substituted: false,
        });
    }

    let dirs = if source.search_dirs.is_empty() {
        default_font_dirs()
    } else {
        source.search_dirs.clone()
    };
    let files = scan_font_files(&dirs);
    log::debug!("found {} font files in {} directories", files.len(), dirs.len());

    let resolved = pick_font_file(&files, &source.family)
        .ok_or_else(|| FontError::NotFound(source.family.clone()))?;
    if resolved.substituted {
        log::warn!(
            "font family '{}' not installed, substituting {}",
            source.family,
            resolved.path.display()
        );
    }
    Ok(resolved)
}
