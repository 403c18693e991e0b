//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Stitch
//!
//! ```text
//! photos/dawn.jpg → photos/dawn-lead.jpg
//!     Font: Open Sans 24pt (ascent 18px)
//!     Banner: 36px, caption at (100, 23)
//!     Size: 300x236
//! photos/broken.jpg
//!     Failed: Failed to decode photos/broken.jpg: ...
//!
//! 1 stitched, 1 failed
//! ```
//!
//! ## Measure
//!
//! Same block as a stitched file, without the arrow and output path. When the
//! size search resolved nothing the font line says `(fallback)`.
//!
//! ## Fonts
//!
//! ```text
//! Open Sans → /usr/share/fonts/truetype/open-sans/OpenSans-Regular.ttf
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::imaging::{BannerPlan, ResolvedFont};
use crate::process::{ProcessEvent, ProcessSummary};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Indented detail lines describing a plan.
fn plan_lines(plan: &BannerPlan) -> Vec<String> {
    let fallback = if plan.searched { "" } else { " (fallback)" };
    let g = &plan.geometry;
    vec![
        format!(
            "{}Font: {} {}pt{} (ascent {}px)",
            indent(1),
            plan.font.family,
            plan.font.size,
            fallback,
            plan.caption_ascent
        ),
        format!(
            "{}Banner: {}px, caption at ({}, {})",
            indent(1),
            g.banner_height,
            g.baseline_x,
            g.baseline_y
        ),
        format!("{}Size: {}x{}", indent(1), g.output_width, g.output_height),
    ]
}

/// Format one batch event.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Stitched {
            source,
            output,
            plan,
        } => {
            let mut lines = vec![format!("{} → {}", source.display(), output.display())];
            lines.extend(plan_lines(plan));
            lines
        }
        ProcessEvent::Failed { source, error } => vec![
            source.display().to_string(),
            format!("{}Failed: {}", indent(1), error),
        ],
    }
}

/// Format the closing summary line of a batch.
pub fn format_summary(summary: &ProcessSummary) -> Vec<String> {
    vec![String::new(), summary.to_string()]
}

/// Format a plan computed without writing anything.
pub fn format_measure_output(source: &Path, plan: &BannerPlan) -> Vec<String> {
    let mut lines = vec![source.display().to_string()];
    lines.extend(plan_lines(plan));
    lines
}

/// Format which file a font family resolved to.
pub fn format_font_output(family: &str, font: &ResolvedFont) -> Vec<String> {
    let mut lines = vec![format!("{} → {}", family, font.path.display())];
    if font.substituted {
        lines.push(format!("{}Substituted: '{}' is not installed", indent(1), family));
    }
    lines
}

pub fn print_summary(summary: &ProcessSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

pub fn print_measure_output(source: &Path, plan: &BannerPlan) {
    for line in format_measure_output(source, plan) {
        println!("{}", line);
    }
}

pub fn print_font_output(family: &str, font: &ResolvedFont) {
    for line in format_font_output(family, font) {
        println!("{}", line);
    }
}
