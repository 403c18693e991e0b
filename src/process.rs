//! Batch stitching.
//!
//! Turns a list of input files into lead images. Every file is an independent
//! job: decode, [`stitch`](crate::imaging::stitch), encode. Jobs run in
//! parallel on the rayon pool and never share mutable state; the text
//! backend is borrowed immutably by all of them.
//!
//! ## Output Naming
//!
//! ```text
//! photos/dawn.jpg            → photos/dawn-lead.jpg        (default)
//! photos/dawn.jpg --out-dir out/ → out/dawn-lead.jpg
//! photos/dawn.jpg -o cover.png   → cover.png               (single input only)
//! ```
//!
//! ## Events
//!
//! Progress is reported as [`ProcessEvent`]s over an optional channel so the
//! CLI can print while workers are still running. A failing file produces a
//! `Failed` event and does not stop the rest of the batch.

use crate::imaging::{
    BannerPlan, BannerStyle, OutputFormat, RasterError, TextBackend, composite, load_image,
    plan_banner, save_image,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Suffix appended to the input stem when deriving an output name.
pub const LEAD_SUFFIX: &str = "-lead";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Raster(#[from] RasterError),
    #[error("Output conflict: {0}")]
    OutputConflict(String),
}

/// Where stitched files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// `<stem>-lead.<ext>` next to each input.
    Beside,
    /// `<stem>-lead.<ext>` inside this directory.
    Directory(PathBuf),
    /// This exact file. Only valid for a single input.
    File(PathBuf),
}

/// One input → output pairing, with the encoding to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
}

/// Encoding settings shared by every job in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    /// Overrides the extension-derived format when set.
    pub format: Option<OutputFormat>,
    /// Used when neither `format` nor the output extension decides.
    pub fallback_format: OutputFormat,
    pub quality: u8,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            format: None,
            fallback_format: OutputFormat::Jpeg,
            quality: 90,
        }
    }
}

/// Progress of a batch, one event per finished job.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Stitched {
        source: PathBuf,
        output: PathBuf,
        plan: BannerPlan,
    },
    Failed {
        source: PathBuf,
        error: String,
    },
}

/// Counts of a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub stitched: usize,
    pub failed: usize,
}

impl std::fmt::Display for ProcessSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} stitched, {} failed", self.stitched, self.failed)
    }
}

/// Derive `<stem>-lead.<ext>` for `source` inside `dir`.
pub fn lead_file_name(source: &Path, dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    dir.join(format!("{stem}{LEAD_SUFFIX}.{}", format.extension()))
}

/// `path` with its directory resolved, so `./dawn.jpg` and `dawn.jpg`
/// compare equal. Paths whose directory does not exist yet stay as given.
fn comparable_path(path: &Path) -> PathBuf {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (std::fs::canonicalize(dir), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Pair every input with its output path and format.
///
/// Fails before any work starts when the target cannot be honoured: several
/// inputs into one file, an output that would overwrite an input, or two
/// inputs mapping to the same output.
pub fn plan_jobs(
    inputs: &[PathBuf],
    target: &OutputTarget,
    encode: &EncodeSettings,
) -> Result<Vec<StitchJob>, ProcessError> {
    if matches!(target, OutputTarget::File(_)) && inputs.len() != 1 {
        return Err(ProcessError::OutputConflict(format!(
            "an explicit output file takes exactly one input, got {}",
            inputs.len()
        )));
    }

    let sources: Vec<PathBuf> = inputs.iter().map(|p| comparable_path(p)).collect();
    let mut seen: Vec<PathBuf> = Vec::with_capacity(inputs.len());
    let mut jobs: Vec<StitchJob> = Vec::with_capacity(inputs.len());
    for source in inputs {
        let (output, format) = match target {
            OutputTarget::File(path) => {
                let format = encode
                    .format
                    .or_else(|| OutputFormat::from_path(path))
                    .unwrap_or(encode.fallback_format);
                (path.clone(), format)
            }
            OutputTarget::Directory(dir) => {
                let format = encode.format.unwrap_or(encode.fallback_format);
                (lead_file_name(source, dir, format), format)
            }
            OutputTarget::Beside => {
                let format = encode.format.unwrap_or(encode.fallback_format);
                let dir = source.parent().unwrap_or(Path::new(""));
                (lead_file_name(source, dir, format), format)
            }
        };

        let key = comparable_path(&output);
        if sources.contains(&key) {
            return Err(ProcessError::OutputConflict(format!(
                "{} would overwrite an input",
                output.display()
            )));
        }
        if let Some(i) = seen.iter().position(|k| *k == key) {
            let other = &jobs[i];
            return Err(ProcessError::OutputConflict(format!(
                "{} and {} both map to {}",
                other.source.display(),
                source.display(),
                output.display()
            )));
        }
        seen.push(key);
        jobs.push(StitchJob {
            source: source.clone(),
            output,
            format,
        });
    }
    Ok(jobs)
}

/// Decode, stitch and encode a single job.
pub fn run_job(
    backend: &impl TextBackend,
    style: &BannerStyle,
    job: &StitchJob,
    quality: u8,
) -> Result<BannerPlan, ProcessError> {
    let original = load_image(&job.source)?;
    let plan = plan_banner(backend, style, original.width(), original.height());
    let stitched = composite(backend, style, &plan, &original);
    if let Some(parent) = job.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    save_image(&stitched, &job.output, job.format, quality)?;
    Ok(plan)
}

/// Run all jobs in parallel, reporting each result on `events`.
pub fn process_with_backend(
    backend: &impl TextBackend,
    style: &BannerStyle,
    jobs: &[StitchJob],
    quality: u8,
    events: Option<Sender<ProcessEvent>>,
) -> ProcessSummary {
    let outcomes: Vec<bool> = jobs
        .par_iter()
        .map(|job| {
            let event = match run_job(backend, style, job, quality) {
                Ok(plan) => ProcessEvent::Stitched {
                    source: job.source.clone(),
                    output: job.output.clone(),
                    plan,
                },
                Err(e) => {
                    log::warn!("{}: {e}", job.source.display());
                    ProcessEvent::Failed {
                        source: job.source.clone(),
                        error: e.to_string(),
                    }
                }
            };
            let ok = matches!(event, ProcessEvent::Stitched { .. });
            if let Some(tx) = &events {
                // The receiver only goes away if the printer thread died;
                // the summary still reports the outcome.
                tx.send(event).ok();
            }
            ok
        })
        .collect();

    let stitched = outcomes.iter().filter(|ok| **ok).count();
    ProcessSummary {
        stitched,
        failed: outcomes.len() - stitched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{gradient_image, write_test_png};
    use tempfile::TempDir;

    // =========================================================================
    // plan_jobs tests
    // =========================================================================

    #[test]
    fn lead_name_replaces_extension() {
        assert_eq!(
            lead_file_name(Path::new("photos/dawn.jpeg"), Path::new("out"), OutputFormat::Png),
            PathBuf::from("out/dawn-lead.png")
        );
    }

    #[test]
    fn plan_beside_inputs() {
        let inputs = vec![PathBuf::from("a/dawn.png"), PathBuf::from("b/dusk.tif")];
        let jobs = plan_jobs(&inputs, &OutputTarget::Beside, &EncodeSettings::default()).unwrap();
        assert_eq!(jobs[0].output, PathBuf::from("a/dawn-lead.jpg"));
        assert_eq!(jobs[1].output, PathBuf::from("b/dusk-lead.jpg"));
        assert!(jobs.iter().all(|j| j.format == OutputFormat::Jpeg));
    }

    #[test]
    fn plan_into_directory_with_format_override() {
        let inputs = vec![PathBuf::from("dawn.jpg")];
        let encode = EncodeSettings {
            format: Some(OutputFormat::Webp),
            ..Default::default()
        };
        let jobs = plan_jobs(&inputs, &OutputTarget::Directory("out".into()), &encode).unwrap();
        assert_eq!(jobs[0].output, PathBuf::from("out/dawn-lead.webp"));
        assert_eq!(jobs[0].format, OutputFormat::Webp);
    }

    #[test]
    fn plan_explicit_file_infers_format() {
        let inputs = vec![PathBuf::from("dawn.jpg")];
        let jobs = plan_jobs(
            &inputs,
            &OutputTarget::File("cover.png".into()),
            &EncodeSettings::default(),
        )
        .unwrap();
        assert_eq!(jobs[0].output, PathBuf::from("cover.png"));
        assert_eq!(jobs[0].format, OutputFormat::Png);
    }

    #[test]
    fn plan_explicit_file_without_extension_uses_fallback() {
        let inputs = vec![PathBuf::from("dawn.jpg")];
        let encode = EncodeSettings {
            fallback_format: OutputFormat::Tiff,
            ..Default::default()
        };
        let jobs = plan_jobs(&inputs, &OutputTarget::File("cover".into()), &encode).unwrap();
        assert_eq!(jobs[0].format, OutputFormat::Tiff);
    }

    #[test]
    fn plan_explicit_file_rejects_many_inputs() {
        let inputs = vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")];
        let result = plan_jobs(
            &inputs,
            &OutputTarget::File("cover.jpg".into()),
            &EncodeSettings::default(),
        );
        assert!(matches!(result, Err(ProcessError::OutputConflict(_))));
    }

    #[test]
    fn plan_rejects_overwriting_input() {
        let inputs = vec![PathBuf::from("dawn.jpg")];
        let result = plan_jobs(
            &inputs,
            &OutputTarget::File("dawn.jpg".into()),
            &EncodeSettings::default(),
        );
        assert!(matches!(result, Err(ProcessError::OutputConflict(_))));
    }

    #[test]
    fn plan_rejects_overwriting_input_through_parent_path() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        let source = tmp.path().join("dawn.jpg");
        let spelled_differently = tmp.path().join("sub/../dawn.jpg");
        let result = plan_jobs(
            &[source],
            &OutputTarget::File(spelled_differently),
            &EncodeSettings::default(),
        );
        assert!(matches!(result, Err(ProcessError::OutputConflict(_))));
    }

    #[test]
    fn plan_rejects_out_dir_output_that_is_an_input() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        let lead = tmp.path().join("dawn-lead.jpg");
        let source = tmp.path().join("dawn.jpg");
        // dawn.jpg -> <tmp>/sub/../dawn-lead.jpg, which is the first input
        let result = plan_jobs(
            &[lead, source],
            &OutputTarget::Directory(tmp.path().join("sub/..")),
            &EncodeSettings::default(),
        );
        assert!(matches!(result, Err(ProcessError::OutputConflict(_))));
    }

    #[test]
    fn plan_relative_and_dotted_spellings_collide() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().display().to_string();
        let inputs = vec![PathBuf::from("dawn.jpg")];
        let plain = comparable_path(Path::new("dawn.jpg"));
        assert_eq!(plain, comparable_path(Path::new("./dawn.jpg")));
        assert_eq!(
            comparable_path(&PathBuf::from(format!("{dir}/x/../a.jpg"))),
            PathBuf::from(format!("{dir}/x/../a.jpg")),
            "missing directories are compared as written"
        );
        let result = plan_jobs(
            &inputs,
            &OutputTarget::File("./dawn.jpg".into()),
            &EncodeSettings::default(),
        );
        assert!(matches!(result, Err(ProcessError::OutputConflict(_))));
    }

    #[test]
    fn plan_rejects_colliding_outputs() {
        let inputs = vec![PathBuf::from("a/dawn.jpg"), PathBuf::from("b/dawn.png")];
        let result = plan_jobs(
            &inputs,
            &OutputTarget::Directory("out".into()),
            &EncodeSettings::default(),
        );
        assert!(matches!(result, Err(ProcessError::OutputConflict(_))));
    }

    // =========================================================================
    // run_job / process_with_backend tests
    // =========================================================================

    #[test]
    fn run_job_writes_stitched_image() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("photo.png");
        write_test_png(&source, 300, 200);

        let job = StitchJob {
            source: source.clone(),
            output: tmp.path().join("nested/out/photo-lead.png"),
            format: OutputFormat::Png,
        };
        let backend = MockBackend::new();
        let plan = run_job(&backend, &BannerStyle::default(), &job, 90).unwrap();

        let written = load_image(&job.output).unwrap();
        assert_eq!(written.dimensions(), (300, 236));
        assert_eq!(plan.geometry.output_height, 236);
        // Photo region survives the lossless roundtrip byte for byte
        let original = gradient_image(300, 200);
        assert_eq!(written.get_pixel(17, 36 + 41), original.get_pixel(17, 41));
    }

    #[test]
    fn run_job_missing_source_errors() {
        let tmp = TempDir::new().unwrap();
        let job = StitchJob {
            source: tmp.path().join("missing.jpg"),
            output: tmp.path().join("missing-lead.jpg"),
            format: OutputFormat::Jpeg,
        };
        let result = run_job(&MockBackend::new(), &BannerStyle::default(), &job, 90);
        assert!(matches!(result, Err(ProcessError::Raster(RasterError::Decode { .. }))));
        assert!(!job.output.exists());
    }

    #[test]
    fn process_reports_every_job() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.png");
        let bad = tmp.path().join("bad.png");
        write_test_png(&good, 90, 60);
        std::fs::write(&bad, b"not a png").unwrap();

        let inputs = vec![good.clone(), bad.clone()];
        let encode = EncodeSettings {
            format: Some(OutputFormat::Png),
            ..Default::default()
        };
        let jobs = plan_jobs(&inputs, &OutputTarget::Beside, &encode).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let summary = process_with_backend(
            &MockBackend::new(),
            &BannerStyle::default(),
            &jobs,
            90,
            Some(tx),
        );
        assert_eq!(summary, ProcessSummary { stitched: 1, failed: 1 });
        assert_eq!(summary.to_string(), "1 stitched, 1 failed");

        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::Stitched { source, .. } if *source == good
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::Failed { source, .. } if *source == bad
        )));
        assert!(tmp.path().join("good-lead.png").exists());
        assert!(!tmp.path().join("bad-lead.png").exists());
    }

    #[test]
    fn process_without_events() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("photo.png");
        write_test_png(&source, 30, 30);
        let jobs = plan_jobs(
            &[source],
            &OutputTarget::Directory(tmp.path().join("out")),
            &EncodeSettings::default(),
        )
        .unwrap();

        let summary =
            process_with_backend(&MockBackend::new(), &BannerStyle::default(), &jobs, 80, None);
        assert_eq!(summary.stitched, 1);
        assert!(tmp.path().join("out/photo-lead.jpg").exists());
    }
}
