use clap::{Parser, Subcommand};
use lead_stitch::imaging::{self, OutputFormat, RustTypeBackend};
use lead_stitch::{config, output, process};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "lead-stitch")]
#[command(about = "Stack a captioned banner on top of photos")]
#[command(long_about = "\
Stack a captioned banner on top of photos

Every input gets a crimson band above it, as tall as twice the caption's
ascent, with the caption in white. The font size is the one whose rendered
caption is closest to a third of the image width. The photo itself is
copied unchanged below the band.

  photos/dawn.jpg  →  photos/dawn-lead.jpg

Settings are read from lead-stitch.toml in the working directory.
Run 'lead-stitch gen-config' to generate a documented config file.

Set RUST_LOG=debug to see font lookup and size search details.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./lead-stitch.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stitch a banner onto one or more images
    Stitch(StitchArgs),
    /// Print the banner layout for an image without writing anything
    Measure {
        input: PathBuf,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which font file the configured family resolves to
    Fonts,
    /// Print a stock lead-stitch.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct StitchArgs {
    /// Images to stitch
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (single input only)
    #[arg(short, long, conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Directory for `<name>-lead.<ext>` files (default: next to each input)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Output format: jpeg, png, webp or tiff
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Caption text, overriding the config file
    #[arg(long)]
    caption: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Stitch(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(caption) = args.caption {
                config.caption.text = caption;
                config.validate()?;
            }
            let (backend, resolved) = RustTypeBackend::discover(&config.font_source())?;
            let style = config.banner_style_for(&resolved);

            let target = match (args.output, args.out_dir) {
                (Some(file), _) => process::OutputTarget::File(file),
                (None, Some(dir)) => process::OutputTarget::Directory(dir),
                (None, None) => process::OutputTarget::Beside,
            };
            let encode = process::EncodeSettings {
                format: args.format,
                fallback_format: config.output.format,
                quality: config.output.quality,
            };
            let jobs = process::plan_jobs(&args.inputs, &target, &encode)?;

            init_thread_pool(&config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let summary =
                process::process_with_backend(&backend, &style, &jobs, encode.quality, Some(tx));
            if printer.join().is_err() {
                log::error!("progress printer stopped early");
            }
            output::print_summary(&summary);

            if summary.failed > 0 {
                std::process::exit(1);
            }
        }
        Command::Measure { input, json } => {
            let config = load_config(cli.config.as_deref())?;
            let (backend, resolved) = RustTypeBackend::discover(&config.font_source())?;
            let original = imaging::load_image(&input)?;
            let plan = imaging::plan_banner(
                &backend,
                &config.banner_style_for(&resolved),
                original.width(),
                original.height(),
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output::print_measure_output(&input, &plan);
            }
        }
        Command::Fonts => {
            let config = load_config(cli.config.as_deref())?;
            let source = config.font_source();
            let resolved = imaging::fonts::resolve_font_file(&source)?;
            // Parse it so an unreadable file fails here rather than at stitch time
            RustTypeBackend::from_path(&resolved.path)?;
            output::print_font_output(&source.family, &resolved);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Explicit `--config` file, else `lead-stitch.toml` in the working directory.
fn load_config(path: Option<&Path>) -> Result<config::StitchConfig, config::ConfigError> {
    match path {
        Some(file) => config::load_config_file(file),
        None => config::load_config(Path::new(".")),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
