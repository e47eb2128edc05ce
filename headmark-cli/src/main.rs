//! `headmark` command line tool
//!
//! ```text
//! headmark build --data <dir> --dataset <dir> [--config build.json]
//! headmark review <dataset>
//! headmark sequence --images <dir> --labels <dir> --output <dir> [--save-steps]
//! headmark summary --images <dir> --labels <dir> <stem> [--output file.png]
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use headmark_dataset::{BlankCanvasRenderer, BuildConfig, BuildReport, DatasetBuilder};
use headmark_visualization::{DatasetNavigator, NavigatorCommand, SequenceVisualizer};
use log::LevelFilter;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert CT head landmark markup into a 2D keypoint dataset")]
struct Cli {
    /// Log debug output from headmark crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate images and annotations from markups_<patient> folders
    Build(BuildArgs),
    /// Browse a dataset: a/d image, w/s patient, z save overlay, q quit
    Review {
        dataset: PathBuf,
    },
    /// Draw keypoints one by one for every image of a folder
    Sequence {
        #[arg(long)]
        images: PathBuf,
        #[arg(long)]
        labels: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Also save a frame per keypoint
        #[arg(long)]
        save_steps: bool,
        /// Only this image stem
        #[arg(long)]
        image: Option<String>,
    },
    /// Draw all keypoints of one image
    Summary {
        #[arg(long)]
        images: PathBuf,
        #[arg(long)]
        labels: PathBuf,
        stem: String,
        /// Defaults to `<stem>_summary.png` in the current directory
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, clap::Args)]
struct BuildArgs {
    /// Directory containing markups_<patient> folders
    #[arg(long)]
    data: Option<PathBuf>,
    /// Output dataset directory
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// JSON build configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 30.0)]
    fov: f64,
    /// Normalized margin added around the keypoints
    #[arg(long)]
    padding: Option<f64>,
    /// Drop views with keypoints outside the image
    #[arg(long)]
    discard_out_of_range: bool,
    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn setup_logger(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else {
        let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
        builder.filter(None, LevelFilter::Warn);
        for module in ["headmark", "headmark_core", "headmark_io", "headmark_dataset", "headmark_visualization"] {
            builder.filter(Some(module), level);
        }
    }
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    match cli.command {
        Command::Build(args) => build(args),
        Command::Review { dataset } => review(dataset),
        Command::Sequence {
            images,
            labels,
            output,
            save_steps,
            image,
        } => {
            let visualizer = SequenceVisualizer::new(images, labels).with_output(&output);
            match image {
                Some(stem) => {
                    visualizer
                        .visualize(&stem, save_steps)
                        .with_context(|| format!("Failed to visualize {stem}"))?;
                }
                None => {
                    let done = visualizer.visualize_all(save_steps)?;
                    log::info!("Visualized {done} images into {}", output.display());
                }
            }
            Ok(())
        }
        Command::Summary {
            images,
            labels,
            stem,
            output,
        } => {
            let output = output.unwrap_or_else(|| PathBuf::from(format!("{stem}_summary.png")));
            SequenceVisualizer::new(images, labels)
                .summary(&stem, Some(&output))
                .with_context(|| format!("Failed to create summary for {stem}"))?;
            Ok(())
        }
    }
}

fn build(args: BuildArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BuildConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BuildConfig::default(),
    };
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(dataset) = args.dataset {
        config.dataset_path = dataset;
    }
    if let Some(padding) = args.padding {
        config.projector.padding = padding;
    }
    if args.discard_out_of_range {
        config.discard_out_of_range = true;
    }

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    if config.data_path.as_os_str().is_empty() || config.dataset_path.as_os_str().is_empty() {
        bail!("Both a data directory and a dataset directory are required (--data, --dataset or --config)");
    }

    let renderer = BlankCanvasRenderer::new(args.width, args.height, args.fov);
    let mut builder = DatasetBuilder::new(config, renderer);
    let report = builder
        .build()
        .with_context(|| format!("Failed to build dataset from {}", builder.config().data_path.display()))?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &BuildReport) {
    println!(
        "Studies: {}/{} completed, views: {} written, {} discarded",
        report.studies_completed, report.studies_found, report.views_written, report.views_discarded
    );
    for failure in &report.failures {
        match &failure.view {
            Some(view) => println!("  {}/{}: {}", failure.patient, view, failure.error),
            None => println!("  {}: {}", failure.patient, failure.error),
        }
    }
}

fn review(dataset: PathBuf) -> Result<()> {
    let mut navigator = DatasetNavigator::open(&dataset)
        .with_context(|| format!("Failed to open dataset {}", dataset.display()))?;
    if navigator.is_empty() {
        bail!("No patients to display in {}", dataset.display());
    }

    println!("Controls: a previous image, d next image, w previous patient, s next patient, z save, q quit");
    show_current(&navigator)?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        for key in line.chars().filter(|c| !c.is_whitespace()) {
            let Some(command) = NavigatorCommand::from_key(key) else {
                println!("Unknown command '{key}'");
                continue;
            };
            if command == NavigatorCommand::Quit {
                return Ok(());
            }
            match navigator.apply(command) {
                Ok(Some(path)) => println!("Saved: {}", path.display()),
                Ok(None) => {}
                Err(e) => println!("Error: {e}"),
            }
        }
        show_current(&navigator)?;
    }
    Ok(())
}

/// Print the current position and keypoints. An unreadable image is
/// reported and browsing continues.
fn show_current(navigator: &DatasetNavigator) -> Result<()> {
    let Some(info) = navigator.info_line() else {
        return Ok(());
    };
    println!("{info}");
    match navigator.load_current() {
        Ok(Some(annotated)) => {
            for (label, x, y) in annotated.keypoint_pixels() {
                println!("  {label}: ({x}, {y})");
            }
        }
        Ok(None) => {}
        Err(e) => println!("  Error loading image: {e}"),
    }
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}
