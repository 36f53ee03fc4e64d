//! color-reducer CLI
//!
//! Reduces an image to a small palette and optionally writes an outline mask.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::error;

use color_reducer::pipeline::{self, ReduceReport};
use color_reducer::{
    OutlineWindow, ReducerError, ReducerSettings, SamplerKind, ShortfallPolicy, Weighting,
};

/// Reduce an image to its most representative colors.
#[derive(Parser, Debug)]
#[command(name = "color-reducer")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
EXAMPLES:
    color-reducer --input photo.jpg                          24-color reduced.png
    color-reducer --input photo.jpg --colors 8 --outline     Also write outline.png
    color-reducer --input photo.jpg --sampler popularity     Most frequent colors
    color-reducer --input photo.jpg --settings run.json      Load settings from JSON")]
struct Args {
    /// Number of colors to reduce to
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    colors: Option<u32>,

    /// Input image (.jpg, .png, ...)
    #[arg(short, long, value_name = "INPUT")]
    input: PathBuf,

    /// Filename of the reduced image (png)
    #[arg(long, value_name = "PATH", default_value = "reduced.png")]
    reduced_output: PathBuf,

    /// Filename of the outline image (png)
    #[arg(long, value_name = "PATH", default_value = "outline.png")]
    outline_output: PathBuf,

    /// Also produce the outline image
    #[arg(long)]
    outline: bool,

    /// Palette selection strategy
    #[arg(long, value_enum)]
    sampler: Option<SamplerArg>,

    /// How repeated colors are weighted by the contrast sampler
    #[arg(long, value_enum)]
    weighting: Option<WeightingArg>,

    /// Outline neighborhood
    #[arg(long, value_enum)]
    window: Option<WindowArg>,

    /// Fail instead of shrinking the palette when the image has too few colors
    #[arg(long)]
    strict: bool,

    /// Process on a single thread
    #[arg(long)]
    serial: bool,

    /// JSON settings file; explicit flags override its values
    #[arg(long, value_name = "JSON")]
    settings: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Show palette details
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SamplerArg {
    /// Far from the average tone first
    Contrast,
    /// Most frequent first
    Popularity,
}

impl From<SamplerArg> for SamplerKind {
    fn from(arg: SamplerArg) -> Self {
        match arg {
            SamplerArg::Contrast => SamplerKind::Contrast,
            SamplerArg::Popularity => SamplerKind::Popularity,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WeightingArg {
    /// Each distinct color counts once
    Presence,
    /// Each pixel counts
    Frequency,
}

impl From<WeightingArg> for Weighting {
    fn from(arg: WeightingArg) -> Self {
        match arg {
            WeightingArg::Presence => Weighting::Presence,
            WeightingArg::Frequency => Weighting::Frequency,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WindowArg {
    /// 3x3 neighborhood
    Full,
    /// Up-left neighborhood of earlier releases
    Legacy,
}

impl From<WindowArg> for OutlineWindow {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Full => OutlineWindow::Full,
            WindowArg::Legacy => OutlineWindow::Legacy,
        }
    }
}

fn build_settings(args: &Args) -> Result<ReducerSettings> {
    let mut settings = match &args.settings {
        Some(path) => ReducerSettings::from_json_file(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?,
        None => ReducerSettings::default(),
    };

    if let Some(colors) = args.colors {
        settings.colors = colors as usize;
    }
    if let Some(kind) = args.sampler {
        settings.sampler.kind = kind.into();
    }
    if let Some(weighting) = args.weighting {
        settings.sampler.weighting = weighting.into();
    }
    if let Some(window) = args.window {
        settings.outline.window = window.into();
    }
    if args.outline {
        settings.outline.enabled = true;
    }
    if args.strict {
        settings.sampler.shortfall = ShortfallPolicy::Fail;
    }
    if args.serial {
        settings.parallel = false;
    }

    settings.validate()?;
    Ok(settings)
}

fn init_logging(args: &Args) {
    let level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(args: &Args) -> Result<ReduceReport> {
    let settings = build_settings(args)?;
    let report = pipeline::process_image(
        &args.input,
        &args.reduced_output,
        &args.outline_output,
        &settings,
    )?;
    Ok(report)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(&args) {
        Ok(report) => {
            if args.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize report: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else if !args.quiet {
                println!(
                    "Done! {} colors -> {}",
                    report.palette.len(),
                    report.reduced_output.display()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<ReducerError>() {
                Some(err) if args.json => {
                    let body = serde_json::json!({ "error": err });
                    println!("{}", body);
                }
                _ => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::parse_from(["color-reducer", "--input", "photo.jpg"]);
        assert_eq!(args.reduced_output, PathBuf::from("reduced.png"));
        assert_eq!(args.outline_output, PathBuf::from("outline.png"));
        let settings = build_settings(&args).unwrap();
        assert_eq!(settings.colors, 24);
        assert!(!settings.outline.enabled);
        assert!(settings.parallel);
    }

    #[test]
    fn test_cli_flags_override() {
        let args = Args::parse_from([
            "color-reducer",
            "--input",
            "photo.jpg",
            "--colors",
            "6",
            "--outline",
            "--sampler",
            "popularity",
            "--window",
            "legacy",
            "--strict",
            "--serial",
        ]);
        let settings = build_settings(&args).unwrap();
        assert_eq!(settings.colors, 6);
        assert!(settings.outline.enabled);
        assert_eq!(settings.sampler.kind, SamplerKind::Popularity);
        assert_eq!(settings.outline.window, OutlineWindow::Legacy);
        assert_eq!(settings.sampler.shortfall, ShortfallPolicy::Fail);
        assert!(!settings.parallel);
    }

    #[test]
    fn test_zero_colors_rejected_by_parser() {
        let parsed = Args::try_parse_from(["color-reducer", "--input", "a.jpg", "--colors", "0"]);
        assert!(parsed.is_err());
    }
}
