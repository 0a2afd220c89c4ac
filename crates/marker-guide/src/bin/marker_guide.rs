//! marker-guide CLI: replay recorded detections through the guidance loop.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use marker_guide::feedback::announcement;
use marker_guide::pose::SpokenDistance;
use marker_guide::{
    run_loop, FrameReport, GuideConfig, LogSink, ReplaySource, RunSummary, StopSignal,
};
use serde::Serialize;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "marker-guide")]
#[command(about = "Audio guidance toward a fiducial marker")]
#[command(version)]
struct Cli {
    /// Log level for stderr output (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded detections through pose, smoothing and feedback.
    Run(RunArgs),

    /// Print the spoken phrases for a distance (inches) and orientation.
    Phrase {
        #[arg(long)]
        distance: u32,

        /// Smoothed orientation angle in degrees.
        #[arg(long, allow_hyphen_values = true)]
        orientation: Option<i32>,
    },

    /// Write the default configuration as JSON.
    InitConfig {
        /// Output path; prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// JSON config. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON array of frames, each an array of {"id", "corners"} detections.
    #[arg(long)]
    frames: PathBuf,

    /// Override the camera matrix file from the config.
    #[arg(long)]
    camera_matrix: Option<PathBuf>,

    /// Override the distortion coefficients file from the config.
    #[arg(long)]
    distortion: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Write per-frame reports (JSON) to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunOutput {
    summary: RunSummary,
    spoken: Vec<String>,
}

fn init_logging(level: LevelFilter) -> CliResult<()> {
    #[cfg(feature = "tracing")]
    {
        let _ = level;
        marker_guide::core::init_tracing(false);
        Ok(())
    }
    #[cfg(not(feature = "tracing"))]
    {
        marker_guide::core::init_with_level(level)?;
        Ok(())
    }
}

fn load_config(args: &RunArgs) -> CliResult<GuideConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = GuideConfig::load_json(path)?;
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.calibration = config.calibration.resolved(base);
            config
        }
        None => GuideConfig::default(),
    };
    if let Some(path) = &args.camera_matrix {
        config.calibration.camera_matrix_path = path.clone();
    }
    if let Some(path) = &args.distortion {
        config.calibration.distortion_path = path.clone();
    }
    Ok(config)
}

fn run_replay(args: &RunArgs) -> CliResult<()> {
    let config = load_config(args)?;
    let session = config.build_session(LogSink::new(config.audio.clone()))?;
    let source = ReplaySource::load_json(&args.frames)?;

    let mut reports: Vec<FrameReport> = Vec::new();
    let keep_reports = args.report.is_some();
    let (summary, sink) = run_loop(
        session,
        source,
        &StopSignal::new(),
        args.max_frames,
        |report| {
            if keep_reports {
                reports.push(report.clone());
            }
        },
    )?;

    if let Some(path) = &args.report {
        fs::write(path, serde_json::to_string_pretty(&reports)?)?;
    }
    let output = RunOutput {
        summary,
        spoken: sink.spoken().to_vec(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_phrase(distance: u32, orientation: Option<i32>) {
    match orientation {
        Some(orientation) => {
            for line in announcement(distance, orientation) {
                println!("{line}");
            }
        }
        None => println!("{}", SpokenDistance::from_inches(distance)),
    }
}

fn run_init_config(output: Option<&Path>) -> CliResult<()> {
    let config = GuideConfig::default();
    match output {
        Some(path) => {
            config.write_json(path)?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;

    match cli.command {
        Commands::Run(args) => run_replay(&args),
        Commands::Phrase {
            distance,
            orientation,
        } => {
            run_phrase(distance, orientation);
            Ok(())
        }
        Commands::InitConfig { output } => run_init_config(output.as_deref()),
    }
}

