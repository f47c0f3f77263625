//! board-locator CLI: locate a checkerboard in one color image / point cloud pair.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use board_locator::core::{FrameHeader, OrganizedCloud};
use board_locator::{BoardLocator, LocateError, LocatorParams, ParamsError};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "board-locator")]
#[command(about = "Estimate the 6-DoF pose of a checkerboard from a color image and an aligned organized point cloud")]
#[command(version)]
struct Cli {
    /// Color image (any format the `image` crate decodes).
    #[arg(long)]
    image: PathBuf,

    /// Organized point cloud (JSON: width, height, row-major points, null = no depth).
    #[arg(long)]
    cloud: PathBuf,

    /// Locator parameters (JSON). Missing fields take their defaults.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Frame id of the camera / cloud pair.
    #[arg(long, default_value = "camera_rgb_optical_frame")]
    frame_id: String,

    /// Write the board points, mapped into the board frame, to this file (JSON).
    #[arg(long)]
    points_out: Option<PathBuf>,

    /// Write the per-stage frame report to this file (JSON).
    #[arg(long)]
    report: Option<PathBuf>,

    /// Level for locator output; other crates stay at warn or below.
    /// `RUST_LOG` takes precedence in tracing builds.
    #[arg(long, value_enum, default_value_t = LogLevelArg::Warn)]
    log_level: LogLevelArg,

    /// Emit tracing spans as JSON lines.
    #[cfg(feature = "tracing")]
    #[arg(long)]
    json_log: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Off => LevelFilter::Off,
            LogLevelArg::Error => LevelFilter::Error,
            LogLevelArg::Warn => LevelFilter::Warn,
            LogLevelArg::Info => LevelFilter::Info,
            LogLevelArg::Debug => LevelFilter::Debug,
            LogLevelArg::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid parameters: {0}")]
    Params(#[from] ParamsError),
    #[error(transparent)]
    Locate(#[from] LocateError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Locate(err)) if err.is_no_solution() => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) {
    board_locator::core::init_tracing(cli.json_log, cli.log_level.into());
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) {
    let _ = board_locator::core::init_with_level(cli.log_level.into());
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let mut params: LocatorParams = match &cli.params {
        Some(path) => read_json(path)?,
        None => LocatorParams::default(),
    };
    if cli.points_out.is_some() {
        params.emit_points = true;
    }
    let locator = BoardLocator::new(params)?;

    info!("loading image {}", cli.image.display());
    let image = image::open(&cli.image)?.to_rgb8();
    info!("loading cloud {}", cli.cloud.display());
    let cloud: OrganizedCloud = read_json(&cli.cloud)?;
    info!(
        "{}x{} frame, {} points with depth",
        image.width(),
        image.height(),
        cloud.valid_count()
    );

    let header = FrameHeader::now(cli.frame_id.clone());
    let (result, report) = locator.locate_detailed(&header, &image, &cloud);
    if let Some(path) = &cli.report {
        write_json(path, &report)?;
        info!("frame report written to {}", path.display());
    }

    let pose = result?;
    if let (Some(path), Some(points)) = (&cli.points_out, &pose.points) {
        write_json(path, points)?;
        info!("{} board points written to {}", points.points.len(), path.display());
    }

    println!("{}", serde_json::to_string_pretty(&pose)?);
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}
