//! Shapeshatter: match-3 shape puzzle with shatter animations in the terminal.

mod app;
mod game;
mod grid;
mod input;
mod render;
mod scanner;
mod shatter;
mod surface;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Largest accepted grid side.
pub const MAX_GRID_SIZE: usize = 64;
/// Slowest accepted redraw rate; keeps the frame interval at or under one second.
pub const MIN_FRAME_RATE: f64 = 1.0;

/// Options derived from CLI that affect game behaviour (grid, timers, scoring).
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub grid_size: usize,
    pub cell_px: f64,
    pub scan_interval: Duration,
    pub shatter_duration: Duration,
    pub frame_rate: f64,
    pub seed: Option<u64>,
    pub score_policy: ScorePolicy,
    pub no_animation: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: grid::DEFAULT_GRID_SIZE,
            cell_px: 50.0,
            scan_interval: Duration::from_millis(100),
            shatter_duration: Duration::from_millis(shatter::DEFAULT_SHATTER_MS),
            frame_rate: 60.0,
            seed: None,
            score_policy: ScorePolicy::PerRun,
            no_animation: false,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid size must be between 3 and {max}, got {0}", max = MAX_GRID_SIZE)]
    GridSize(usize),
    #[error("cell size must be a positive number of pixels, got {0}")]
    CellPx(f64),
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("frame rate must be at least {min} frames per second, got {0}", min = MIN_FRAME_RATE)]
    FrameRate(f64),
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if !(3..=MAX_GRID_SIZE).contains(&args.size) {
            return Err(ConfigError::GridSize(args.size));
        }
        if !(args.cell_px.is_finite() && args.cell_px > 0.0) {
            return Err(ConfigError::CellPx(args.cell_px));
        }
        if args.scan_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("scan interval"));
        }
        if args.shatter_ms == 0 && !args.no_animation {
            return Err(ConfigError::ZeroInterval("shatter duration"));
        }
        if !(args.frame_rate.is_finite() && args.frame_rate >= MIN_FRAME_RATE) {
            return Err(ConfigError::FrameRate(args.frame_rate));
        }
        Ok(Self {
            grid_size: args.size,
            cell_px: args.cell_px,
            scan_interval: Duration::from_millis(args.scan_interval_ms),
            shatter_duration: Duration::from_millis(args.shatter_ms),
            frame_rate: args.frame_rate,
            seed: args.seed,
            score_policy: args.score_policy,
            no_animation: args.no_animation,
        })
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    let config = GameConfig::from_args(&args)?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("failed to load theme: {e}; using defaults");
        theme::Theme::default()
    });
    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// The TUI owns the terminal, so log records only ever go to a file.
fn init_logging(path: &std::path::Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Match-3 shape puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "shapeshatter",
    version,
    about = "Match-3 shape puzzle in the terminal. Swap any two shapes; runs of three or more shatter.",
    long_about = "Shapeshatter is a terminal match-3 puzzle.\n\n\
        Click a shape, then click any other shape to swap them (no adjacency needed). \
        Every run of three or more identical shapes in a row or column shatters into \
        particles; the shapes above fall into the gap and a new shape drops in at the top.\n\n\
        CONTROLS:\n  Mouse       Left click selects / swaps\n  \
        Arrows/hjkl Move cursor   Enter/Space Select cursor cell\n  \
        P           Pause         R           Restart       Q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Grid side length in cells.
    #[arg(short, long, default_value = "12", value_name = "N")]
    pub size: usize,

    /// Logical pixel size of one cell; the board surface is N×cell wide and N×cell+50 tall.
    #[arg(long, default_value = "50", value_name = "PX")]
    pub cell_px: f64,

    /// Time between match scans.
    #[arg(long, default_value = "100", value_name = "MS")]
    pub scan_interval_ms: u64,

    /// Duration of one shatter animation.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub shatter_ms: u64,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// RNG seed for a reproducible board and refills.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// How matched runs are scored.
    #[arg(long, default_value = "per-run")]
    pub score_policy: ScorePolicy,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable shatter animation (holes cascade on the next frame).
    #[arg(long)]
    pub no_animation: bool,

    /// Write log records to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ScorePolicy {
    /// Every run adds its full length; a cell in a row run and a column run counts twice.
    #[default]
    PerRun,
    /// One point per destroyed cell.
    UniqueCells,
}
