//! Command-line interface

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::clean::ProcessingMode;
use crate::config::{CliOverrides, LevelRange};

#[derive(Debug, Parser)]
#[command(
    name = "linetrace",
    version,
    about = "Batch-convert raster line art into cleaned, print-ready SVG/PNG/PDF",
    long_about = "Cleans images (auto-level, classify, posterize, threshold), traces them \
                  to SVG with potrace, and exports print-ready PNG and PDF with inkscape."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean, trace, and export every image in the workspace
    Process(ProcessArgs),
    /// Report external tool availability and config file locations
    Info,
}

/// On/off toggle for flags that mirror the pipeline's historical CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Toggle {
    On,
    #[default]
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        matches!(self, Toggle::On)
    }
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Workspace root; input/, cleaned/, svg/, png/, pdf/ live underneath
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Force reprocessing of all files regardless of staleness
    #[arg(short, long)]
    pub overwrite: bool,

    /// Trace mode: "color" posterizes gradients, "bw" thresholds directly,
    /// "auto" measures saturation per image [default: auto]
    #[arg(long, value_enum)]
    pub mode: Option<ProcessingMode>,

    /// Invert polarity; use "on" for white lines on a black background
    /// [default: off]
    #[arg(long, value_enum)]
    pub invert: Option<Toggle>,

    /// Brightness cutoff percentage for binarization (0-100)
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Palette size for the color path (>= 2)
    #[arg(long)]
    pub posterize_colors: Option<u32>,

    /// Level-adjustment percentiles, e.g. "0,80" or "0%,80%"
    #[arg(long, value_parser = LevelRange::parse)]
    pub levels: Option<LevelRange>,

    /// Target pixel width for exported PNGs
    #[arg(long)]
    pub export_width: Option<u32>,

    /// Tracer curve-simplification tolerance
    #[arg(long)]
    pub tolerance: Option<f32>,

    /// Tracer speckle suppression in pixels
    #[arg(long)]
    pub turd_size: Option<u32>,

    /// Read configuration from this file instead of the default locations
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the execution plan without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Increase output detail (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress per-file output
    #[arg(short, long)]
    pub quiet: bool,
}

impl ProcessArgs {
    /// Collect the flags the user actually set. Every flag is optional, so
    /// an explicit `--mode auto` or `--invert off` overrides the config
    /// file just like any other value.
    pub fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides::new();
        overrides.threshold_percent = self.threshold;
        overrides.posterize_colors = self.posterize_colors;
        overrides.levels = self.levels;
        overrides.export_width = self.export_width;
        overrides.opt_tolerance = self.tolerance;
        overrides.turd_size = self.turd_size;
        overrides.mode = self.mode;
        overrides.invert = self.invert.map(Toggle::is_on);
        if self.overwrite {
            overrides.overwrite = Some(true);
        }
        overrides
    }
}
