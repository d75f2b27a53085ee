//! Pipeline configuration
//!
//! Configuration is resolved once before any file is processed:
//! built-in defaults, then an optional TOML config file
//! (`./linetrace.toml` or `<config dir>/linetrace/config.toml`),
//! then command-line overrides on top. The merged [`PipelineConfig`]
//! is validated up front and immutable for the rest of the run.

use std::path::Path;

use serde::Deserialize;

use crate::clean::ProcessingMode;
use crate::error::ConfigError;

// ============================================================
// Defaults
// ============================================================

/// Export width in pixels. 3000 px covers an 8.5" x 11" print at ~300 DPI.
pub const DEFAULT_EXPORT_WIDTH: u32 = 3000;

/// Brightness cutoff percentage. 55-65% is a good range for line art.
pub const DEFAULT_THRESHOLD_PERCENT: u8 = 65;

/// Palette size for the color path. 8 colors produces chunky shapes that
/// threshold cleanly (comic / stained-glass styles).
pub const DEFAULT_POSTERIZE_COLORS: u32 = 8;

/// Level adjustment percentiles: pixels at or below the low percentile
/// become black, at or above the high percentile become white.
pub const DEFAULT_LEVEL_LOW: u8 = 0;
pub const DEFAULT_LEVEL_HIGH: u8 = 80;

/// Speckle suppression for the tracer: drops paths smaller than N pixels.
pub const DEFAULT_TURD_SIZE: u32 = 5;

/// Curve simplification aggressiveness for the tracer. 0.2 is the tracer
/// default; 0.4-0.5 reduces node count enough for CAD and laser cutters.
pub const DEFAULT_OPT_TOLERANCE: f32 = 0.5;

// ============================================================
// Types
// ============================================================

/// Level adjustment range, parsed from `"0,80"` or `"0%,80%"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LevelRange {
    pub low: u8,
    pub high: u8,
}

impl LevelRange {
    pub fn parse(s: &str) -> Result<Self, String> {
        let (low, high) = s
            .split_once(',')
            .ok_or_else(|| format!("expected \"low,high\", got {:?}", s))?;
        let parse_part = |part: &str| -> Result<u8, String> {
            part.trim()
                .trim_end_matches('%')
                .parse::<u8>()
                .map_err(|e| format!("invalid level percentage {:?}: {}", part, e))
        };
        Ok(Self {
            low: parse_part(low)?,
            high: parse_part(high)?,
        })
    }
}

/// Fully resolved pipeline configuration.
///
/// Immutable after [`Config::merge_with_cli`] and shared read-only by every
/// stage; no runtime reconfiguration happens mid-batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Target pixel width for exported PNGs.
    pub export_width: u32,
    /// Brightness cutoff percentage for binarization (0-100).
    pub threshold_percent: u8,
    /// Palette size the color path quantizes to before thresholding.
    pub posterize_colors: u32,
    /// Contrast-stretch percentile bounds.
    pub levels: LevelRange,
    /// Flip polarity after leveling (white lines on black input).
    pub invert: bool,
    /// Force reprocessing regardless of artifact staleness.
    pub overwrite: bool,
    /// Classification mode: consult the classifier or force a path.
    pub mode: ProcessingMode,
    /// Tracer speckle suppression (pixels).
    pub turd_size: u32,
    /// Tracer curve simplification tolerance.
    pub opt_tolerance: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            export_width: DEFAULT_EXPORT_WIDTH,
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
            posterize_colors: DEFAULT_POSTERIZE_COLORS,
            levels: LevelRange {
                low: DEFAULT_LEVEL_LOW,
                high: DEFAULT_LEVEL_HIGH,
            },
            invert: false,
            overwrite: false,
            mode: ProcessingMode::Auto,
            turd_size: DEFAULT_TURD_SIZE,
            opt_tolerance: DEFAULT_OPT_TOLERANCE,
        }
    }
}

impl PipelineConfig {
    /// Validate invariants that no stage re-checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold_percent > 100 {
            return Err(ConfigError::ThresholdOutOfRange(self.threshold_percent));
        }
        if self.posterize_colors < 2 {
            return Err(ConfigError::TooFewColors(self.posterize_colors));
        }
        if self.levels.low >= self.levels.high || self.levels.high > 100 {
            return Err(ConfigError::InvalidLevelRange {
                low: self.levels.low,
                high: self.levels.high,
            });
        }
        if self.export_width == 0 {
            return Err(ConfigError::ZeroExportWidth);
        }
        if self.opt_tolerance < 0.0 {
            return Err(ConfigError::NegativeTolerance(self.opt_tolerance));
        }
        Ok(())
    }
}

// ============================================================
// Config file
// ============================================================

/// Optional on-disk configuration (`linetrace.toml`).
///
/// Every field is optional; anything left unset falls back to the built-in
/// default unless a CLI flag overrides it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub export_width: Option<u32>,
    pub threshold_percent: Option<u8>,
    pub posterize_colors: Option<u32>,
    pub levels: Option<LevelRange>,
    pub invert: Option<bool>,
    pub mode: Option<ProcessingMode>,
    pub turd_size: Option<u32>,
    pub opt_tolerance: Option<f32>,
}

impl Config {
    /// Load from the default locations: `./linetrace.toml` first, then the
    /// per-user config directory. Missing files are not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let local = Path::new("linetrace.toml");
        if local.exists() {
            return Self::load_from_path(local);
        }
        if let Some(config_dir) = dirs::config_dir() {
            let user = config_dir.join("linetrace/config.toml");
            if user.exists() {
                return Self::load_from_path(&user);
            }
        }
        Ok(Self::default())
    }

    /// Load and parse a specific config file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Merge with command-line overrides. CLI values take precedence over
    /// the config file, which takes precedence over built-in defaults.
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            export_width: cli
                .export_width
                .or(self.export_width)
                .unwrap_or(defaults.export_width),
            threshold_percent: cli
                .threshold_percent
                .or(self.threshold_percent)
                .unwrap_or(defaults.threshold_percent),
            posterize_colors: cli
                .posterize_colors
                .or(self.posterize_colors)
                .unwrap_or(defaults.posterize_colors),
            levels: cli.levels.or(self.levels).unwrap_or(defaults.levels),
            invert: cli.invert.or(self.invert).unwrap_or(defaults.invert),
            overwrite: cli.overwrite.unwrap_or(defaults.overwrite),
            mode: cli.mode.or(self.mode).unwrap_or(defaults.mode),
            turd_size: cli
                .turd_size
                .or(self.turd_size)
                .unwrap_or(defaults.turd_size),
            opt_tolerance: cli
                .opt_tolerance
                .or(self.opt_tolerance)
                .unwrap_or(defaults.opt_tolerance),
        }
    }
}

/// Command-line values that override the config file.
///
/// `None` means the flag was not given, so the config file value (or the
/// built-in default) stands.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub export_width: Option<u32>,
    pub threshold_percent: Option<u8>,
    pub posterize_colors: Option<u32>,
    pub levels: Option<LevelRange>,
    pub invert: Option<bool>,
    pub overwrite: Option<bool>,
    pub mode: Option<ProcessingMode>,
    pub turd_size: Option<u32>,
    pub opt_tolerance: Option<f32>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}
