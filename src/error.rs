//! Error types for the processing pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Per-file processing errors.
///
/// Every variant is caught at the orchestrator boundary: the offending file
/// is recorded as failed and the batch continues with the next file.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("{tool} failed: {reason}")]
    ExternalTool { tool: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProcessError>;

/// Startup errors.
///
/// Unlike [`ProcessError`] these carry no file-specific context and abort
/// the run before any file is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("threshold_percent must be within 0..=100, got {0}")]
    ThresholdOutOfRange(u8),

    #[error("posterize_colors must be at least 2, got {0}")]
    TooFewColors(u32),

    #[error("level range must satisfy low < high within 0..=100, got {low}%,{high}%")]
    InvalidLevelRange { low: u8, high: u8 },

    #[error("export_width must be nonzero")]
    ZeroExportWidth,

    #[error("opt_tolerance must be non-negative, got {0}")]
    NegativeTolerance(f32),

    #[error("failed to read config file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("required tool not found on PATH: {0}")]
    ToolNotFound(&'static str),
}
