//! linetrace - batch converter of raster line art into cleaned,
//! print-ready SVG/PNG/PDF coloring pages
//!
//! The core is the cleaning decision engine in [`clean`]: per-image
//! color/monochrome classification and the contrast → posterize → threshold
//! transformation chain. [`pipeline`] orchestrates the batch with
//! mtime-based staleness checks, and [`trace`] holds the boundary to the
//! external potrace/inkscape collaborators.

pub mod clean;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod trace;

pub use clean::{clean_image, Classification, ProcessingMode};
pub use cli::{Cli, Commands, ProcessArgs};
pub use config::{CliOverrides, Config, LevelRange, PipelineConfig};
pub use error::{ConfigError, ProcessError};
pub use pipeline::{Artifacts, FileOutcome, Pipeline, RunSummary, Workspace};
pub use progress::{BatchProgress, OutputMode};
pub use trace::{Inkscape, Potrace, TraceEngine, VectorExporter};

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const INPUT_NOT_FOUND: i32 = 3;
}
