//! Processing orchestrator
//!
//! Walks the batch of source images one at a time, decides per file whether
//! the outputs are stale or missing, and drives the cleaning chain plus the
//! external trace/export collaborators. A failure in one file never aborts
//! the batch; it is recorded and the run continues.
//!
//! Staleness is based on file modification times, which is inherently racy
//! if something else modifies the workspace mid-run. For a single-operator
//! batch tool that is an accepted limitation, not something the orchestrator
//! tries to defend against.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{error, info, warn};

use crate::clean;
use crate::config::PipelineConfig;
use crate::error::{ProcessError, Result};
use crate::progress::BatchProgress;
use crate::trace::{TraceEngine, VectorExporter};

/// Input extensions the pipeline picks up (lowercase).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

// ============================================================
// Workspace
// ============================================================

/// Folder layout under the workspace root: `input/` for sources and one
/// directory per output kind.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub input: PathBuf,
    pub cleaned: PathBuf,
    pub svg: PathBuf,
    pub png: PathBuf,
    pub pdf: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            input: root.join("input"),
            cleaned: root.join("cleaned"),
            svg: root.join("svg"),
            png: root.join("png"),
            pdf: root.join("pdf"),
            root,
        }
    }

    /// Create the folder structure if missing.
    pub fn scaffold(&self) -> std::io::Result<()> {
        for dir in [&self.input, &self.cleaned, &self.svg, &self.png, &self.pdf] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Move supported images dropped at the workspace root into `input/`,
    /// so the tool stays plug-and-play: drop files next to it and run.
    /// Files whose name already exists in `input/` are left in place.
    pub fn intake(&self) -> std::io::Result<usize> {
        let mut moved = 0;
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || !is_supported(&path) {
                continue;
            }
            let Some(name) = path.file_name() else {
                continue;
            };
            let target = self.input.join(name);
            if target.exists() {
                info!(file = %path.display(), "already present in input/, not moving");
                continue;
            }
            info!(file = %path.display(), "moving into input/");
            fs::rename(&path, &target)?;
            moved += 1;
        }
        Ok(moved)
    }

    /// Discover supported source images in `input/`, lexically sorted for a
    /// reproducible processing order.
    pub fn discover(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut sources = Vec::new();
        for entry in fs::read_dir(&self.input)? {
            let path = entry?.path();
            if path.is_file() && is_supported(&path) {
                sources.push(path);
            }
        }
        sources.sort();
        Ok(sources)
    }

    /// Output artifact paths sharing the source's base name.
    pub fn artifacts_for(&self, source: &Path) -> Artifacts {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Artifacts {
            cleaned: self.cleaned.join(format!("{}.png", stem)),
            svg: self.svg.join(format!("{}.svg", stem)),
            png: self.png.join(format!("{}.png", stem)),
            pdf: self.pdf.join(format!("{}.pdf", stem)),
        }
    }
}

// ============================================================
// Artifacts & staleness
// ============================================================

/// The four output artifacts derived from one source image.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub cleaned: PathBuf,
    pub svg: PathBuf,
    pub png: PathBuf,
    pub pdf: PathBuf,
}

impl Artifacts {
    fn all(&self) -> [&Path; 4] {
        [&self.cleaned, &self.svg, &self.png, &self.pdf]
    }

    /// True when every artifact exists and is at least as new as the
    /// source. Unreadable timestamps count as stale.
    pub fn up_to_date(&self, source: &Path) -> bool {
        let Some(source_mtime) = mtime(source) else {
            return false;
        };
        self.all()
            .into_iter()
            .all(|artifact| mtime(artifact).is_some_and(|m| m >= source_mtime))
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

// ============================================================
// Run summary
// ============================================================

/// Per-file outcome of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Processed,
    UpToDate,
    Failed,
}

/// Counts reported at the end of a run, plus the recorded failures.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub up_to_date: usize,
    pub failures: Vec<(PathBuf, ProcessError)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.processed + self.up_to_date + self.failures.len()
    }
}

// ============================================================
// Pipeline
// ============================================================

/// Drives the full batch: staleness check, cleaning chain, and hand-off to
/// the external collaborators. Sequential by design; each file owns its
/// buffers exclusively and only the read-only config is shared.
pub struct Pipeline<'a> {
    config: PipelineConfig,
    tracer: &'a dyn TraceEngine,
    exporter: &'a dyn VectorExporter,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: PipelineConfig,
        tracer: &'a dyn TraceEngine,
        exporter: &'a dyn VectorExporter,
    ) -> Self {
        Self {
            config,
            tracer,
            exporter,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process every discovered source in order.
    pub fn run(
        &self,
        workspace: &Workspace,
        progress: &mut BatchProgress,
    ) -> std::io::Result<RunSummary> {
        let sources = workspace.discover()?;
        let mut summary = RunSummary::default();

        if sources.is_empty() {
            warn!("no supported image files found in {}", workspace.input.display());
            return Ok(summary);
        }

        progress.start_batch(sources.len());
        for source in &sources {
            let artifacts = workspace.artifacts_for(source);

            if !self.config.overwrite && artifacts.up_to_date(source) {
                info!(file = %source.display(), "up to date, skipping");
                progress.file_done(source, FileOutcome::UpToDate);
                summary.up_to_date += 1;
                continue;
            }

            progress.file_start(source);
            match self.process_file(source, &artifacts, progress) {
                Ok(()) => {
                    progress.file_done(source, FileOutcome::Processed);
                    summary.processed += 1;
                }
                Err(e) => {
                    error!(file = %source.display(), error = %e, "processing failed");
                    progress.file_done(source, FileOutcome::Failed);
                    summary.failures.push((source.clone(), e));
                }
            }
        }

        Ok(summary)
    }

    /// Clean one source and hand the result to the tracer and exporter.
    fn process_file(
        &self,
        source: &Path,
        artifacts: &Artifacts,
        progress: &mut BatchProgress,
    ) -> Result<()> {
        progress.stage("cleaning");
        let image = image::open(source).map_err(ProcessError::Decode)?;
        let cleaned = clean::clean_image(&image, &self.config)?;
        cleaned
            .save(&artifacts.cleaned)
            .map_err(ProcessError::Encode)?;

        progress.stage("tracing");
        self.tracer
            .trace(&artifacts.cleaned, &artifacts.svg, &self.config)?;

        progress.stage("exporting");
        self.exporter
            .export_png(&artifacts.svg, &artifacts.png, self.config.export_width)?;
        self.exporter.export_pdf(&artifacts.svg, &artifacts.pdf)?;

        Ok(())
    }
}
