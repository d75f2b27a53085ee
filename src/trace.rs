//! External tracing and export collaborators
//!
//! The pipeline hands cleaned bitmaps to two external binaries:
//!
//! - **potrace** traces the two-level bitmap into an SVG outline
//! - **inkscape** renders the SVG to print-ready PNG and PDF
//!
//! Both sit behind traits so the orchestrator (and the test suite) never
//! depends on the binaries being installed. Discovery happens once at
//! startup via `which`; a missing tool aborts before any file is touched.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{ConfigError, ProcessError, Result};

/// Traces a two-level bitmap file into a vector outline.
pub trait TraceEngine {
    fn trace(&self, bitmap: &Path, svg: &Path, config: &PipelineConfig) -> Result<()>;
}

/// Renders a vector file to raster/document outputs.
pub trait VectorExporter {
    fn export_png(&self, svg: &Path, output: &Path, width: u32) -> Result<()>;
    fn export_pdf(&self, svg: &Path, output: &Path) -> Result<()>;
}

/// Run a prepared command, mapping nonzero exit or a missing output file to
/// [`ProcessError::ExternalTool`].
fn run_checked(tool: &'static str, command: &mut Command, expected_output: &Path) -> Result<()> {
    let output = command
        .output()
        .map_err(|e| ProcessError::ExternalTool {
            tool,
            reason: format!("failed to launch: {}", e),
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProcessError::ExternalTool {
            tool,
            reason: format!("exit status {}: {}", output.status, stderr.trim()),
        });
    }
    if !expected_output.exists() {
        return Err(ProcessError::ExternalTool {
            tool,
            reason: format!("expected output missing: {}", expected_output.display()),
        });
    }
    Ok(())
}

// ============================================================
// Potrace
// ============================================================

/// Potrace vectorization engine.
#[derive(Debug, Clone)]
pub struct Potrace {
    binary: PathBuf,
}

impl Potrace {
    /// Locate the `potrace` binary on PATH.
    pub fn discover() -> std::result::Result<Self, ConfigError> {
        let binary = which::which("potrace").map_err(|_| ConfigError::ToolNotFound("potrace"))?;
        info!(path = %binary.display(), "using potrace");
        Ok(Self { binary })
    }
}

impl TraceEngine for Potrace {
    /// Trace a cleaned bitmap to SVG.
    ///
    /// Potrace reads PNM, not PNG, so the cleaned bitmap is re-encoded
    /// through a temporary PGM file (already pure black/white, so potrace's
    /// own 50% cutoff is a no-op).
    fn trace(&self, bitmap: &Path, svg: &Path, config: &PipelineConfig) -> Result<()> {
        let image = image::open(bitmap).map_err(ProcessError::Decode)?;
        let pnm = tempfile::Builder::new()
            .prefix("linetrace-")
            .suffix(".pgm")
            .tempfile()?;
        image
            .to_luma8()
            .save(pnm.path())
            .map_err(ProcessError::Encode)?;

        let mut command = Command::new(&self.binary);
        command
            .arg("-s")
            .args(["--turdsize", &config.turd_size.to_string()])
            .args(["--alphamax", "1"])
            .args(["--opttolerance", &config.opt_tolerance.to_string()])
            .arg("-o")
            .arg(svg)
            .arg(pnm.path());
        run_checked("potrace", &mut command, svg)
    }
}

// ============================================================
// Inkscape
// ============================================================

/// Inkscape raster/document exporter.
#[derive(Debug, Clone)]
pub struct Inkscape {
    binary: PathBuf,
}

impl Inkscape {
    /// Locate the `inkscape` binary on PATH.
    pub fn discover() -> std::result::Result<Self, ConfigError> {
        let binary =
            which::which("inkscape").map_err(|_| ConfigError::ToolNotFound("inkscape"))?;
        info!(path = %binary.display(), "using inkscape");
        Ok(Self { binary })
    }

    fn export(&self, svg: &Path, output: &Path, extra: &[String]) -> Result<()> {
        let mut command = Command::new(&self.binary);
        command
            .arg(svg)
            // Export only the drawn vectors, not the whole page.
            .arg("--export-area-drawing")
            .args(extra)
            .arg(format!("--export-filename={}", output.display()));
        run_checked("inkscape", &mut command, output)
    }
}

impl VectorExporter for Inkscape {
    fn export_png(&self, svg: &Path, output: &Path, width: u32) -> Result<()> {
        self.export(
            svg,
            output,
            &[
                "--export-type=png".to_string(),
                format!("--export-width={}", width),
            ],
        )
    }

    fn export_pdf(&self, svg: &Path, output: &Path) -> Result<()> {
        self.export(svg, output, &["--export-type=pdf".to_string()])
    }
}

/// Print availability and version of one external tool (for the `info`
/// subcommand).
pub fn report_tool(cmd: &str, name: &str, version_args: &[&str]) {
    match which::which(cmd) {
        Ok(path) => {
            if let Ok(output) = Command::new(&path).args(version_args).output() {
                let version = String::from_utf8_lossy(&output.stdout);
                let first_line = version.lines().next().unwrap_or("").trim();
                if !first_line.is_empty() && first_line.len() < 80 {
                    println!("  {}: {} ({})", name, first_line, path.display());
                    return;
                }
            }
            println!("  {}: {} (found)", name, path.display());
        }
        Err(_) => println!("  {}: Not found", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_checked_reports_launch_failure() {
        let mut command = Command::new("/nonexistent/linetrace-test-binary");
        let result = run_checked("potrace", &mut command, Path::new("/tmp/never-made.svg"));
        assert!(matches!(
            result,
            Err(ProcessError::ExternalTool { tool: "potrace", .. })
        ));
    }

    #[test]
    fn test_run_checked_requires_output_file() {
        // `true` exits zero but produces nothing.
        let mut command = Command::new("true");
        let result = run_checked("inkscape", &mut command, Path::new("/tmp/never-made.pdf"));
        match result {
            Err(ProcessError::ExternalTool { tool, reason }) => {
                assert_eq!(tool, "inkscape");
                assert!(reason.contains("expected output missing"));
            }
            other => panic!("expected ExternalTool error, got {:?}", other),
        }
    }
}
