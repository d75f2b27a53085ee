//! Batch progress reporting
//!
//! Human-facing output for a batch run: per-file headers, stage lines, and
//! the end-of-run summary distinguishing processed, up-to-date, and failed
//! files. Structured logging goes through `tracing`; this module only owns
//! what the operator sees on stdout.

use std::path::Path;

use crate::pipeline::{FileOutcome, RunSummary};

/// Output verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// No per-file output, summary only.
    Quiet,
    /// One line per file.
    #[default]
    Normal,
    /// Per-file stage lines as well.
    Verbose,
}

impl OutputMode {
    /// Map `-v` count and `--quiet` to a mode.
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if verbose > 0 {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }

    fn shows(&self, required: OutputMode) -> bool {
        use OutputMode::*;
        matches!(
            (self, required),
            (Normal, Normal) | (Verbose, Normal) | (Verbose, Verbose)
        )
    }
}

/// Tracks position within the batch and prints progress lines.
#[derive(Debug, Default)]
pub struct BatchProgress {
    mode: OutputMode,
    total: usize,
    current: usize,
}

impl BatchProgress {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            total: 0,
            current: 0,
        }
    }

    pub fn start_batch(&mut self, total: usize) {
        self.total = total;
        self.current = 0;
        if self.mode.shows(OutputMode::Normal) {
            println!("Processing {} file(s)", total);
        }
    }

    pub fn file_start(&mut self, source: &Path) {
        self.current += 1;
        if self.mode.shows(OutputMode::Normal) {
            println!(
                "[{}/{}] Processing: {}",
                self.current,
                self.total,
                display_name(source)
            );
        }
    }

    pub fn stage(&mut self, name: &str) {
        if self.mode.shows(OutputMode::Verbose) {
            println!("    {}", name);
        }
    }

    pub fn file_done(&mut self, source: &Path, outcome: FileOutcome) {
        match outcome {
            FileOutcome::UpToDate => {
                self.current += 1;
                if self.mode.shows(OutputMode::Normal) {
                    println!(
                        "[{}/{}] Up to date: {}",
                        self.current,
                        self.total,
                        display_name(source)
                    );
                }
            }
            FileOutcome::Processed => {
                if self.mode.shows(OutputMode::Verbose) {
                    println!("    done");
                }
            }
            FileOutcome::Failed => {
                if self.mode.shows(OutputMode::Normal) {
                    println!("    FAILED: {}", display_name(source));
                }
            }
        }
    }

    /// Print the end-of-run summary.
    pub fn print_summary(&self, summary: &RunSummary) {
        if self.mode == OutputMode::Quiet {
            return;
        }
        println!();
        println!("{}", "=".repeat(60));
        println!("Run Summary");
        println!("{}", "=".repeat(60));
        println!("  Total files:  {}", summary.total());
        println!("  Processed:    {}", summary.processed);
        println!("  Up to date:   {}", summary.up_to_date);
        println!("  Errors:       {}", summary.failures.len());
        for (path, error) in &summary.failures {
            println!("    {} - {}", display_name(path), error);
        }
        println!("{}", "=".repeat(60));
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
