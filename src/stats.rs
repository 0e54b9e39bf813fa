//! Run summary collection and display
//!
//! Aggregates the reports of every processed file into totals and prints
//! them, either as colored text or as JSON.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Serialize, Serializer};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::error::{Error, Result};
use crate::ops::FileReport;
use crate::tree::WalkSummary;

/// A file (or directory) that could not be processed, flattened for output.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub path: PathBuf,
    pub error: String,
}

/// Totals for one invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Input files every requested operation succeeded on
    pub files: usize,
    /// Subdirectories visited
    pub directories: usize,
    /// Bytes read, summed over every operation
    pub bytes_in: u64,
    /// Bytes written, summed over every operation
    pub bytes_out: u64,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub outputs: Vec<FileReport>,
    pub failures: Vec<FailureReport>,
}

impl RunSummary {
    /// Summary of a single-file run.
    pub fn from_file(path: &Path, result: Result<Vec<FileReport>>, elapsed: Duration) -> Self {
        let mut summary = Self {
            elapsed,
            ..Default::default()
        };
        match result {
            Ok(reports) => summary.record(reports),
            Err(error) => summary.record_failure(path.to_path_buf(), &error),
        }
        summary
    }

    /// Summary of a directory walk.
    pub fn from_walk(walk: WalkSummary<Vec<FileReport>>, elapsed: Duration) -> Self {
        let mut summary = Self {
            directories: walk.directories,
            elapsed,
            ..Default::default()
        };
        for (_, reports) in walk.completed {
            summary.record(reports);
        }
        for failure in walk.failed {
            summary.record_failure(failure.path, &failure.error);
        }
        summary
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, reports: Vec<FileReport>) {
        self.files += 1;
        for report in reports {
            self.bytes_in += report.bytes_in;
            self.bytes_out += report.bytes_out;
            self.outputs.push(report);
        }
    }

    fn record_failure(&mut self, path: PathBuf, error: &Error) {
        self.failures.push(FailureReport {
            path,
            error: error.to_string(),
        });
    }
}

fn serialize_millis<S: Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// Print the summary to stdout with optional color.
pub fn print_summary(summary: &RunSummary, use_color: bool) -> io::Result<()> {
    let color_choice = if use_color {
        ColorChoice::Always
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(color_choice);

    let mut bold = ColorSpec::new();
    bold.set_bold(true);
    let mut op_color = ColorSpec::new();
    op_color.set_fg(Some(Color::Cyan));
    let mut fail_color = ColorSpec::new();
    fail_color.set_fg(Some(Color::Red)).set_bold(true);

    for report in &summary.outputs {
        stdout.set_color(&op_color)?;
        write!(stdout, "{:<11}", report.operation.as_str())?;
        stdout.reset()?;
        writeln!(
            stdout,
            "{} -> {}  ({} -> {} bytes)",
            report.input.display(),
            report.output.display(),
            format_number(report.bytes_in),
            format_number(report.bytes_out)
        )?;
    }

    if !summary.failures.is_empty() {
        writeln!(stdout)?;
        stdout.set_color(&fail_color)?;
        writeln!(stdout, "Failed:")?;
        stdout.reset()?;
        for failure in &summary.failures {
            writeln!(stdout, "  {}: {}", failure.path.display(), failure.error)?;
        }
    }

    writeln!(stdout)?;
    stdout.set_color(&bold)?;
    write!(stdout, "Files:       ")?;
    stdout.reset()?;
    writeln!(
        stdout,
        "{} processed, {} failed, {} directories",
        summary.files,
        summary.failures.len(),
        summary.directories
    )?;
    stdout.set_color(&bold)?;
    write!(stdout, "Bytes:       ")?;
    stdout.reset()?;
    writeln!(
        stdout,
        "{} in, {} out",
        format_number(summary.bytes_in),
        format_number(summary.bytes_out)
    )?;
    stdout.set_color(&bold)?;
    write!(stdout, "Elapsed:     ")?;
    stdout.reset()?;
    writeln!(stdout, "{}", format_elapsed(summary.elapsed))?;

    Ok(())
}

/// Format a number with thousand separators.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// Elapsed time at millisecond precision, e.g. `1s 250ms`.
fn format_elapsed(elapsed: Duration) -> String {
    let millis = Duration::from_millis(elapsed.as_millis() as u64);
    humantime::format_duration(millis).to_string()
}

/// Print the summary as JSON.
pub fn print_summary_json(summary: &RunSummary) -> io::Result<()> {
    let json = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}
