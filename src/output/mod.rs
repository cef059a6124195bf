// Output module for volley

use std::time::Duration;

pub mod errors;
pub mod json_output;
pub mod terminal;

pub use errors::*;
pub use json_output::*;
pub use terminal::*;

/// Output format for volley
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output with colors
    #[default]
    Text,
    /// Machine-readable JSON output (NDJSON format)
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(()),
        }
    }
}

/// Unified output writer supporting both text and JSON formats
pub enum OutputWriter {
    Text(TerminalOutput),
    Json(JsonOutput),
}

impl OutputWriter {
    pub fn new(format: OutputFormat, verbose: bool, quiet: bool) -> Self {
        match format {
            OutputFormat::Text => OutputWriter::Text(TerminalOutput::new(verbose, quiet)),
            OutputFormat::Json => OutputWriter::Json(JsonOutput::new(verbose, quiet)),
        }
    }

    pub fn print_run_header(&self, hosts_count: usize, workers: usize, command: &str) {
        match self {
            OutputWriter::Text(output) => output.print_run_header(hosts_count, workers, command),
            OutputWriter::Json(output) => output.print_run_header(hosts_count, workers, command),
        }
    }

    pub fn print_summary(&self, summary: &RunSummary) {
        match self {
            OutputWriter::Text(output) => output.print_summary(summary),
            OutputWriter::Json(output) => output.print_summary(summary),
        }
    }
}

/// Destination for per-host reports, injectable for tests
pub trait ReportSink: Send {
    fn print_host_report(&self, report: &HostReport);
}

impl ReportSink for OutputWriter {
    fn print_host_report(&self, report: &HostReport) {
        match self {
            OutputWriter::Text(output) => output.print_host_report(report),
            OutputWriter::Json(output) => output.print_host_report(report),
        }
    }
}

/// Serialize a duration as whole milliseconds
pub(crate) fn duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}
