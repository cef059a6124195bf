// JSON output for structured logging

use serde_json::json;

use super::terminal::{HostReport, RunSummary};

/// JSON output manager for machine-readable logging (NDJSON format)
pub struct JsonOutput {
    verbose: bool,
    quiet: bool,
}

impl JsonOutput {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        JsonOutput { verbose, quiet }
    }

    /// Print the run header
    pub fn print_run_header(&self, hosts_count: usize, workers: usize, command: &str) {
        if self.quiet {
            return;
        }

        let event = json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "event": "run_start",
            "command": command,
            "hosts_count": hosts_count,
            "workers": workers,
        });

        self.emit_json(&event);
    }

    /// Print the outcome of one host
    pub fn print_host_report(&self, report: &HostReport) {
        if self.quiet && report.command_ok && report.persist_ok {
            return;
        }

        let mut event = json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "event": "host_result",
            "host": report.host,
            "command_ok": report.command_ok,
            "persist_ok": report.persist_ok,
            "duration_ms": report.elapsed.as_millis(),
        });

        // Add optional fields
        let obj = event.as_object_mut().unwrap();

        if self.verbose || !report.command_ok || !report.persist_ok {
            if let Some(ref detail) = report.detail {
                if !detail.is_empty() {
                    obj.insert("detail".to_string(), json!(detail));
                }
            }
        }

        self.emit_json(&event);
    }

    /// Print the final recap
    pub fn print_summary(&self, summary: &RunSummary) {
        let event = json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "event": "run_complete",
            "summary": summary,
            "unaccounted": summary.unaccounted(),
            "has_failures": summary.has_failures(),
        });

        self.emit_json(&event);
    }

    /// Emit a JSON object as a single line (NDJSON format)
    fn emit_json(&self, value: &serde_json::Value) {
        if let Ok(json_str) = serde_json::to_string(value) {
            println!("{}", json_str);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_json_output_host_report() {
        let output = JsonOutput::new(false, false);
        let report = HostReport::ok("web-01")
            .with_elapsed(Duration::from_millis(842))
            .with_detail("web-01\n");

        // Should not panic
        output.print_host_report(&report);
    }

    #[test]
    fn test_json_output_run_header() {
        let output = JsonOutput::new(false, false);
        output.print_run_header(5, 2, "echo $HOSTNAME");
    }

    #[test]
    fn test_json_output_summary() {
        let output = JsonOutput::new(false, false);
        let mut summary = RunSummary::new(3);
        summary.record_status(true);
        summary.record_status(false);
        summary.elapsed = Duration::from_secs(10);

        output.print_summary(&summary);
    }

    #[test]
    fn test_summary_serializes_duration_as_millis() {
        let mut summary = RunSummary::new(1);
        summary.record_status(true);
        summary.elapsed = Duration::from_millis(2500);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["total_duration_ms"], 2500);
        assert_eq!(value["succeeded"], 1);
    }
}
