// Rich terminal output for volley

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;

/// Terminal output manager
pub struct TerminalOutput {
    progress: ProgressBar,
    verbose: bool,
    quiet: bool,
    is_tty: bool,
}

impl TerminalOutput {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        let is_tty = console::user_attended();

        // Respect NO_COLOR environment variable (https://no-color.org/)
        // Also disable colors if not a TTY
        if std::env::var("NO_COLOR").is_ok() || !is_tty {
            colored::control::set_override(false);
        }

        TerminalOutput {
            progress: ProgressBar::hidden(),
            verbose,
            quiet,
            is_tty,
        }
    }

    /// Print the run header and arm the progress bar
    pub fn print_run_header(&self, hosts_count: usize, workers: usize, command: &str) {
        if !self.quiet {
            println!();
            println!(
                "{} {} ({} hosts, {} workers)",
                "RUN".green().bold(),
                command.cyan(),
                hosts_count,
                workers
            );
            println!("{}", "─".repeat(60).dimmed());
        }

        if self.is_tty && !self.quiet {
            self.progress.set_length(hosts_count as u64);
            self.progress.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} hosts ({elapsed})")
                    .unwrap()
                    .progress_chars("=> "),
            );
            self.progress.set_draw_target(ProgressDrawTarget::stderr());
            self.progress.enable_steady_tick(Duration::from_millis(100));
        }
    }

    /// Print the outcome of one host
    pub fn print_host_report(&self, report: &HostReport) {
        self.progress.inc(1);

        if self.quiet && report.command_ok && report.persist_ok {
            return;
        }

        let status = if report.command_ok {
            "OK".green()
        } else {
            "FAILED".red().bold()
        };

        let mut line = format!(
            "  {} {} {} {}",
            status,
            "=>".dimmed(),
            report.host.white().bold(),
            format!("({:.2}s)", report.elapsed.as_secs_f64()).dimmed()
        );

        if !report.persist_ok {
            line.push_str(&format!(" {}", "[not saved]".yellow()));
        }

        self.emit(&line);

        if self.verbose || !report.command_ok || !report.persist_ok {
            if let Some(detail) = &report.detail {
                for detail_line in detail.lines() {
                    if report.command_ok {
                        self.emit(&format!("      {}", detail_line.dimmed()));
                    } else {
                        self.emit(&format!("      {}", detail_line.red()));
                    }
                }
            }
        }
    }

    /// Print the final recap
    pub fn print_summary(&self, summary: &RunSummary) {
        self.progress.finish_and_clear();

        println!();
        println!("{}", "RUN RECAP".green().bold());
        println!("{}", "─".repeat(60).dimmed());

        let succeeded = format!("succeeded={}", summary.succeeded).green();
        let failed = if summary.failed > 0 {
            format!("failed={}", summary.failed).red().bold()
        } else {
            format!("failed={}", summary.failed).normal()
        };
        let unaccounted = if summary.unaccounted() > 0 {
            format!("unaccounted={}", summary.unaccounted()).yellow()
        } else {
            format!("unaccounted={}", summary.unaccounted()).normal()
        };

        println!(
            "total={}    {}    {}    {}",
            summary.total, succeeded, failed, unaccounted
        );

        // Print overall timing
        println!();
        println!("Total time: {:.2}s", summary.elapsed.as_secs_f64());
    }

    /// Route a line above the progress bar when it is drawing
    fn emit(&self, line: &str) {
        if self.progress.is_hidden() {
            println!("{}", line);
        } else {
            self.progress.println(line);
        }
    }
}

/// Outcome of the command on a single host
#[derive(Debug, Clone)]
pub struct HostReport {
    pub host: String,
    pub elapsed: Duration,
    pub command_ok: bool,
    pub persist_ok: bool,
    pub detail: Option<String>,
}

impl HostReport {
    pub fn ok(host: impl Into<String>) -> Self {
        HostReport {
            host: host.into(),
            elapsed: Duration::ZERO,
            command_ok: true,
            persist_ok: true,
            detail: None,
        }
    }

    pub fn failed(host: impl Into<String>, detail: impl Into<String>) -> Self {
        HostReport {
            host: host.into(),
            elapsed: Duration::ZERO,
            command_ok: false,
            persist_ok: true,
            detail: Some(detail.into()),
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn with_persist_ok(mut self, persist_ok: bool) -> Self {
        self.persist_ok = persist_ok;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Tally of the entire run
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub worker_panics: usize,
    #[serde(rename = "total_duration_ms", serialize_with = "super::duration_ms")]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        RunSummary {
            total,
            ..Default::default()
        }
    }

    pub fn record_status(&mut self, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn record_panic(&mut self) {
        self.worker_panics += 1;
    }

    /// Tasks that never produced a status, counted by subtraction
    pub fn unaccounted(&self) -> usize {
        self.total.saturating_sub(self.succeeded + self.failed)
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.unaccounted() > 0
    }
}
