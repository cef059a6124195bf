// Bounded worker pool that fans one command out across many hosts

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::mpsc;

use super::{ExecError, RemoteExec, TaskSpec};
use crate::output::terminal::{HostReport, RunSummary};
use crate::output::ReportSink;
use crate::store::OutputStore;

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Number of concurrent workers; zero is treated as one
    pub workers: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig { workers: 50 }
    }
}

/// The worker pool
pub struct Runner {
    config: RunnerConfig,
    executor: Arc<dyn RemoteExec>,
    store: Arc<dyn OutputStore>,
    output: Arc<Mutex<dyn ReportSink>>,
}

impl Runner {
    pub fn new(
        config: RunnerConfig,
        executor: Arc<dyn RemoteExec>,
        store: Arc<dyn OutputStore>,
        output: Arc<Mutex<dyn ReportSink>>,
    ) -> Self {
        Runner {
            config,
            executor,
            store,
            output,
        }
    }

    /// Run every task to completion and return the tally
    ///
    /// Per-host failures are data, not errors: each task yields exactly one
    /// report and one status no matter how it went.
    pub async fn run(&self, tasks: Vec<TaskSpec>) -> RunSummary {
        let start = Instant::now();
        let total = tasks.len();
        let mut summary = RunSummary::new(total);

        if total == 0 {
            summary.elapsed = start.elapsed();
            return summary;
        }

        // Workers claim indices from a shared cursor; fetch_add hands each
        // index to exactly one worker, so the list itself never mutates.
        let queue = Arc::new(tasks);
        let cursor = Arc::new(AtomicUsize::new(0));

        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<HostReport>();
        let (status_tx, mut status_rx) = mpsc::unbounded_channel::<bool>();

        // Single consumer for per-host reports. The loop ends only once
        // every sender is gone and the buffer is drained, so channel
        // closure doubles as the shutdown signal and nothing gets lost.
        let output = self.output.clone();
        let aggregator = tokio::spawn(async move {
            while let Some(report) = report_rx.recv().await {
                output.lock().print_host_report(&report);
            }
        });

        // A zero-size pool would strand every task
        let worker_count = self.config.workers.clamp(1, total);
        let handles: Vec<_> = (0..worker_count)
            .map(|_| {
                let queue = queue.clone();
                let cursor = cursor.clone();
                let executor = self.executor.clone();
                let store = self.store.clone();
                let report_tx = report_tx.clone();
                let status_tx = status_tx.clone();

                tokio::spawn(async move {
                    loop {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let task = match queue.get(index) {
                            Some(task) => task,
                            None => break,
                        };

                        let report = run_one(task, executor.as_ref(), store.as_ref()).await;
                        let ok = report.command_ok;
                        let _ = report_tx.send(report);
                        let _ = status_tx.send(ok);
                    }
                })
            })
            .collect();

        // Drop our own senders so closure tracks the workers alone
        drop(report_tx);
        drop(status_tx);

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                tracing::warn!("worker exited abnormally: {}", e);
                summary.record_panic();
            }
        }

        if aggregator.await.is_err() {
            tracing::warn!("report aggregator exited abnormally");
        }

        // Every status is already buffered once the workers are joined
        while let Some(ok) = status_rx.recv().await {
            summary.record_status(ok);
        }

        summary.elapsed = start.elapsed();
        summary
    }
}

/// Execute a single task: dial with a jittered timeout, run the command,
/// persist whatever output came back, and fold it all into one report.
async fn run_one(task: &TaskSpec, executor: &dyn RemoteExec, store: &dyn OutputStore) -> HostReport {
    let timeout = jittered_timeout(task.connect_timeout);

    let start = Instant::now();
    let outcome = executor.run(task, timeout).await;
    let elapsed = start.elapsed();

    let (report, output) = match outcome {
        Ok(output) => (HostReport::ok(&task.host), output.combined),
        Err(ExecError::Command { message, output }) => {
            (HostReport::failed(&task.host, message), output)
        }
        Err(e) => {
            // Connect/session failures leave no remote output; the log
            // file records the reason instead
            let message = e.to_string();
            let output = message.clone().into_bytes();
            (HostReport::failed(&task.host, message), output)
        }
    };
    let mut report = report.with_elapsed(elapsed);

    // Saving is attempted for every outcome and tracked on its own
    if let Err(e) = store.save(&task.host, &output).await {
        let note = format!("output not saved: {}", e);
        report.persist_ok = false;
        report.detail = Some(match report.detail.take() {
            Some(detail) => format!("{}; {}", detail, note),
            None => note,
        });
    }

    report
}

/// Pick a connect timeout uniformly below the budget, staggering dials so
/// a large run does not open every connection in the same instant
fn jittered_timeout(budget: Duration) -> Duration {
    let budget_ms = budget.as_millis() as u64;
    if budget_ms == 0 {
        return Duration::ZERO;
    }

    Duration::from_millis(rand::thread_rng().gen_range(0..budget_ms))
}
