// Execution engine - task model, SSH executor, worker pool

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod runner;
pub mod ssh;

pub use runner::{Runner, RunnerConfig};
pub use ssh::SshClient;

/// Everything a worker needs to run the command on one host
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub key_path: PathBuf,
    pub command: String,
    /// Upper bound for the connect timeout; workers dial with a random
    /// fraction of it
    pub connect_timeout: Duration,
}

/// Combined output of a finished remote command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub combined: Vec<u8>,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// How a remote execution failed
#[derive(Debug, Error)]
pub enum ExecError {
    /// Could not reach or authenticate against the host
    #[error("connection failed: {0}")]
    Connect(String),

    /// Connected, but could not set up a session channel
    #[error("session setup failed: {0}")]
    Session(String),

    /// The command itself failed; carries whatever output was gathered
    #[error("command failed: {message}")]
    Command { message: String, output: Vec<u8> },
}

/// Common trait for remote executors, injectable for tests
#[async_trait]
pub trait RemoteExec: Send + Sync {
    /// Run the task's command on its host, bounding the connect phase by
    /// `timeout`
    async fn run(&self, task: &TaskSpec, timeout: Duration) -> Result<CommandOutput, ExecError>;
}
