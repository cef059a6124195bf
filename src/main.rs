// volley CLI - run one command across many hosts over SSH

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use volley::exec::{Runner, RunnerConfig, SshClient, TaskSpec};
use volley::hostlist::{self, Host};
use volley::output::{OutputFormat, OutputWriter, VolleyError};
use volley::store::FileStore;

#[derive(Parser)]
#[command(
    name = "volley",
    about = "Run one command across many hosts over SSH",
    version,
    disable_colored_help = true,
    term_width = 0,
)]
struct Cli {
    /// File containing target hosts, one per line
    hosts_file: PathBuf,

    /// Command to run on every host
    #[arg(short = 'c', long, default_value = "echo $HOSTNAME")]
    command: String,

    /// Number of concurrent workers
    #[arg(long, default_value = "50")]
    forks: usize,

    /// SSH username (defaults to the current user)
    #[arg(short = 'l', long)]
    user: Option<String>,

    /// Path to the SSH private key
    #[arg(short = 'i', long)]
    private_key: Option<PathBuf>,

    /// SSH port for hosts that do not name one
    #[arg(short = 'p', long, default_value = "22")]
    port: u16,

    /// Connect timeout budget in seconds; each dial waits a random fraction of it
    #[arg(long, default_value = "10")]
    connect_timeout: u64,

    /// Directory for per-host output files (defaults to the system temp dir)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    output_format: String,

    /// Exit with status 2 if any host failed
    #[arg(long)]
    strict: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only failures and the recap
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse output format
    let output_format = OutputFormat::from_str(&cli.output_format).unwrap_or_else(|_| {
        eprintln!("Invalid output format: {}. Using 'text'.", cli.output_format);
        OutputFormat::Text
    });

    match run(cli, output_format).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli, output_format: OutputFormat) -> Result<i32, VolleyError> {
    if cli.forks == 0 {
        return Err(VolleyError::Config {
            message: "--forks must be at least 1".to_string(),
            suggestion: None,
        });
    }

    let user = cli
        .user
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "root".to_string());
    let key_path = cli.private_key.unwrap_or_else(default_key_path);

    let hosts = hostlist::load_host_file(&cli.hosts_file)?;
    if hosts.is_empty() {
        return Err(VolleyError::Config {
            message: format!("No hosts found in {}", cli.hosts_file.display()),
            suggestion: Some("Add one host per line; `#` starts a comment".to_string()),
        });
    }

    tracing::info!(
        "loaded {} hosts from {}",
        hosts.len(),
        cli.hosts_file.display()
    );
    tracing::info!("concurrency: {}", cli.forks);
    tracing::info!("remote command: {}", cli.command);
    tracing::info!(
        "ssh client example: ssh -i {} -p {} {}@<hostname>",
        key_path.display(),
        cli.port,
        user
    );

    let connect_timeout = Duration::from_secs(cli.connect_timeout);
    let tasks: Vec<TaskSpec> = hosts
        .into_iter()
        .map(|host| build_task(host, &user, &key_path, cli.port, &cli.command, connect_timeout))
        .collect();

    let output = Arc::new(Mutex::new(OutputWriter::new(
        output_format,
        cli.verbose,
        cli.quiet,
    )));
    output
        .lock()
        .print_run_header(tasks.len(), cli.forks, &cli.command);

    let runner = Runner::new(
        RunnerConfig { workers: cli.forks },
        Arc::new(SshClient::new()),
        Arc::new(FileStore::new(cli.output_dir)),
        output.clone(),
    );

    let summary = runner.run(tasks).await;
    output.lock().print_summary(&summary);

    if cli.strict && summary.has_failures() {
        return Ok(2);
    }

    Ok(0)
}

fn build_task(
    host: Host,
    user: &str,
    key_path: &Path,
    port: u16,
    command: &str,
    connect_timeout: Duration,
) -> TaskSpec {
    TaskSpec {
        user: host.user.unwrap_or_else(|| user.to_string()),
        port: host.port.unwrap_or(port),
        host: host.name,
        key_path: key_path.to_path_buf(),
        command: command.to_string(),
        connect_timeout,
    }
}

fn default_key_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".ssh/id_rsa"))
        .unwrap_or_else(|| PathBuf::from(".ssh/id_rsa"))
}

/// Simple home directory lookup
mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_task_applies_global_defaults() {
        let task = build_task(
            Host::new("web-01"),
            "deploy",
            Path::new("/home/deploy/.ssh/id_rsa"),
            22,
            "uptime",
            Duration::from_secs(10),
        );

        assert_eq!(task.host, "web-01");
        assert_eq!(task.user, "deploy");
        assert_eq!(task.port, 22);
        assert_eq!(task.command, "uptime");
    }

    #[test]
    fn test_build_task_host_entry_wins() {
        let task = build_task(
            Host::new("web-01").with_user("bob").with_port(2222),
            "deploy",
            Path::new("/home/deploy/.ssh/id_rsa"),
            22,
            "uptime",
            Duration::from_secs(10),
        );

        assert_eq!(task.user, "bob");
        assert_eq!(task.port, 2222);
    }
}
