// SSH command execution over ssh2

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use ssh2::Session;

use super::{CommandOutput, ExecError, RemoteExec, TaskSpec};

/// ssh2-backed remote executor
///
/// Opens a fresh connection per task; sessions are not shared. ssh2 is a
/// blocking library, so all of its work runs on the blocking pool.
pub struct SshClient;

impl SshClient {
    pub fn new() -> Self {
        SshClient
    }
}

impl Default for SshClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteExec for SshClient {
    async fn run(&self, task: &TaskSpec, timeout: Duration) -> Result<CommandOutput, ExecError> {
        let task = task.clone();
        tokio::task::spawn_blocking(move || exec_remote(&task, timeout))
            .await
            .map_err(|e| ExecError::Session(format!("Executor task aborted: {}", e)))?
    }
}

fn exec_remote(task: &TaskSpec, timeout: Duration) -> Result<CommandOutput, ExecError> {
    let session = open_session(task, timeout)?;

    let mut channel = session
        .channel_session()
        .map_err(|e| ExecError::Session(format!("Failed to open channel: {}", e)))?;

    channel.exec(&task.command).map_err(|e| ExecError::Command {
        message: format!("Failed to execute command: {}", e),
        output: Vec::new(),
    })?;

    let mut combined = Vec::new();
    channel.read_to_end(&mut combined).ok();
    let mut stderr = Vec::new();
    channel.stderr().read_to_end(&mut stderr).ok();
    combined.extend_from_slice(&stderr);

    channel.wait_close().ok();

    let result = CommandOutput {
        combined,
        exit_code: channel.exit_status().unwrap_or(-1),
    };

    if !result.success() {
        return Err(ExecError::Command {
            message: format!("Command exited with status {}", result.exit_code),
            output: result.combined,
        });
    }

    Ok(result)
}

fn open_session(task: &TaskSpec, timeout: Duration) -> Result<Session, ExecError> {
    let address = format!("{}:{}", task.host, task.port);

    // connect_timeout only takes a resolved SocketAddr
    let addr = address
        .to_socket_addrs()
        .map_err(|e| ExecError::Connect(format!("Failed to resolve {}: {}", address, e)))?
        .next()
        .ok_or_else(|| ExecError::Connect(format!("No addresses found for {}", address)))?;

    // connect_timeout rejects a zero duration
    let timeout = timeout.max(Duration::from_millis(1));

    let tcp = TcpStream::connect_timeout(&addr, timeout).map_err(|e| {
        let mut message = format!("Connection failed: {}", e);
        if let Some(hint) = connect_suggestion(&e) {
            message.push_str(&format!(" ({})", hint));
        }
        ExecError::Connect(message)
    })?;

    let mut session = Session::new()
        .map_err(|e| ExecError::Connect(format!("Failed to create SSH session: {}", e)))?;

    session.set_tcp_stream(tcp);
    session.set_timeout(session_timeout_ms(timeout));

    session
        .handshake()
        .map_err(|e| ExecError::Connect(format!("SSH handshake failed: {}", e)))?;

    authenticate(&session, task)?;

    // Dialing, the handshake, and auth are bounded; command reads are
    // not. Zero lifts the session timeout.
    session.set_timeout(0);

    Ok(session)
}

/// libssh2 takes the session timeout as u32 milliseconds
fn session_timeout_ms(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

fn authenticate(session: &Session, task: &TaskSpec) -> Result<(), ExecError> {
    // The configured key file first
    if task.key_path.exists()
        && session
            .userauth_pubkey_file(&task.user, None, &task.key_path, None)
            .is_ok()
    {
        return Ok(());
    }

    // Fall back to any identity a reachable agent holds
    if let Ok(mut agent) = session.agent() {
        if agent.connect().is_ok() {
            agent.list_identities().ok();
            for identity in agent.identities().unwrap_or_default() {
                if agent.userauth(&task.user, &identity).is_ok() {
                    return Ok(());
                }
            }
        }
    }

    Err(ExecError::Connect(format!(
        "Authentication failed for {}@{} (key: {})",
        task.user,
        task.host,
        task.key_path.display()
    )))
}

fn connect_suggestion(e: &std::io::Error) -> Option<&'static str> {
    match e.kind() {
        std::io::ErrorKind::ConnectionRefused => Some("is sshd running on the target?"),
        std::io::ErrorKind::TimedOut => Some("check network connectivity and firewall rules"),
        std::io::ErrorKind::PermissionDenied => Some("check SSH key permissions"),
        _ => None,
    }
}
