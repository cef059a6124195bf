// Volley - parallel remote command runner
//
// Loads a host list, fans a single command out over SSH through a bounded
// worker pool, and reports per-host outcomes plus a final recap.

pub mod exec;
pub mod hostlist;
pub mod output;
pub mod store;

pub use exec::{Runner, RunnerConfig, SshClient, TaskSpec};
pub use hostlist::Host;
pub use output::{HostReport, OutputFormat, OutputWriter, ReportSink, RunSummary, VolleyError};
pub use store::{FileStore, MemoryStore, OutputStore};

/// Version of the volley tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::exec::{RemoteExec, Runner, RunnerConfig, SshClient, TaskSpec};
    pub use crate::hostlist::Host;
    pub use crate::output::{HostReport, OutputWriter, ReportSink, RunSummary, VolleyError};
    pub use crate::store::{FileStore, OutputStore};
}
