//! Probe commands: building them, running them, and parsing what they print.

pub mod iperf;
pub mod ping;
pub mod runner;
pub mod ssh;

pub use self::runner::{CommandRunner, ExecutionOutcome, ShellRunner};

use thiserror::Error;
use tracing::{debug, info};

use crate::batch::{self, TestKind, TestSpec};
use crate::config::{ProbeConfig, RemoteConfig};
use crate::hosts::{HostRegistry, LocalIdentity};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid {role} host '{host}': {reason}")]
    InvalidHost {
        role: &'static str,
        host: String,
        reason: &'static str,
    },

    #[error("invalid ssh username '{0}'")]
    InvalidUsername(String),

    #[error("no registered username for source '{0}'")]
    NoUsername(String),

    #[error("command cannot be quoted for remote execution: {0}")]
    Unquotable(String),
}

/// Everything command building needs besides the `TestSpec` itself.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub identity: &'a LocalIdentity,
    pub registry: &'a HostRegistry,
    pub probes: &'a ProbeConfig,
    pub remote: &'a RemoteConfig,
}

/// Build the exact shell command for `spec`, wrapped in ssh when the source
/// is not this machine.
pub fn build_command(spec: &TestSpec, ctx: CommandContext<'_>) -> Result<String, BuildError> {
    validate_host("destination", &spec.destination)?;
    let probe = probe_command(spec, ctx.probes);

    if ctx.identity.is_local(&spec.source) {
        info!(
            id = spec.id_number,
            source = %spec.source,
            "source matches local machine; test will run locally"
        );
        return Ok(probe);
    }

    validate_host("source", &spec.source)?;
    let username = ctx
        .registry
        .username_for(&spec.source)
        .map_err(|_| BuildError::NoUsername(spec.source.clone()))?;
    info!(
        id = spec.id_number,
        source = %spec.source,
        "source is not the local machine; wrapping command in ssh"
    );
    ssh::wrap_remote(&probe, username, &spec.source, ctx.remote)
}

/// The probe invocation itself, before any remote wrapping.
pub fn probe_command(spec: &TestSpec, probes: &ProbeConfig) -> String {
    let cmd = match &spec.kind {
        TestKind::Latency { count, size } => format!(
            "{} -c {} -i {} -s {} {}",
            probes.ping_path, count, probes.ping_interval_secs, size, spec.destination
        ),
        TestKind::Throughput { size } => format!(
            "{} -c {} -n {} -4 --json",
            probes.iperf3_path, spec.destination, size
        ),
        TestKind::Jitter => format!("{} -c {} -u -4 --json", probes.iperf3_path, spec.destination),
    };
    debug!(id = spec.id_number, command = %cmd, "built probe command");
    cmd
}

/// Same host rules the validator applies; specs built by hand skip validation.
fn validate_host(role: &'static str, host: &str) -> Result<(), BuildError> {
    batch::check_host(host).map_err(|reason| BuildError::InvalidHost {
        role,
        host: host.to_string(),
        reason,
    })
}
