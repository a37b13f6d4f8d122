//! TOML run configuration.
//!
//! Every section has compiled-in defaults, so an empty or partial file is
//! valid. The file path comes from `--config`, then the `NETTEST_CONFIG`
//! environment variable, then defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "NETTEST_CONFIG";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for a test run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub probes: ProbeConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RunConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load from an explicit path, else from `NETTEST_CONFIG`, else defaults.
    /// A named file that cannot be loaded is an error either way.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        Self::resolve_with(explicit, std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    fn resolve_with(explicit: Option<&Path>, from_env: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match from_env {
            Some(path) => Self::load(&path)
                .with_context(|| format!("{CONFIG_ENV} names a config file that could not be loaded")),
            None => Ok(Self::default()),
        }
    }

    /// The config file `resolve` would read, for logging once tracing is up.
    pub fn source(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }
}

// ---------------------------------------------------------------------------
// Probes
// ---------------------------------------------------------------------------

/// Probe tool locations and latency-test defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Path (or bare command name resolved via `$PATH`) to ping.
    pub ping_path: String,
    /// Seconds between echo requests (`ping -i`).
    pub ping_interval_secs: f64,
    /// Echo requests per latency test when the row leaves `count` blank.
    pub default_count: u32,
    /// Payload bytes per echo request when the row leaves `size` blank.
    pub default_size: u32,
    /// Path (or bare command name) to iperf3.
    pub iperf3_path: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_path: "ping".to_string(),
            ping_interval_secs: 0.2,
            default_count: 10,
            default_size: 56,
            iperf3_path: "iperf3".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Remote
// ---------------------------------------------------------------------------

/// How tests on other hosts are launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Path (or bare command name) to the ssh client.
    pub ssh_path: String,
    /// `ssh -o ConnectTimeout=` value in seconds.
    pub connect_timeout_secs: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            ssh_path: "ssh".to_string(),
            connect_timeout_secs: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level written to the run's log file.
    pub level: String,
    /// Minimum level printed to the console. `RUST_LOG` overrides this.
    pub console_level: String,
    /// Write the log file as JSON lines instead of plain text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_level: "warn".to_string(),
            json: false,
        }
    }
}
