//! Host registry: which ssh username to use for each source host.
//!
//! ```toml
//! [[hosts]]
//! hostname = "probe-a"
//! username = "netops"
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read host registry {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse host registry {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("host registry lists '{hostname}' more than once")]
    DuplicateHost { hostname: String },

    #[error("host registry entry '{hostname}' has an empty username")]
    EmptyUsername { hostname: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("source host '{0}' is not in the host registry")]
    UnknownHost(String),

    #[error("source host(s) missing from the host registry: {}", .0.join(", "))]
    MissingHosts(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostEntry {
    pub hostname: String,
    pub username: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostRegistry {
    #[serde(default)]
    hosts: Vec<HostEntry>,
}

impl HostRegistry {
    /// Build a registry from entries, rejecting duplicate hostnames.
    pub fn from_entries(hosts: Vec<HostEntry>) -> Result<Self, RegistryError> {
        let mut seen = BTreeSet::new();
        for entry in &hosts {
            if !seen.insert(entry.hostname.as_str()) {
                return Err(RegistryError::DuplicateHost {
                    hostname: entry.hostname.clone(),
                });
            }
            if entry.username.trim().is_empty() {
                return Err(RegistryError::EmptyUsername {
                    hostname: entry.hostname.clone(),
                });
            }
        }
        Ok(Self { hosts })
    }

    pub fn parse(content: &str, origin: &str) -> Result<Self, RegistryError> {
        let raw: HostRegistry = toml::from_str(content).map_err(|source| RegistryError::Parse {
            path: origin.to_string(),
            source,
        })?;
        Self::from_entries(raw.hosts)
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let registry = Self::parse(&content, &path.display().to_string())?;
        info!(path = %path.display(), hosts = registry.len(), "loaded host registry");
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// The registered username for `source`.
    pub fn username_for(&self, source: &str) -> Result<&str, LookupError> {
        self.hosts
            .iter()
            .find(|h| h.hostname == source)
            .map(|h| h.username.as_str())
            .ok_or_else(|| LookupError::UnknownHost(source.to_string()))
    }

    /// Check every source up front, reporting all that are missing.
    pub fn check_sources<'a>(
        &self,
        sources: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), LookupError> {
        let missing: BTreeSet<&str> = sources
            .into_iter()
            .filter(|s| self.username_for(s).is_err())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LookupError::MissingHosts(
                missing.into_iter().map(str::to_string).collect(),
            ))
        }
    }
}
