//! rsmd.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rsm_slicing::OrchestratorConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RsmConfig {
    pub server: ServerConfig,
    pub state: StateConfig,
    pub slicing: SlicingConfig,
    pub ran: RanConfig,
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8443 }
    }
}

/// Where slice state lives. No `data_dir` means an in-memory store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicingConfig {
    pub queue_capacity: usize,
    pub request_timeout_ms: u64,
    pub slice_id_reuse: bool,
}

impl Default for SlicingConfig {
    fn default() -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            queue_capacity: defaults.queue_capacity,
            request_timeout_ms: defaults.request_timeout.as_millis() as u64,
            slice_id_reuse: defaults.slice_id_reuse,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RanConfig {
    /// Simulated round-trip of the loopback RAN.
    pub latency_ms: u64,
}

/// A node registered at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub address: String,
}

impl RsmConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RsmConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            queue_capacity: self.slicing.queue_capacity,
            request_timeout: Duration::from_millis(self.slicing.request_timeout_ms),
            slice_id_reuse: self.slicing.slice_id_reuse,
        }
    }

    pub fn ran_latency(&self) -> Duration {
        Duration::from_millis(self.ran.latency_ms)
    }
}
