use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "spectra_controller.json";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    /// Serial port name, e.g. "COM3" or "/dev/ttyUSB0"
    pub port: String,
    pub read_timeout_ms: u64,
    /// Seconds between background temperature reads, none to disable
    pub poll_interval_secs: Option<u64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            port: "COM3".to_string(),
            read_timeout_ms: 1000,
            poll_interval_secs: None,
        }
    }
}

impl ControllerConfig {
    /// Loads the config at `path`, or the defaults if there is no such file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config in {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }
}
