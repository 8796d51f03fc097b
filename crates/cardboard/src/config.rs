use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "CARDBOARD_CONFIG";

/// Engine configuration, loaded from YAML.
///
/// ```yaml
/// log_filter: "cardboard=debug,info"
/// sync:
///   correlation_timeout_ms: 30000
///   push_buffer: 64
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardboardConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    pub log_filter: String,
    pub sync: SyncConfig,
}

impl Default for CardboardConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            sync: SyncConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Reject a pending update after this long without an acknowledgment.
    /// Unset means pending updates wait indefinitely.
    pub correlation_timeout_ms: Option<u64>,
    /// Capacity of the server's state broadcast channel.
    pub push_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            correlation_timeout_ms: None,
            push_buffer: 64,
        }
    }
}

impl SyncConfig {
    pub fn correlation_timeout(&self) -> Option<Duration> {
        self.correlation_timeout_ms.map(Duration::from_millis)
    }
}

impl CardboardConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: CardboardConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config YAML {}", path.display()))?;

        if config.sync.push_buffer == 0 {
            anyhow::bail!("sync.push_buffer must be at least 1 in {}", path.display());
        }

        Ok(config)
    }

    /// Locate and load the configuration.
    ///
    /// `CARDBOARD_CONFIG` wins if set, and must point at a readable file.
    /// Otherwise `<config dir>/cardboard/config.yaml` is used when it exists,
    /// and the defaults when it doesn't.
    pub fn discover() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load_from_file(Path::new(&path));
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cardboard").join("config.yaml"))
    }
}
