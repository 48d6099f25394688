//! Configuration for the channel manager.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the native messaging channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Registered name of the native messaging host to connect to
    pub host_name: String,

    /// Delay before a reconnect attempt, in milliseconds.
    ///
    /// The host process may need time to release OS-level resources
    /// (pipes) before a new connection attempt can succeed. This single
    /// fixed delay is the entire retry policy.
    pub reconnect_delay_ms: u64,

    /// Maximum frame size in bytes, applied in both directions
    /// (1MB is the browser limit for host-to-extension messages)
    pub max_message_size: usize,

    /// Reconnect automatically when the peer closes the channel
    pub auto_reconnect: bool,

    /// Directories to search for host manifests.
    ///
    /// Empty means the per-platform browser locations. On Windows the
    /// browsers keep manifest registrations in the registry, so this must
    /// be set explicitly there.
    pub manifest_dirs: Vec<PathBuf>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            host_name: "rsio".to_string(),
            reconnect_delay_ms: 2_000,
            max_message_size: 1_048_576,
            auto_reconnect: true,
            manifest_dirs: Vec::new(),
        }
    }
}

impl ChannelConfig {
    /// Load configuration from a file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file (TOML or JSON)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&content)?
        } else {
            // Default to JSON
            serde_json::from_str(&content)?
        };

        Ok(config)
    }

    /// Save configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();

        let content = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::to_string_pretty(self)?
        } else {
            // Default to JSON
            serde_json::to_string_pretty(self)?
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host_name.is_empty() {
            return Err(anyhow::anyhow!("host_name must not be empty"));
        }

        // Host names follow the browser rules: dot-separated lowercase
        // segments of alphanumerics, hyphens and underscores.
        if !self
            .host_name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-".contains(c))
        {
            return Err(anyhow::anyhow!(
                "host_name may only contain lowercase alphanumerics, dots, hyphens and underscores"
            ));
        }

        if self.max_message_size == 0 {
            return Err(anyhow::anyhow!("max_message_size must be greater than 0"));
        }

        Ok(())
    }
}
