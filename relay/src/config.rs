//! Relay application configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tabrelay_channel::ChannelConfig;
use tabrelay_dispatcher::DispatcherConfig;

/// Combined configuration for the relay binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Channel manager settings
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Dispatcher settings
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

impl RelayConfig {
    /// Load configuration from a file (TOML or JSON by extension).
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

    /// Validate both halves of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any setting is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.channel.validate()?;
        if self.dispatcher.command.verb.is_empty() {
            return Err(anyhow::anyhow!("dispatcher command verb must not be empty"));
        }
        if self.dispatcher.url_prefix.is_empty() {
            return Err(anyhow::anyhow!("dispatcher url_prefix must not be empty"));
        }
        Ok(())
    }
}
