//! Host manifest resolution.
//!
//! Browsers resolve a native messaging host identifier to an executable
//! through a small JSON manifest registered on the machine. This module
//! performs the same lookup: scan the configured directories (or the
//! per-platform browser locations) for `<host>.json`, parse it, and check
//! that it actually describes a stdio host with the requested name.
//!
//! On Windows the browsers register manifests in the registry rather than
//! in well-known directories, so resolution there requires explicit
//! `manifest_dirs` in the channel configuration.

use crate::config::ChannelConfig;
use crate::error::{ChannelError, ChannelResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A native messaging host manifest.
///
/// Mirrors the JSON format both Firefox and Chrome consume; fields the two
/// browsers disagree on (`allowed_extensions` vs `allowed_origins`) are
/// optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostManifest {
    /// Registered host name, must match the file's stem
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Absolute path of the host executable
    pub path: PathBuf,

    /// Connection type; only "stdio" exists today
    #[serde(rename = "type")]
    pub host_type: String,

    /// Firefox: extension IDs allowed to connect
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_extensions: Vec<String>,

    /// Chrome: extension origins allowed to connect
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_origins: Vec<String>,

    /// Where this manifest was loaded from; browsers hand the manifest
    /// location to the host as its first argument, so the connector needs
    /// it too.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Default manifest directories for the current platform.
///
/// Returns the user-scope locations Firefox, Chrome and Chromium read:
///
/// - **Linux**: `~/.mozilla/native-messaging-hosts/`,
///   `$XDG_CONFIG_HOME/{google-chrome,chromium}/NativeMessagingHosts/`
/// - **macOS**: `~/Library/Application Support/{Mozilla,Google/Chrome,Chromium}/NativeMessagingHosts/`
/// - **Windows**: empty (registry-based registration)
pub fn default_manifest_dirs() -> Vec<PathBuf> {
    let mut dirs_out = Vec::new();

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = dirs::home_dir() {
            dirs_out.push(home.join(".mozilla").join("native-messaging-hosts"));
        }
        if let Some(config) = dirs::config_dir() {
            dirs_out.push(config.join("google-chrome").join("NativeMessagingHosts"));
            dirs_out.push(config.join("chromium").join("NativeMessagingHosts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(support) = dirs::config_dir() {
            dirs_out.push(support.join("Mozilla").join("NativeMessagingHosts"));
            dirs_out.push(
                support
                    .join("Google")
                    .join("Chrome")
                    .join("NativeMessagingHosts"),
            );
            dirs_out.push(support.join("Chromium").join("NativeMessagingHosts"));
        }
    }

    dirs_out
}

/// Resolve a host identifier to its manifest.
///
/// Searches `config.manifest_dirs` if set, otherwise the platform
/// defaults, in order; the first `<host>.json` found wins.
///
/// # Errors
///
/// * [`ChannelError::ManifestNotFound`] if no directory contains the file
/// * [`ChannelError::Manifest`] if a found manifest cannot be parsed, names
///   a different host, or is not a stdio host
pub fn resolve(config: &ChannelConfig) -> ChannelResult<HostManifest> {
    let search_dirs = if config.manifest_dirs.is_empty() {
        default_manifest_dirs()
    } else {
        config.manifest_dirs.clone()
    };

    let file_name = format!("{}.json", config.host_name);

    for dir in &search_dirs {
        let candidate = dir.join(&file_name);
        if candidate.is_file() {
            return load(&candidate, &config.host_name);
        }
    }

    Err(ChannelError::ManifestNotFound {
        host: config.host_name.clone(),
        searched: search_dirs.len(),
    })
}

/// Load and validate a manifest file.
fn load(path: &std::path::Path, expected_name: &str) -> ChannelResult<HostManifest> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ChannelError::manifest(path.to_path_buf(), format!("unreadable: {}", e)))?;

    let mut manifest: HostManifest = serde_json::from_str(&content)
        .map_err(|e| ChannelError::manifest(path.to_path_buf(), format!("invalid JSON: {}", e)))?;
    manifest.source = Some(path.to_path_buf());

    if manifest.name != expected_name {
        return Err(ChannelError::manifest(
            path.to_path_buf(),
            format!(
                "manifest names host '{}', expected '{}'",
                manifest.name, expected_name
            ),
        ));
    }

    if manifest.host_type != "stdio" {
        return Err(ChannelError::manifest(
            path.to_path_buf(),
            format!("unsupported host type '{}'", manifest.host_type),
        ));
    }

    tracing::debug!(
        host = %manifest.name,
        path = %manifest.path.display(),
        manifest = %path.display(),
        "Resolved host manifest"
    );

    Ok(manifest)
}
