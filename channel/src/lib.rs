//! TabRelay Channel Crate
//!
//! Browser-side client for a native messaging host: owns the lifecycle of
//! a single channel to a locally installed helper process, recovering from
//! disconnects with a fixed-delay reconnect.
//!
//! # Architecture
//!
//! - [`ChannelManager`] — connect/disconnect/reconnect lifecycle, guarded
//!   send, exactly one live channel at any time
//! - [`ChannelObserver`] — message and disconnect handlers bound to each
//!   channel instance as a pair
//! - [`HostConnector`] — connection seam; [`ProcessConnector`] spawns the
//!   host executable resolved from its manifest, tests substitute
//!   in-memory pipes
//! - `frame` — the Chrome/Firefox native messaging wire format
//!
//! # Usage
//!
//! ```rust,no_run
//! use tabrelay_channel::{ChannelConfig, ChannelManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let manager = ChannelManager::new(ChannelConfig::default());
//!     manager.restart().await;
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//!     manager.send("dostuff ytdl.exe https://example.com/x").await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod config;
mod error;
pub mod frame;
mod manager;
pub mod manifest;
mod observer;
mod port;

// Re-export public API
pub use config::ChannelConfig;
pub use error::{ChannelError, ChannelResult};
pub use manager::{ChannelManager, CommandSink, SendOutcome};
pub use manifest::HostManifest;
pub use observer::{ChannelObserver, DisconnectReason, LogObserver};
pub use port::{HostConnector, HostIo, ProcessConnector};
