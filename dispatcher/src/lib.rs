//! TabRelay Dispatcher Crate
//!
//! Turns the browser-chrome action trigger into at most one command over
//! the native messaging channel: look up the active tab, apply the URL
//! policy, build `<verb> <args...> <url>`, send.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabrelay_channel::{ChannelConfig, ChannelManager, CommandSink};
//! use tabrelay_dispatcher::{CommandDispatcher, DispatcherConfig, TabInfo, WatchTabProvider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let manager = ChannelManager::new(ChannelConfig::default());
//!     manager.restart().await;
//!
//!     let (tabs, publisher) = WatchTabProvider::new();
//!     let dispatcher = CommandDispatcher::new(
//!         tabs,
//!         Arc::new(manager) as Arc<dyn CommandSink>,
//!         DispatcherConfig::default(),
//!     );
//!
//!     publisher.publish(Some(TabInfo::with_url("https://example.com/x")));
//!     dispatcher.on_action_triggered().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod command;
mod dispatcher;
mod tabs;

// Re-export public API
pub use command::CommandSpec;
pub use dispatcher::{CommandDispatcher, DispatchOutcome, DispatcherConfig};
pub use tabs::{ActiveTabProvider, TabInfo, TabPublisher, WatchTabProvider};
