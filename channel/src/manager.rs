//! The channel manager.
//!
//! Maintains exactly one live native messaging channel to a fixed host
//! identifier, recovering from disconnects through a fixed-delay reconnect.
//! All channel state lives in one mutex-guarded cell owned here; no other
//! component ever holds a port reference.

use crate::config::ChannelConfig;
use crate::error::ChannelResult;
use crate::manifest;
use crate::observer::{ChannelObserver, DisconnectReason, LogObserver};
use crate::port::{HostConnector, Port, ProcessConnector};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// What happened to a command handed to [`ChannelManager::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The command was written onto the live channel.
    Sent,
    /// No channel was connected; the command was dropped and logged.
    Dropped,
}

/// Outbound command seam between the dispatcher and the channel layer.
#[async_trait]
pub trait CommandSink: Send + Sync + 'static {
    /// Send one command string to the host, or drop it if no channel is
    /// ready.
    async fn send_command(&self, command: &str) -> anyhow::Result<SendOutcome>;
}

// Blanket implementation so Arc<dyn CommandSink> can be used wherever a
// concrete sink is expected.
#[async_trait]
impl CommandSink for Arc<dyn CommandSink> {
    async fn send_command(&self, command: &str) -> anyhow::Result<SendOutcome> {
        (**self).send_command(command).await
    }
}

/// Manager for a single native messaging channel.
///
/// Cheap to clone; clones share the same channel state.
///
/// # Example
///
/// ```rust,no_run
/// use tabrelay_channel::{ChannelConfig, ChannelManager};
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let manager = ChannelManager::new(ChannelConfig::default());
/// manager.restart().await;
/// // ... 2 seconds later the channel is live
/// manager.send("dostuff ytdl.exe https://example.com/x").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChannelManager {
    shared: Arc<Shared>,
}

struct Shared {
    config: ChannelConfig,
    connector: Arc<dyn HostConnector>,
    observer: Arc<dyn ChannelObserver>,
    inner: Mutex<Inner>,
}

/// The single-writer state cell.
struct Inner {
    port: Option<Port>,
    pending: Option<CancellationToken>,
    next_generation: u64,
}

impl ChannelManager {
    /// Create a manager that spawns the real host process and logs
    /// incoming traffic.
    pub fn new(config: ChannelConfig) -> Self {
        Self::with_parts(config, Arc::new(ProcessConnector), Arc::new(LogObserver))
    }

    /// Create a manager with an explicit connector and observer.
    ///
    /// This is the seam tests use to replace the host process with an
    /// in-memory pipe.
    pub fn with_parts(
        config: ChannelConfig,
        connector: Arc<dyn HostConnector>,
        observer: Arc<dyn ChannelObserver>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                connector,
                observer,
                inner: Mutex::new(Inner {
                    port: None,
                    pending: None,
                    next_generation: 0,
                }),
            }),
        }
    }

    /// Re-establish the channel.
    ///
    /// Closes the current channel if one exists (a close failure is logged
    /// and never prevents reconnection), cancels any pending reconnect,
    /// and schedules a fresh connect after the configured delay. Idempotent
    /// under rapid repeated calls: after the delay settles there is exactly
    /// one live channel.
    pub async fn restart(&self) {
        Shared::restart(&self.shared).await;
    }

    /// Send a command string over the current channel.
    ///
    /// Returns [`SendOutcome::Dropped`] (with a log line) when called in
    /// the reconnect window or before the first connect; an I/O failure on
    /// a live channel is returned as an error and not retried.
    pub async fn send(&self, command: &str) -> ChannelResult<SendOutcome> {
        let inner = self.shared.inner.lock().await;
        match &inner.port {
            Some(port) => {
                port.send(&Value::String(command.to_string())).await?;
                tracing::info!(command, "Sent command to host");
                Ok(SendOutcome::Sent)
            }
            None => {
                tracing::warn!(command, "Command dropped: channel not ready");
                Ok(SendOutcome::Dropped)
            }
        }
    }

    /// Whether a channel is currently connected.
    pub async fn connected(&self) -> bool {
        self.shared.inner.lock().await.port.is_some()
    }

    /// The channel configuration this manager runs with.
    pub fn config(&self) -> &ChannelConfig {
        &self.shared.config
    }
}

#[async_trait]
impl CommandSink for ChannelManager {
    async fn send_command(&self, command: &str) -> anyhow::Result<SendOutcome> {
        Ok(self.send(command).await?)
    }
}

impl Shared {
    async fn restart(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;

        // One pending reconnect at a time: withdraw the old timer before
        // scheduling a new one.
        if let Some(token) = inner.pending.take() {
            token.cancel();
        }

        if let Some(port) = inner.port.take() {
            if let Err(e) = port.close().await {
                tracing::warn!(
                    error = %e,
                    code = e.error_code(),
                    "Failed to close channel cleanly; reconnecting anyway"
                );
            }
        }

        let token = CancellationToken::new();
        inner.pending = Some(token.clone());
        drop(inner);

        let delay = Duration::from_millis(self.config.reconnect_delay_ms);
        tracing::info!(
            host = %self.config.host_name,
            delay_ms = self.config.reconnect_delay_ms,
            "Reconnect scheduled"
        );

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    shared.connect(token).await;
                }
            }
        });
    }

    /// Timer-fire path: open a new channel and publish it, unless a newer
    /// restart superseded this attempt while we were connecting.
    async fn connect(self: &Arc<Self>, token: CancellationToken) {
        let manifest = match manifest::resolve(&self.config) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::error!(
                    host = %self.config.host_name,
                    error = %e,
                    code = e.error_code(),
                    "Reconnect failed: host manifest unresolved"
                );
                self.clear_pending(&token).await;
                return;
            }
        };

        let io = match self.connector.connect(&manifest).await {
            Ok(io) => io,
            Err(e) => {
                tracing::error!(
                    host = %self.config.host_name,
                    error = %e,
                    code = e.error_code(),
                    "Reconnect failed: could not open channel"
                );
                self.clear_pending(&token).await;
                return;
            }
        };

        let mut inner = self.inner.lock().await;
        if token.is_cancelled() {
            // A newer restart owns the channel slot now.
            io.discard();
            return;
        }

        let generation = inner.next_generation;
        inner.next_generation += 1;

        let weak = Arc::downgrade(self);
        let port = Port::open(
            io,
            generation,
            self.config.max_message_size,
            Arc::clone(&self.observer),
            Box::new(move |generation, reason| {
                Shared::notify_stopped(&weak, generation, reason);
            }),
        );

        inner.port = Some(port);
        // An uncancelled token is necessarily the current pending one:
        // every newer restart cancels its predecessor.
        inner.pending = None;

        tracing::info!(
            host = %self.config.host_name,
            generation,
            "Channel connected"
        );
    }

    fn notify_stopped(weak: &Weak<Self>, generation: u64, reason: DisconnectReason) {
        if let Some(shared) = weak.upgrade() {
            tokio::spawn(async move {
                shared.handle_disconnect(generation, reason).await;
            });
        }
    }

    /// Reader-task-ended path. Ignores notifications from superseded port
    /// generations so an old channel's death can never touch its
    /// successor.
    async fn handle_disconnect(self: &Arc<Self>, generation: u64, reason: DisconnectReason) {
        let port = {
            let mut inner = self.inner.lock().await;
            match &inner.port {
                Some(port) if port.generation() == generation => inner.port.take(),
                _ => {
                    tracing::debug!(generation, "Ignoring disconnect from superseded channel");
                    return;
                }
            }
        };

        if let Some(port) = port {
            // Reap the dead process; its reader task already finished.
            if let Err(e) = port.close().await {
                tracing::debug!(error = %e, "Cleanup of disconnected channel failed");
            }
        }

        if self.config.auto_reconnect {
            tracing::info!(reason = reason.name(), "Reconnecting after disconnect");
            Shared::restart(self).await;
        }
    }

    async fn clear_pending(self: &Arc<Self>, token: &CancellationToken) {
        let mut inner = self.inner.lock().await;
        if !token.is_cancelled() {
            inner.pending = None;
        }
    }
}
