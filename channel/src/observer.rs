//! Channel observer contract.
//!
//! The message handler and the disconnect handler are two methods on one
//! trait object, so they are always bound to a channel together and dropped
//! together when that channel dies; a half-registered state cannot exist.

use serde_json::Value;
use std::fmt;

/// Why a channel stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The host closed its end of the pipe cleanly.
    PeerClosed,
    /// The host sent something the wire format cannot carry.
    Protocol(String),
    /// Reading from the pipe failed.
    Io(String),
}

impl DisconnectReason {
    /// Identifying name of the reason, the part that gets logged.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PeerClosed => "PeerClosed",
            Self::Protocol(_) => "Protocol",
            Self::Io(_) => "Io",
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => write!(f, "PeerClosed"),
            Self::Protocol(detail) => write!(f, "Protocol: {}", detail),
            Self::Io(detail) => write!(f, "Io: {}", detail),
        }
    }
}

/// Observer for events on a live channel.
///
/// One observer object is bound to each channel instance when it connects
/// and is released when that instance disconnects. Implementations must not
/// panic: any payload shape is accepted.
pub trait ChannelObserver: Send + Sync + 'static {
    /// Called for every payload the host sends.
    fn on_message(&self, payload: &Value);

    /// Called once when the channel stops, after which no further calls
    /// are made on this binding.
    fn on_disconnect(&self, reason: &DisconnectReason);
}

/// Observer that logs and does nothing else.
///
/// Host replies are not interpreted; receipt and payload are logged, and a
/// disconnect is logged with the reason's name.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ChannelObserver for LogObserver {
    fn on_message(&self, payload: &Value) {
        tracing::info!(%payload, "Received message from host");
    }

    fn on_disconnect(&self, reason: &DisconnectReason) {
        tracing::info!(reason = reason.name(), detail = %reason, "Host disconnected");
    }
}
