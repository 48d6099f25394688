//! Active tab lookup.
//!
//! The dispatcher never caches tab state; it asks an [`ActiveTabProvider`]
//! for the active tab of the focused window at the moment of each trigger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// A snapshot of one browser tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    /// Full URL of the tab, absent while nothing has loaded
    pub url: Option<String>,

    /// Tab title, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TabInfo {
    /// Tab with a URL and no title.
    pub fn with_url<S: Into<String>>(url: S) -> Self {
        Self {
            url: Some(url.into()),
            title: None,
        }
    }
}

/// Source of the currently active tab.
///
/// The lookup is asynchronous; `Ok(None)` means no tab resolved, which is
/// a normal outcome and not an error.
#[async_trait]
pub trait ActiveTabProvider: Send + Sync + 'static {
    /// The active tab in the currently focused window, queried fresh.
    async fn active_tab(&self) -> anyhow::Result<Option<TabInfo>>;
}

// Blanket implementation so Arc<dyn ActiveTabProvider> can stand in for a
// concrete provider.
#[async_trait]
impl ActiveTabProvider for Arc<dyn ActiveTabProvider> {
    async fn active_tab(&self) -> anyhow::Result<Option<TabInfo>> {
        (**self).active_tab().await
    }
}

/// Provider backed by a watch cell.
///
/// Whatever front end knows the current tab publishes it here; the
/// dispatcher reads the freshest value on every trigger.
#[derive(Clone)]
pub struct WatchTabProvider {
    receiver: watch::Receiver<Option<TabInfo>>,
}

/// Writer half of a [`WatchTabProvider`].
#[derive(Clone)]
pub struct TabPublisher {
    sender: Arc<watch::Sender<Option<TabInfo>>>,
}

impl WatchTabProvider {
    /// Create a provider with no active tab, plus its publisher.
    pub fn new() -> (Self, TabPublisher) {
        let (sender, receiver) = watch::channel(None);
        (
            Self { receiver },
            TabPublisher {
                sender: Arc::new(sender),
            },
        )
    }
}

impl TabPublisher {
    /// Replace the current active tab snapshot.
    pub fn publish(&self, tab: Option<TabInfo>) {
        // Receivers only ever read the latest value; send failure just
        // means every provider is gone.
        let _ = self.sender.send(tab);
    }
}

#[async_trait]
impl ActiveTabProvider for WatchTabProvider {
    async fn active_tab(&self) -> anyhow::Result<Option<TabInfo>> {
        Ok(self.receiver.borrow().clone())
    }
}
