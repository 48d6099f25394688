//! The command dispatcher.
//!
//! Translates one discrete user action into exactly one outbound command,
//! or a no-op: query the active tab, apply the URL policy, send.

use crate::command::CommandSpec;
use crate::tabs::ActiveTabProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tabrelay_channel::{CommandSink, SendOutcome};

/// Dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Command template applied to the accepted URL
    pub command: CommandSpec,

    /// URL prefix a tab must carry to be forwarded
    pub url_prefix: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            command: CommandSpec::default(),
            url_prefix: "https:".to_string(),
        }
    }
}

/// Decision taken for one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The command was sent; carries the exact string that went out.
    Sent(String),
    /// No active tab resolved.
    NoActiveTab,
    /// The tab's URL was absent or outside the allowed prefix.
    PolicyRejected,
    /// The command was built but the channel was not ready.
    Dropped(String),
}

/// Reacts to the action trigger by forwarding the active tab URL.
pub struct CommandDispatcher<P> {
    tabs: P,
    sink: Arc<dyn CommandSink>,
    config: DispatcherConfig,
}

impl<P: ActiveTabProvider> CommandDispatcher<P> {
    /// Create a dispatcher over a tab provider and a command sink.
    pub fn new(tabs: P, sink: Arc<dyn CommandSink>, config: DispatcherConfig) -> Self {
        Self { tabs, sink, config }
    }

    /// Handle one action trigger.
    ///
    /// Produces exactly zero or one outbound send. A send failure is
    /// logged and reported, never retried.
    ///
    /// # Errors
    ///
    /// Returns an error only when the tab lookup or the channel write
    /// itself fails; every policy decision is an `Ok` outcome.
    pub async fn on_action_triggered(&self) -> anyhow::Result<DispatchOutcome> {
        let tab = match self.tabs.active_tab().await {
            Ok(tab) => tab,
            Err(e) => {
                tracing::warn!(error = %e, "Active tab lookup failed");
                return Err(e);
            }
        };

        let Some(tab) = tab else {
            tracing::info!("Trigger ignored: no active tab");
            return Ok(DispatchOutcome::NoActiveTab);
        };

        let Some(url) = tab.url.as_deref().filter(|u| u.starts_with(&self.config.url_prefix))
        else {
            tracing::info!(
                url = tab.url.as_deref().unwrap_or("<none>"),
                prefix = %self.config.url_prefix,
                "Trigger ignored: tab URL outside policy"
            );
            return Ok(DispatchOutcome::PolicyRejected);
        };

        let command = self.config.command.build(url);
        match self.sink.send_command(&command).await {
            Ok(SendOutcome::Sent) => {
                tracing::info!(%command, "Command dispatched");
                Ok(DispatchOutcome::Sent(command))
            }
            Ok(SendOutcome::Dropped) => Ok(DispatchOutcome::Dropped(command)),
            Err(e) => {
                tracing::warn!(%command, error = %e, "Command send failed");
                Err(e)
            }
        }
    }
}
