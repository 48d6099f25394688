//! Dispatcher decision-path tests.
//!
//! The channel is replaced by a recording sink so every outbound send is
//! observable, and tab lookups come from canned providers.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tabrelay_channel::{CommandSink, SendOutcome};
use tabrelay_dispatcher::{
    ActiveTabProvider, CommandDispatcher, CommandSpec, DispatchOutcome, DispatcherConfig, TabInfo,
    WatchTabProvider,
};

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<String>>,
    /// When true, report the channel as not ready
    not_ready: AtomicBool,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandSink for RecordingSink {
    async fn send_command(&self, command: &str) -> anyhow::Result<SendOutcome> {
        if self.not_ready.load(Ordering::SeqCst) {
            return Ok(SendOutcome::Dropped);
        }
        self.sent.lock().unwrap().push(command.to_string());
        Ok(SendOutcome::Sent)
    }
}

struct FixedTabProvider(Option<TabInfo>);

#[async_trait]
impl ActiveTabProvider for FixedTabProvider {
    async fn active_tab(&self) -> anyhow::Result<Option<TabInfo>> {
        Ok(self.0.clone())
    }
}

struct FailingTabProvider;

#[async_trait]
impl ActiveTabProvider for FailingTabProvider {
    async fn active_tab(&self) -> anyhow::Result<Option<TabInfo>> {
        Err(anyhow::anyhow!("tab query failed"))
    }
}

fn dispatcher_for(
    tab: Option<TabInfo>,
    sink: Arc<RecordingSink>,
    config: DispatcherConfig,
) -> CommandDispatcher<FixedTabProvider> {
    CommandDispatcher::new(FixedTabProvider(tab), sink, config)
}

#[tokio::test]
async fn test_https_tab_sends_exactly_one_command() {
    // Scenario A
    let sink = RecordingSink::new();
    let dispatcher = dispatcher_for(
        Some(TabInfo::with_url("https://example.com/x")),
        sink.clone(),
        DispatcherConfig::default(),
    );

    let outcome = dispatcher.on_action_triggered().await.unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Sent("dostuff ytdl.exe https://example.com/x".to_string())
    );
    assert_eq!(sink.sent(), vec!["dostuff ytdl.exe https://example.com/x"]);
}

#[tokio::test]
async fn test_http_tab_sends_nothing() {
    // Scenario B
    let sink = RecordingSink::new();
    let dispatcher = dispatcher_for(
        Some(TabInfo::with_url("http://example.com/x")),
        sink.clone(),
        DispatcherConfig::default(),
    );

    let outcome = dispatcher.on_action_triggered().await.unwrap();
    assert_eq!(outcome, DispatchOutcome::PolicyRejected);
    assert!(sink.sent().is_empty());
}

#[tokio::test]
async fn test_tab_without_url_sends_nothing() {
    let sink = RecordingSink::new();
    let dispatcher = dispatcher_for(
        Some(TabInfo {
            url: None,
            title: Some("New Tab".to_string()),
        }),
        sink.clone(),
        DispatcherConfig::default(),
    );

    let outcome = dispatcher.on_action_triggered().await.unwrap();
    assert_eq!(outcome, DispatchOutcome::PolicyRejected);
    assert!(sink.sent().is_empty());
}

#[tokio::test]
async fn test_no_active_tab_is_a_quiet_no_op() {
    // Scenario C: no tab resolved, no command, no fault
    let sink = RecordingSink::new();
    let dispatcher = dispatcher_for(None, sink.clone(), DispatcherConfig::default());

    let outcome = dispatcher.on_action_triggered().await.unwrap();
    assert_eq!(outcome, DispatchOutcome::NoActiveTab);
    assert!(sink.sent().is_empty());
}

#[tokio::test]
async fn test_mirror_verb_is_configuration() {
    let sink = RecordingSink::new();
    let config = DispatcherConfig {
        command: CommandSpec::mirror(),
        ..DispatcherConfig::default()
    };
    let dispatcher = dispatcher_for(
        Some(TabInfo::with_url("https://example.com/x")),
        sink.clone(),
        config,
    );

    let outcome = dispatcher.on_action_triggered().await.unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Sent("mirror https://example.com/x".to_string())
    );
    assert_eq!(sink.sent(), vec!["mirror https://example.com/x"]);
}

#[tokio::test]
async fn test_channel_not_ready_reports_dropped() {
    let sink = RecordingSink::new();
    sink.not_ready.store(true, Ordering::SeqCst);
    let dispatcher = dispatcher_for(
        Some(TabInfo::with_url("https://example.com/x")),
        sink.clone(),
        DispatcherConfig::default(),
    );

    let outcome = dispatcher.on_action_triggered().await.unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Dropped("dostuff ytdl.exe https://example.com/x".to_string())
    );
    assert!(sink.sent().is_empty());
}

#[tokio::test]
async fn test_provider_failure_surfaces_as_error_without_send() {
    let sink = RecordingSink::new();
    let dispatcher = CommandDispatcher::new(
        FailingTabProvider,
        sink.clone() as Arc<dyn CommandSink>,
        DispatcherConfig::default(),
    );

    assert!(dispatcher.on_action_triggered().await.is_err());
    assert!(sink.sent().is_empty());
}

#[tokio::test]
async fn test_each_trigger_queries_fresh_tab_state() {
    let sink = RecordingSink::new();
    let (provider, publisher) = WatchTabProvider::new();
    let dispatcher = CommandDispatcher::new(
        provider,
        sink.clone() as Arc<dyn CommandSink>,
        DispatcherConfig::default(),
    );

    publisher.publish(Some(TabInfo::with_url("https://example.com/first")));
    dispatcher.on_action_triggered().await.unwrap();

    publisher.publish(Some(TabInfo::with_url("https://example.com/second")));
    dispatcher.on_action_triggered().await.unwrap();

    publisher.publish(Some(TabInfo::with_url("http://example.com/third")));
    dispatcher.on_action_triggered().await.unwrap();

    assert_eq!(
        sink.sent(),
        vec![
            "dostuff ytdl.exe https://example.com/first",
            "dostuff ytdl.exe https://example.com/second",
        ]
    );
}
