//! Relay binary entry point.
//!
//! Wires the channel manager and the command dispatcher together behind a
//! small CLI. The browser toolbar button is an external collaborator, so
//! the trigger is stood in for by stdin: each line is taken as the current
//! active tab URL and counts as one action trigger.

mod config;

use clap::Parser;
use config::RelayConfig;
use std::sync::Arc;
use tabrelay_channel::{ChannelManager, CommandSink};
use tabrelay_dispatcher::{CommandDispatcher, TabInfo, WatchTabProvider};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Command line arguments for the relay
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML or JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Override the native messaging host name
    #[arg(long)]
    host: Option<String>,

    /// Override the command verb (e.g. "mirror")
    #[arg(long)]
    verb: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        // stdin/stdout belong to the trigger loop
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("TabRelay starting");

    // Load configuration
    let mut config = if let Some(config_path) = args.config {
        tracing::info!("Loading configuration from: {}", config_path);
        RelayConfig::from_file(&config_path)?
    } else {
        tracing::info!("Using default configuration");
        RelayConfig::default()
    };

    if let Some(host) = args.host {
        config.channel.host_name = host;
    }
    if let Some(verb) = args.verb {
        config.dispatcher.command.verb = verb;
        // Fixed arguments belong to the default verb, not the override
        config.dispatcher.command.args.clear();
    }
    config.validate()?;

    tracing::info!(
        host = %config.channel.host_name,
        verb = %config.dispatcher.command.verb,
        "Configuration ready"
    );

    // One startup restart establishes the channel; afterwards the manager
    // recovers on its own (auto_reconnect) or on explicit request.
    let manager = ChannelManager::new(config.channel.clone());
    manager.restart().await;

    let (tabs, publisher) = WatchTabProvider::new();
    let dispatcher = CommandDispatcher::new(
        tabs,
        Arc::new(manager.clone()) as Arc<dyn CommandSink>,
        config.dispatcher.clone(),
    );

    tracing::info!("Reading tab URLs from stdin; 'quit' exits, 'restart' recycles the channel");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" => break,
            "restart" => {
                manager.restart().await;
                continue;
            }
            url => {
                publisher.publish(Some(TabInfo::with_url(url)));
                if let Err(e) = dispatcher.on_action_triggered().await {
                    tracing::warn!(error = %e, "Trigger handling failed");
                }
            }
        }
    }

    tracing::info!("TabRelay exiting");
    Ok(())
}
