//! procrelay - supervisor event relay
//!
//! CLI entry point: relays bus records from stdin to chat webhooks.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use procrelay::cli::{Cli, Command, get_log_path};
use procrelay::config::Config;
use procrelay::dispatch::{DispatchOutcome, Dispatcher, HttpPasteSink, HttpTransport};
use procrelay::domain::{EventKind, QueuedMessage, now_secs};
use procrelay::relay::DrainLoop;
use procrelay::source::{JsonLinesSource, subscribed_streams};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref())
        .context("Failed to load configuration")?
        .validate()?;

    info!(name = %config.relay.name, "procrelay loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Test { kind, process, message }) => cmd_test(&config, &kind, &process, &message).await,
        Some(Command::Run) | None => cmd_run(&config).await,
    }
}

fn build_dispatcher(config: &Config) -> Dispatcher {
    debug!("build_dispatcher: called");
    let relay = Arc::new(config.relay.clone());
    let dispatcher = Dispatcher::new(relay, Arc::new(HttpTransport::new()));

    match &config.paste.url {
        Some(url) => {
            debug!(%url, "build_dispatcher: paste sink configured");
            dispatcher.with_paste(Arc::new(HttpPasteSink::new(url.clone())), config.paste.language.clone())
        }
        None => dispatcher,
    }
}

/// Relay stdin bus records until interrupted
async fn cmd_run(config: &Config) -> Result<()> {
    debug!("cmd_run: called");
    if config.relay.default_webhook.is_none() && config.relay.events.values().all(|e| e.webhook.is_none()) {
        warn!("No webhook configured, notifications will be skipped");
        eprintln!("Warning: no webhook configured, notifications will be skipped");
    }

    let relay = Arc::new(config.relay.clone());
    let streams = subscribed_streams(&relay);
    info!(?streams, "Subscribing to supervisor streams");

    let dispatcher = Arc::new(build_dispatcher(config));
    let source = JsonLinesSource::stdin(&streams);
    let drain = DrainLoop::new(relay, dispatcher, source);

    tokio::select! {
        () = drain.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Received Ctrl-C, shutting down");
        }
    }

    Ok(())
}

/// Print the effective configuration
fn cmd_check_config(config: &Config) -> Result<()> {
    debug!("cmd_check_config: called");
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    println!("{}", yaml);
    Ok(())
}

/// Send one notification straight through the dispatcher
async fn cmd_test(config: &Config, kind: &str, process: &str, message: &str) -> Result<()> {
    debug!(%kind, %process, "cmd_test: called");
    let dispatcher = build_dispatcher(config);
    let msg = QueuedMessage::new(process, EventKind::from(kind), message, now_secs());

    match dispatcher.send(&msg).await {
        DispatchOutcome::Sent => {
            println!("Sent {} notification for {}", msg.kind, msg.name);
            Ok(())
        }
        DispatchOutcome::Skipped => Err(eyre!("No webhook configured for kind '{}'", msg.kind)),
        DispatchOutcome::Rejected { status } => Err(eyre!("Webhook rejected notification with status {}", status)),
        DispatchOutcome::Failed(e) => Err(eyre!("Webhook delivery failed: {}", e)),
    }
}
