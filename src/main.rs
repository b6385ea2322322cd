//! CLI entry point for the adaptive panel.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use dotenvy::dotenv;
use futures_util::StreamExt;
use tracing::warn;

mod classifier;
mod config;
mod core;
mod intent;
mod logging;
mod panel;
mod plugins;
mod protocol;
mod registry;
mod replay;
mod selfcheck;

use crate::classifier::{Strategy, classifier_for};
use crate::config::Config;
use crate::core::engine::{PanelHandle, spawn_engine};
use crate::core::events::PanelEvent;
use crate::registry::build_registry;
use crate::replay::{ReplayItem, ndjson_events, open_input};

#[derive(Parser, Debug)]
#[command(
    name = "agui-panel",
    author,
    version,
    about = "Adaptive-UI intent pipeline for contact-center agent event streams",
    long_about = "Consumes an AG-UI event stream, classifies each finalized turn \
    into a component intent, and drives the single-slot adaptive panel.\n\n\
    Events are read as newline-delimited JSON from a file or stdin."
)]
struct Cli {
    /// Subcommand to run (defaults to `run`)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Consume an event stream and print panel transitions
    Run {
        /// NDJSON event file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Override the configured classifier strategy
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
    },

    /// Run the startup self-check and exit non-zero on failure
    Check,

    /// List registered plugins in registration order
    Plugins,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config_path = cli.config.clone();
    match cli.command.unwrap_or(Commands::Run {
        input: None,
        strategy: None,
    }) {
        Commands::Run { input, strategy } => run(config_path, input, strategy).await,
        Commands::Check => check(config_path),
        Commands::Plugins => list_plugins(config_path),
    }
}

/// Drive the panel from a replayed or live-piped event stream.
async fn run(
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    strategy: Option<Strategy>,
) -> Result<()> {
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(strategy) = strategy {
        config.strategy = strategy;
    }

    let registry = Arc::new(build_registry(&config.plugins)?);
    println!(
        "{} {} strategy, {} plugin(s)",
        "agui-panel:".bold(),
        config.strategy.as_str(),
        registry.len()
    );

    let classifier = classifier_for(config.strategy, &registry);
    let (handle, mut rx_event) = spawn_engine(config.engine_config(), registry, classifier);

    let feeder = tokio::spawn(feed_events(handle.clone(), input));

    while let Some(event) = rx_event.recv().await {
        if matches!(event, PanelEvent::StreamEnded) {
            break;
        }
        print_event(&event);
    }

    feeder.await??;
    print_summary(&handle);
    Ok(())
}

/// Read NDJSON events and submit them to the engine.
///
/// End-of-stream is signalled on every exit path, including errors, so the
/// event consumer never waits on a stream that will not end.
async fn feed_events(handle: PanelHandle, input: Option<PathBuf>) -> Result<()> {
    let result = feed_events_inner(&handle, input).await;
    let _ = handle.end_of_stream().await;
    result
}

async fn feed_events_inner(handle: &PanelHandle, input: Option<PathBuf>) -> Result<()> {
    let reader = open_input(input.as_deref()).await?;
    let stream = ndjson_events(reader);
    tokio::pin!(stream);

    while let Some(item) = stream.next().await {
        match item? {
            ReplayItem::Event(raw) => {
                if handle.send_event(raw).await.is_err() {
                    break;
                }
            }
            ReplayItem::Unparsable { line_no, error } => {
                warn!(line = line_no, %error, "skipping unparsable input line");
            }
        }
    }
    Ok(())
}

fn print_event(event: &PanelEvent) {
    match event {
        PanelEvent::TurnFinalized { seq, utterance } => {
            println!("{} {seq}: {utterance}", "turn".bold());
        }
        PanelEvent::ComponentShown { component, .. } => {
            println!(
                "{} {} (id {})",
                "show".green().bold(),
                component.kind,
                component.id
            );
            if !component.props.is_empty() {
                println!(
                    "        props: {}",
                    serde_json::Value::Object(component.props.clone())
                );
            }
        }
        PanelEvent::IntentRejected { error, .. } => {
            println!("{} {error}", "error".red().bold());
        }
        PanelEvent::PanelCleared => {
            println!("{}", "panel cleared".bold());
        }
        PanelEvent::EventDropped { reason } => {
            println!("{} {reason}", "drop".yellow().bold());
        }
        PanelEvent::ClassificationFailed { seq, reason } => {
            println!("{} turn {seq}: {reason}", "skip".yellow().bold());
        }
        PanelEvent::ClassificationDiscarded { seq } => {
            println!("{} stale result for turn {seq}", "drop".yellow());
        }
        PanelEvent::Passthrough { event } => {
            let kind = event
                .get("type")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("?");
            println!("{} {kind}", "passthrough".dimmed());
        }
        PanelEvent::StreamEnded => {}
    }
}

fn print_summary(handle: &PanelHandle) {
    let snapshot = handle.snapshot();
    println!("{}", "stream ended".bold());
    match &snapshot.current {
        Some(component) => println!("  panel: {} (id {})", component.kind, component.id),
        None => println!("  panel: empty"),
    }
    if let Some(error) = &snapshot.last_error {
        println!("  last error ({}): {error}", error.at().to_rfc3339());
    }
    if snapshot.dropped_events > 0 {
        println!("  dropped events: {}", snapshot.dropped_events);
    }
}

/// Startup self-check; the exit code is the supervisor's signal.
fn check(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    let report = selfcheck::run_self_check(&config);
    print!("{}", report.render());
    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn list_plugins(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    let registry = build_registry(&config.plugins)?;

    println!(
        "{} {} plugin(s), {} strategy",
        "registered:".bold(),
        registry.len(),
        config.strategy.as_str()
    );
    for seed in &config.plugins {
        let keywords = if seed.keywords.is_empty() {
            "(no triggers)".dimmed().to_string()
        } else {
            seed.keywords.join(", ")
        };
        let mock = if seed.mock_data.is_some() {
            " [mock]"
        } else {
            ""
        };
        println!("  {}{mock}", seed.kind.bold());
        println!("        triggers: {keywords}");
        if let Some(options) = &seed.options {
            println!("        options: {}", options.join(" | "));
        }
    }
    Ok(())
}
