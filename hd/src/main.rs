//! hd - bounded-buffer producer/consumer handoff
//!
//! CLI entry point for running a demo pipeline and inspecting configuration.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use handoff::cli::{Cli, Command, OutputFormat, RunArgs, get_log_path};
use handoff::config::Config;
use handoff::worker::{Exit, WorkerReport};
use handoff::{MemoryFeed, MemorySink, Pipeline, RunReport};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
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

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run(args) => cmd_run(config, &args).await,
        Command::Config => cmd_config(&config),
    }
}

/// Feed 1..=items through a pipeline built from config plus overrides
async fn cmd_run(mut config: Config, args: &RunArgs) -> Result<()> {
    debug!(?args, "cmd_run: called");
    args.apply(&mut config);

    let pipeline = Pipeline::new(config.pipeline()).context("Invalid run configuration")?;
    let feed = Arc::new(MemoryFeed::new(1..=config.demo.items));
    let sink = Arc::new(MemorySink::new());

    let report = pipeline.run(feed, sink.clone()).await?;
    let items = sink.items().await;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "items": items,
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => print_report(&items, &report),
    }

    report.reconcile().map_err(|e| eyre!("Run failed: {}", e))
}

/// Print the effective configuration
fn cmd_config(config: &Config) -> Result<()> {
    debug!("cmd_config: called");
    print!("{}", config.to_yaml()?);
    Ok(())
}

fn print_report(items: &[u64], report: &RunReport) {
    let rendered: Vec<String> = items.iter().map(|i| i.to_string()).collect();
    println!("{} [{}]", "Collected:".bold(), rendered.join(", "));
    println!();

    for worker in &report.workers {
        print_worker(worker);
    }
    println!();

    let buffer = &report.buffer;
    println!(
        "Items: {} taken, {} delivered",
        report.items_taken, report.items_delivered
    );
    println!(
        "Buffer: peak {}, {} put waits, {} get waits, {} timeouts",
        buffer.peak_len,
        buffer.put_waits,
        buffer.get_waits,
        buffer.put_timeouts + buffer.get_timeouts
    );
    let tokens = &report.tokens;
    println!(
        "Tokens: {} emitted, {} wake-ups, {} absorbed, {} forwarded, {} discarded",
        tokens.tokens_emitted,
        tokens.wake_ups,
        tokens.tokens_absorbed,
        tokens.tokens_forwarded,
        tokens.tokens_discarded
    );

    match report.reconcile() {
        Ok(()) => println!("{} Run reconciled", "✓".green()),
        Err(e) => println!("{} {}", "✗".red(), e),
    }
}

fn print_worker(worker: &WorkerReport) {
    let status = match &worker.exit {
        Exit::Exhausted => "stopped".green(),
        Exit::Failed(err) => format!("failed ({})", err).red(),
    };
    println!(
        "  {:<12} {} {}",
        worker.id.to_string().cyan(),
        status,
        format!("{} items", worker.items).dimmed()
    );
}
