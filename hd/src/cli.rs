//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::worker::TimeoutPolicy;

/// hd - bounded-buffer producer/consumer handoff
#[derive(Parser)]
#[command(
    name = "hd",
    about = "Run producers and consumers through a bounded buffer",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Feed the integers 1..=items through a pipeline and report the result
    Run(RunArgs),

    /// Print the effective configuration as YAML
    Config,
}

/// Overrides for `hd run`; anything unset comes from the config file
#[derive(Debug, Default, clap::Args)]
pub struct RunArgs {
    /// Buffer capacity
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Number of producers
    #[arg(short, long)]
    pub producers: Option<usize>,

    /// Number of consumers
    #[arg(short = 'm', long)]
    pub consumers: Option<usize>,

    /// Number of items to feed
    #[arg(short = 'n', long)]
    pub items: Option<u64>,

    /// Pause after each producer put, in milliseconds
    #[arg(long)]
    pub producer_delay_ms: Option<u64>,

    /// Pause after each consumer append, in milliseconds
    #[arg(long)]
    pub consumer_delay_ms: Option<u64>,

    /// Random extra pause, in milliseconds
    #[arg(long)]
    pub jitter_ms: Option<u64>,

    /// Ceiling for a single buffer wait, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// What to do when a wait times out (retry, abort)
    #[arg(long)]
    pub on_timeout: Option<TimeoutPolicy>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

impl RunArgs {
    /// Layer the command-line overrides on top of a loaded config
    pub fn apply(&self, config: &mut Config) {
        debug!(?self, "RunArgs::apply: called");
        if let Some(capacity) = self.capacity {
            config.buffer.capacity = capacity;
        }
        if let Some(producers) = self.producers {
            config.workers.producers = producers;
        }
        if let Some(consumers) = self.consumers {
            config.workers.consumers = consumers;
        }
        if let Some(items) = self.items {
            config.demo.items = items;
        }
        if let Some(delay) = self.producer_delay_ms {
            config.pacing.producer_delay_ms = delay;
        }
        if let Some(delay) = self.consumer_delay_ms {
            config.pacing.consumer_delay_ms = delay;
        }
        if let Some(jitter) = self.jitter_ms {
            config.pacing.jitter_ms = jitter;
        }
        if let Some(timeout) = self.timeout_ms {
            config.wait.timeout_ms = Some(timeout);
        }
        if let Some(policy) = self.on_timeout {
            config.wait.on_timeout = policy;
        }
    }
}

/// Output format for run reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("handoff")
        .join("logs")
        .join("hd.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::parse_from(["hd", "run"]);
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert!(args.capacity.is_none());
        assert!(args.on_timeout.is_none());
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_parse_run_overrides() {
        let cli = Cli::parse_from([
            "hd",
            "run",
            "--capacity",
            "4",
            "-p",
            "2",
            "-m",
            "3",
            "-n",
            "50",
            "--timeout-ms",
            "250",
            "--on-timeout",
            "abort",
            "--format",
            "json",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.capacity, Some(4));
        assert_eq!(args.producers, Some(2));
        assert_eq!(args.consumers, Some(3));
        assert_eq!(args.items, Some(50));
        assert_eq!(args.timeout_ms, Some(250));
        assert_eq!(args.on_timeout, Some(TimeoutPolicy::Abort));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_run_args_override_config() {
        let cli = Cli::parse_from(["hd", "run", "--capacity", "9", "--jitter-ms", "3"]);
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };

        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.buffer.capacity, 9);
        assert_eq!(config.pacing.jitter_ms, 3);
        // Untouched values keep their config defaults
        assert_eq!(config.workers.producers, 1);
        assert_eq!(config.wait.timeout_ms, Some(30_000));
    }

    #[test]
    fn test_cli_parse_config() {
        let cli = Cli::parse_from(["hd", "-l", "debug", "config"]);
        assert!(matches!(cli.command, Command::Config));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["hd", "-c", "/path/to/handoff.yml", "run"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/handoff.yml")));
    }

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text)));
        assert!(matches!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_log_path() {
        assert!(get_log_path().ends_with("handoff/logs/hd.log"));
    }
}
