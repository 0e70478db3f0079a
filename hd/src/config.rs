//! Handoff configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::HandoffError;
use crate::pipeline::PipelineConfig;
use crate::worker::{Pacing, TimeoutPolicy, WaitPolicy};

/// Main handoff configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Buffer sizing
    pub buffer: BufferConfig,

    /// Worker pool sizes
    pub workers: WorkersConfig,

    /// Bounded waits on the buffer
    pub wait: WaitConfig,

    /// Per-item pacing
    pub pacing: PacingConfig,

    /// Demo run settings
    pub demo: DemoConfig,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<(), HandoffError> {
        self.pipeline().validate()
    }

    /// Build the pipeline configuration this config describes
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            capacity: self.buffer.capacity,
            producers: self.workers.producers,
            consumers: self.workers.consumers,
            wait: self.wait.policy(),
            producer_pacing: Pacing::new(
                Duration::from_millis(self.pacing.producer_delay_ms),
                Duration::from_millis(self.pacing.jitter_ms),
            ),
            consumer_pacing: Pacing::new(
                Duration::from_millis(self.pacing.consumer_delay_ms),
                Duration::from_millis(self.pacing.jitter_ms),
            ),
        }
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Any failure yields `None`; the full load later reports it properly.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::default_paths(),
        };

        candidates
            .into_iter()
            .filter(|path| path.exists())
            .find_map(|path| Self::load_from_file(&path).ok())
            .and_then(|config| config.log_level)
    }

    /// Project-local then user config locations
    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".handoff.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("handoff").join("handoff.yml"));
        }
        paths
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_yaml()?).context(format!("Failed to write config to {}", path.display()))
    }
}

/// Buffer sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Maximum number of slots held at once
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { capacity: 2 }
    }
}

/// Worker pool sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub producers: usize,
    pub consumers: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            producers: 1,
            consumers: 1,
        }
    }
}

/// Bounded waits on the buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Ceiling for a single wait in milliseconds; unset waits forever
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// What to do when a wait times out
    #[serde(rename = "on-timeout")]
    pub on_timeout: TimeoutPolicy,

    /// Extra attempts under the retry policy
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(30_000),
            on_timeout: TimeoutPolicy::Retry,
            max_retries: 3,
        }
    }
}

impl WaitConfig {
    pub fn policy(&self) -> WaitPolicy {
        WaitPolicy {
            timeout: self.timeout_ms.map(Duration::from_millis),
            on_timeout: self.on_timeout,
            max_retries: self.max_retries,
        }
    }
}

/// Per-item pacing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Pause after each producer put
    #[serde(rename = "producer-delay-ms")]
    pub producer_delay_ms: u64,

    /// Pause after each consumer append
    #[serde(rename = "consumer-delay-ms")]
    pub consumer_delay_ms: u64,

    /// Random extra pause, up to this many milliseconds
    #[serde(rename = "jitter-ms")]
    pub jitter_ms: u64,
}

/// Demo run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of integers fed through `hd run`
    pub items: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { items: 5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.buffer.capacity, 2);
        assert_eq!(config.workers.producers, 1);
        assert_eq!(config.workers.consumers, 1);
        assert_eq!(config.wait.timeout_ms, Some(30_000));
        assert_eq!(config.demo.items, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: DEBUG

buffer:
  capacity: 8

workers:
  producers: 3
  consumers: 2

wait:
  timeout-ms: 500
  on-timeout: abort
  max-retries: 0

pacing:
  producer-delay-ms: 10
  consumer-delay-ms: 20
  jitter-ms: 5

demo:
  items: 100
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("DEBUG"));
        assert_eq!(config.buffer.capacity, 8);
        assert_eq!(config.workers.producers, 3);
        assert_eq!(config.wait.on_timeout, TimeoutPolicy::Abort);
        assert_eq!(config.pacing.jitter_ms, 5);
        assert_eq!(config.demo.items, 100);

        let pipeline = config.pipeline();
        assert_eq!(pipeline.wait.timeout, Some(Duration::from_millis(500)));
        assert_eq!(pipeline.consumer_pacing.delay, Duration::from_millis(20));
        assert_eq!(pipeline.producer_pacing.jitter, Duration::from_millis(5));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
workers:
  consumers: 4
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.workers.consumers, 4);

        // Defaults for unspecified
        assert_eq!(config.workers.producers, 1);
        assert_eq!(config.buffer.capacity, 2);
        assert_eq!(config.wait.max_retries, 3);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_null_timeout_waits_forever() {
        let config: Config = serde_yaml::from_str("wait:\n  timeout-ms: ~\n").unwrap();
        assert_eq!(config.pipeline().wait.timeout, None);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config: Config = serde_yaml::from_str("buffer:\n  capacity: 0\n").unwrap();
        assert!(matches!(config.validate(), Err(HandoffError::Configuration(_))));
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log-level: WARN\nbuffer:\n  capacity: 7").unwrap();
        let path = file.path().to_path_buf();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.buffer.capacity, 7);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("WARN"));
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let path = PathBuf::from("/nonexistent/handoff.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handoff.yml");

        let mut config = Config::default();
        config.workers.producers = 2;
        config.wait.on_timeout = TimeoutPolicy::Abort;
        config.save(&path).unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    #[serial]
    fn test_load_prefers_project_local_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".handoff.yml"), "buffer:\n  capacity: 11\n").unwrap();

        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let loaded = Config::load(None);
        std::env::set_current_dir(previous).unwrap();

        assert_eq!(loaded.unwrap().buffer.capacity, 11);
    }
}
