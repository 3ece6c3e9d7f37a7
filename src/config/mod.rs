//! Configuration management for linkagg.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bundle::DEFAULT_MAX_SUPPORTED_LINKS;
use crate::error::{Error, Result};
use crate::hashing::HashPolicy;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Bundle configuration.
    #[serde(default)]
    pub bundle: BundleConfig,

    /// Synthetic traffic configuration.
    #[serde(default)]
    pub traffic: TrafficConfig,

    /// Simulation engine configuration.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Render configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))
    }

    /// Validate configuration.
    ///
    /// Zero active links is a valid (fully down) bundle; it surfaces as
    /// `NoAvailableLinks` when traffic is assigned.
    pub fn validate(&self) -> Result<()> {
        if self.bundle.max_supported_links == 0 {
            return Err(Error::InvalidConfig(
                "bundle.max_supported_links must be at least 1".into(),
            ));
        }

        if self.bundle.active_links > self.bundle.max_supported_links {
            return Err(Error::InvalidConfig(format!(
                "bundle.active_links ({}) exceeds bundle.max_supported_links ({})",
                self.bundle.active_links, self.bundle.max_supported_links
            )));
        }

        if self.simulation.workers == 0 {
            return Err(Error::InvalidConfig(
                "simulation.workers must be at least 1".into(),
            ));
        }

        if self.simulation.chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "simulation.chunk_size must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Get default config path.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "linkagg", "linkagg").map_or_else(
            || PathBuf::from("linkagg.toml"),
            |dirs| dirs.config_dir().join("config.toml"),
        )
    }

    /// Create example configuration.
    pub fn example() -> Self {
        Self {
            bundle: BundleConfig {
                active_links: 8,
                ..Default::default()
            },
            traffic: TrafficConfig {
                seed: Some(42),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Bundle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Maximum number of member links the bundle supports.
    #[serde(default = "default_max_supported_links")]
    pub max_supported_links: u16,

    /// Member links currently up.
    #[serde(default = "default_active_links")]
    pub active_links: u16,

    /// Which header layers feed the flow signature.
    #[serde(default)]
    pub hash_policy: HashPolicy,
}

fn default_max_supported_links() -> u16 {
    DEFAULT_MAX_SUPPORTED_LINKS
}
fn default_active_links() -> u16 {
    64
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            max_supported_links: default_max_supported_links(),
            active_links: default_active_links(),
            hash_policy: HashPolicy::default(),
        }
    }
}

/// Synthetic traffic configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Distinct flows generated for the uniform phase.
    #[serde(default = "default_flows")]
    pub flows: usize,

    /// Flows promoted to elephants.
    #[serde(default = "default_elephant_flows")]
    pub elephant_flows: usize,

    /// Frames replayed per elephant flow.
    #[serde(default = "default_elephant_frames")]
    pub elephant_frames: u64,

    /// RNG seed. Drawn from OS entropy when absent.
    pub seed: Option<u64>,
}

fn default_flows() -> usize {
    10_000
}
fn default_elephant_flows() -> usize {
    2
}
fn default_elephant_frames() -> u64 {
    10_000
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            flows: default_flows(),
            elephant_flows: default_elephant_flows(),
            elephant_frames: default_elephant_frames(),
            seed: None,
        }
    }
}

/// Simulation engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Worker threads used to hash frames.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Frames handed to a worker at a time.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_workers() -> usize {
    num_cpus::get()
}
fn default_chunk_size() -> usize {
    1024
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text or json).
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Enable colored output.
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_color() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_color(),
        }
    }
}

/// Initialize logging.
///
/// Logs go to stderr so that report output on stdout stays machine readable.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to init logging: {e}")))?;
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_ansi(config.color)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to init logging: {e}")))?;
    }

    Ok(())
}
