//! Command-line interface for linkagg.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{Config, LoggingConfig};
use crate::types::{MacAddr, Protocol};

/// linkagg - link-aggregation flow hashing simulator
#[derive(Parser, Debug)]
#[command(
    name = "linkagg",
    author,
    version,
    about = "Simulate how a link-aggregation bundle spreads flows across member links",
    long_about = r#"
linkagg models the egress side of a link-aggregation bundle:

  - Protocol-aware flow hashing (L3/L4 or L2 policy)
  - Signature windows sized by active vs. supported links
  - Per-flow link stickiness
  - Elephant flows skewing per-link load

QUICK START:
  Simulate:  linkagg run --active-links 8 --flows 10000
  One flow:  linkagg hash --protocol tcp --src-ip 10.0.0.1 --dst-ip 10.0.0.2 --src-port 49152 --dst-port 443
  Windows:   linkagg windows --active-links 3
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Logging settings after applying `--log-level` and `--no-color` on top
    /// of the file values. Flags that were not given leave the file alone.
    pub fn logging(&self, file: &LoggingConfig) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone().unwrap_or_else(|| file.level.clone()),
            color: !self.no_color && file.color,
            ..file.clone()
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the uniform + elephant flow simulation
    Run(RunArgs),

    /// Hash a single flow and show its egress link
    Hash(HashArgs),

    /// Show the signature window owned by each active link
    Windows(WindowsArgs),

    /// Show example configuration
    Config(ConfigArgs),
}

/// Bundle shape shared by several commands.
#[derive(Args, Debug, Clone, Default)]
pub struct BundleArgs {
    /// Member links currently up
    #[arg(short, long)]
    pub active_links: Option<u16>,

    /// Member links the bundle supports
    #[arg(short, long)]
    pub max_links: Option<u16>,

    /// Hash policy
    #[arg(long)]
    pub policy: Option<HashPolicyArg>,
}

impl BundleArgs {
    /// Override bundle settings in `config` with any flags given.
    pub fn apply(&self, config: &mut Config) {
        if let Some(active) = self.active_links {
            config.bundle.active_links = active;
        }
        if let Some(max) = self.max_links {
            config.bundle.max_supported_links = max;
        }
        if let Some(policy) = self.policy {
            config.bundle.hash_policy = policy.into();
        }
    }
}

/// Run command arguments
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    /// Distinct flows to generate
    #[arg(short, long)]
    pub flows: Option<usize>,

    /// Number of elephant flows
    #[arg(short, long)]
    pub elephants: Option<usize>,

    /// Frames replayed per elephant flow
    #[arg(long)]
    pub elephant_frames: Option<u64>,

    /// RNG seed for reproducible runs
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,
}

impl RunArgs {
    /// Override configuration with any flags given.
    pub fn apply(&self, config: &mut Config) {
        self.bundle.apply(config);
        if let Some(flows) = self.flows {
            config.traffic.flows = flows;
        }
        if let Some(elephants) = self.elephants {
            config.traffic.elephant_flows = elephants;
        }
        if let Some(frames) = self.elephant_frames {
            config.traffic.elephant_frames = frames;
        }
        if self.seed.is_some() {
            config.traffic.seed = self.seed;
        }
        if let Some(workers) = self.workers {
            config.simulation.workers = workers;
        }
    }
}

/// Hash command arguments
#[derive(Args, Debug, Clone)]
pub struct HashArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    /// IP protocol (icmp, tcp, udp, ospf or a protocol number)
    #[arg(short, long)]
    pub protocol: Protocol,

    /// Source IPv4 address
    #[arg(long)]
    pub src_ip: Ipv4Addr,

    /// Destination IPv4 address
    #[arg(long)]
    pub dst_ip: Ipv4Addr,

    /// Source port (TCP/UDP only)
    #[arg(long)]
    pub src_port: Option<u16>,

    /// Destination port (TCP/UDP only)
    #[arg(long)]
    pub dst_port: Option<u16>,

    /// Source MAC address
    #[arg(long, default_value = "000000000000")]
    pub src_mac: MacAddr,

    /// Destination MAC address
    #[arg(long, default_value = "000000000000")]
    pub dst_mac: MacAddr,
}

/// Windows command arguments
#[derive(Args, Debug, Clone)]
pub struct WindowsArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,
}

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<OutputFormat> for crate::report::ReportFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
            OutputFormat::Table => Self::Table,
        }
    }
}

/// Hash policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HashPolicyArg {
    /// Ports, addresses and protocol (recommended)
    Layer34,
    /// MAC addresses only
    Layer2,
}

impl From<HashPolicyArg> for crate::hashing::HashPolicy {
    fn from(p: HashPolicyArg) -> Self {
        match p {
            HashPolicyArg::Layer34 => Self::Layer34,
            HashPolicyArg::Layer2 => Self::Layer2,
        }
    }
}
