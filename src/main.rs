//! linkagg CLI - link-aggregation flow hashing simulator.

use clap::Parser;
use colored::Colorize;
use tracing::{debug, warn};

use linkagg::bundle::window_layout;
use linkagg::cli::*;
use linkagg::config::{init_logging, Config};
use linkagg::error::{Error, Result};
use linkagg::flow::{FlowDescriptor, FlowRecord};
use linkagg::report::{self, ReportFormat};
use linkagg::sim::Simulation;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(if e.is_operational() { 2 } else { 1 });
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load config if specified
    let mut config = if let Some(ref path) = cli.config {
        Config::load(path)?
    } else if Config::default_path().exists() {
        Config::load(Config::default_path())?
    } else {
        Config::default()
    };

    // Initialize logging
    let log_config = cli.logging(&config.logging);
    init_logging(&log_config)?;
    config.logging = log_config;

    let format = ReportFormat::from(cli.format);

    // Dispatch command
    match cli.command {
        Commands::Run(args) => {
            args.apply(&mut config);
            run_simulation(&config, format)
        }
        Commands::Hash(args) => {
            args.bundle.apply(&mut config);
            run_hash(&args, &config, format)
        }
        Commands::Windows(args) => {
            args.bundle.apply(&mut config);
            run_windows(&config, format)
        }
        Commands::Config(args) => run_config(&args),
    }
}

/// Run the uniform + elephant simulation.
fn run_simulation(config: &Config, format: ReportFormat) -> Result<()> {
    debug!(?config, "simulation configuration");
    let simulation = Simulation::from_config(config)?;
    let report = match simulation.run() {
        Ok(report) => report,
        Err(Error::NoAvailableLinks) => {
            warn!("bundle is down, all traffic would be dropped");
            return Err(Error::NoAvailableLinks);
        }
        Err(e) => return Err(e),
    };

    println!("{}", report::render(&report, format)?);
    Ok(())
}

/// Hash one flow given on the command line.
fn run_hash(args: &HashArgs, config: &Config, format: ReportFormat) -> Result<()> {
    config.validate()?;
    let flow = FlowDescriptor::try_from(FlowRecord {
        protocol: args.protocol,
        src_mac: args.src_mac,
        dst_mac: args.dst_mac,
        src_ip: args.src_ip,
        dst_ip: args.dst_ip,
        src_port: args.src_port,
        dst_port: args.dst_port,
    })?;

    let assignment = linkagg::bundle::assign(
        config.bundle.hash_policy,
        config.bundle.active_links,
        config.bundle.max_supported_links,
        &flow,
    )?;

    match format {
        ReportFormat::Json => {
            let value = serde_json::json!({
                "flow": flow.record(),
                "policy": config.bundle.hash_policy,
                "signature": assignment.signature,
                "link": assignment.link,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        ReportFormat::Text | ReportFormat::Table => {
            println!("{}", report::render_assignment(&flow, &assignment));
        }
    }
    Ok(())
}

/// Show the signature window layout.
fn run_windows(config: &Config, format: ReportFormat) -> Result<()> {
    config.validate()?;
    let windows = window_layout(config.bundle.active_links, config.bundle.max_supported_links)?;

    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&windows)?),
        ReportFormat::Text | ReportFormat::Table => {
            println!(
                "{} of {} links up, window width {}",
                config.bundle.active_links,
                config.bundle.max_supported_links,
                linkagg::bundle::window_width(
                    config.bundle.active_links,
                    config.bundle.max_supported_links
                )
            );
            println!("{}", report::render_windows(&windows));
        }
    }
    Ok(())
}

/// Print or write example configuration.
fn run_config(args: &ConfigArgs) -> Result<()> {
    let text = Config::example().to_toml()?;
    if let Some(ref path) = args.output {
        std::fs::write(path, &text)?;
        println!("{} Wrote example configuration to {}", "✓".green(), path.display());
    } else {
        println!("{text}");
    }
    Ok(())
}
