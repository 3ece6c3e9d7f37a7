//! Report rendering for simulation results.

use std::fmt::Write as _;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use crate::bundle::{EgressAssignment, Window};
use crate::error::Result;
use crate::flow::FlowDescriptor;
use crate::sim::{PhaseReport, SimulationReport};

/// Links carrying more than this multiple of the even share are flagged.
pub const HOT_LINK_FACTOR: f64 = 2.0;

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Table,
    Json,
}

/// Render a simulation report.
pub fn render(report: &SimulationReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Table => Ok(render_table(report)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

/// Plain per-link listing, one block per phase.
pub fn render_text(report: &SimulationReport) -> String {
    let mut out = String::new();
    let rule = "=".repeat(50);

    let _ = writeln!(
        out,
        "{} flows over {} of {} supported links ({} hashing, seed {})",
        report.flows,
        report.active_links,
        report.max_supported_links,
        report.policy,
        report.seed
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "One frame for every flow only. Expect a roughly uniform distribution"
    );
    write_phase(&mut out, &report.uniform, &rule);

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "With {} elephant flows of {} frames each. Sometimes they hit the same link",
        report.elephants.len(),
        report.elephants.first().map_or(0, |e| e.frames)
    );
    for elephant in &report.elephants {
        let _ = writeln!(
            out,
            "  elephant {} -> link {} (signature {})",
            elephant.flow.protocol, elephant.assignment.link, elephant.assignment.signature
        );
    }
    write_phase(&mut out, &report.elephant, &rule);

    let _ = writeln!(
        out,
        "Total hashing time: {:.3} ms",
        report.hashing_time.as_secs_f64() * 1000.0
    );
    out
}

fn write_phase(out: &mut String, phase: &PhaseReport, rule: &str) {
    let _ = writeln!(out, "{rule}");
    for (link, frames) in phase.tally.iter() {
        let _ = writeln!(out, "Egress link {link}: {frames} frames");
    }
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "mean {:.1}  std dev {:.1}  min {}  max {}  imbalance {:.2}x",
        phase.stats.mean, phase.stats.std_dev, phase.stats.min, phase.stats.max, phase.stats.imbalance
    );
}

/// Side-by-side table of both phases with hot links highlighted.
pub fn render_table(report: &SimulationReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Link", "Uniform", "With elephants", "Share"]);

    let total = report.elephant.tally.total().max(1) as f64;
    let hot_threshold = report.elephant.tally.uniform_share() * HOT_LINK_FACTOR;

    for ((link, uniform), (_, loaded)) in report
        .uniform
        .tally
        .iter()
        .zip(report.elephant.tally.iter())
    {
        let share = format!("{:.2}%", loaded as f64 / total * 100.0);
        let loaded_cell = if loaded as f64 > hot_threshold {
            loaded.to_string().red().bold().to_string()
        } else {
            loaded.to_string()
        };
        table.add_row(vec![
            Cell::new(link),
            Cell::new(uniform),
            Cell::new(loaded_cell),
            Cell::new(share),
        ]);
    }

    let mut out = table.to_string();
    let _ = writeln!(out);
    for phase in [&report.uniform, &report.elephant] {
        let _ = writeln!(
            out,
            "{:>9}: std dev {:.1}, imbalance {:.2}x",
            phase.name, phase.stats.std_dev, phase.stats.imbalance
        );
    }
    let _ = writeln!(
        out,
        "Total hashing time: {:.3} ms",
        report.hashing_time.as_secs_f64() * 1000.0
    );
    out
}

/// Table of the signature windows owned by each link.
pub fn render_windows(windows: &[Window]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Link", "Signatures", "Width"]);

    for window in windows {
        let reachable = window.reachable();
        let range = if reachable == 0 {
            "-".dimmed().to_string()
        } else {
            format!("{}..={}", window.lower, window.lower + reachable - 1)
        };
        table.add_row(vec![
            Cell::new(window.link),
            Cell::new(range),
            Cell::new(reachable),
        ]);
    }
    table.to_string()
}

/// One-line summary of a single flow's assignment.
pub fn render_assignment(flow: &FlowDescriptor, assignment: &EgressAssignment) -> String {
    format!(
        "{flow}\n  signature {} -> egress link {}",
        assignment.signature,
        assignment.link.to_string().bright_green()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::window_layout;
    use crate::config::Config;
    use crate::sim::Simulation;

    fn report() -> SimulationReport {
        let mut config = Config::default();
        config.bundle.active_links = 4;
        config.traffic.flows = 200;
        config.traffic.elephant_frames = 50;
        config.traffic.seed = Some(1);
        config.simulation.workers = 2;
        Simulation::from_config(&config).unwrap().run().unwrap()
    }

    #[test]
    fn test_text_lists_every_link() {
        let text = render_text(&report());
        for link in 1..=4 {
            assert!(text.contains(&format!("Egress link {link}: ")));
        }
        assert!(text.contains("Total hashing time"));
    }

    #[test]
    fn test_json_is_parseable() {
        let json = render(&report(), ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["active_links"], 4);
        assert_eq!(value["uniform"]["frames"], 200);
        assert_eq!(value["elephants"].as_array().unwrap().len(), 2);
        assert!(value["hashing_time_ms"].is_number());
    }

    #[test]
    fn test_windows_table() {
        let table = render_windows(&window_layout(3, 256).unwrap());
        assert!(table.contains("0..=84"));
        assert!(table.contains("170..=255"));
    }
}
