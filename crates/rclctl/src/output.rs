//! Terminal summaries, ASCII only

use owo_colors::OwoColorize;
use rcl_common::endpoints::ReachabilityTier;
use rcl_common::{BringUp, GateReport};
use std::path::Path;

fn reachability_line(tier: ReachabilityTier) -> String {
    match tier {
        ReachabilityTier::All => format!("{} all endpoints reachable", "[OK]".bright_green()),
        ReachabilityTier::Partial => format!(
            "{} only some endpoints reachable",
            "[PARTIAL]".yellow()
        ),
        ReachabilityTier::None => format!("{} no endpoint reachable", "[FAIL]".bright_red()),
    }
}

pub fn print_gates(report: &GateReport) {
    println!();
    println!("{} configuration schema", "[OK]".bright_green());
    println!(
        "{} CAMPUS {}  RAS {}",
        "[OK]".bright_green(),
        report.topology.campus.cyan(),
        report.topology.ras.cyan()
    );
    println!("{} domain {}", "[OK]".bright_green(), report.domain.cyan());
    println!("{}", reachability_line(report.reachability));
    println!();
}

pub fn print_bring_up(outcome: &BringUp, config_file: &Path) {
    println!();
    println!("{}", reachability_line(outcome.reachability));
    println!(
        "{} wrote {} ({} keys)",
        "[OK]".bright_green(),
        config_file.display(),
        outcome.written.len()
    );
    if let Some(backup) = &outcome.backup {
        println!("[NOTE] previous file kept as {}", backup.display().yellow());
    }
    println!("{} container started", "[OK]".bright_green());
    println!();
}

pub fn print_status(running: bool, image_match: &str) {
    if running {
        println!("{} {} is running", "[RUNNING]".bright_green(), image_match);
    } else {
        println!("{} {} is not running", "[STOPPED]".yellow(), image_match);
    }
}

pub fn print_log_location(log_dir: &Path) {
    println!();
    println!("Detailed logs are located in {}", log_dir.display().cyan());
    println!();
}
