//! Scan command implementation
//!
//! Lists the candidates discovery produced, the packages it skipped and the
//! archives that are not mods.

use console::Style;
use serde_json::json;

use crate::cli::{LoaderFlags, OutputArgs};
use crate::discovery::{ScanReport, Scanner};
use crate::error::Result;

/// Run scan command
pub fn run(flags: &LoaderFlags, args: &OutputArgs) -> Result<()> {
    let config = flags.load_config()?;
    let report = Scanner::new(config.scan_options()?).scan();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        display_report(&report);
    }
    Ok(())
}

pub(crate) fn report_json(report: &ScanReport) -> serde_json::Value {
    json!({
        "candidates": report.candidates.iter().map(|c| json!({
            "id": c.id(),
            "version": c.version().to_string(),
            "origin": c.origin().to_string(),
        })).collect::<Vec<_>>(),
        "skipped": report.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "non_leaf": report.non_leaf.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        "disabled": report.disabled,
    })
}

fn display_report(report: &ScanReport) {
    println!(
        "{} ({}):",
        Style::new().bold().apply_to("Discovered mods"),
        report.candidates.len()
    );
    for candidate in &report.candidates {
        println!(
            "  {} {} {}",
            Style::new().bold().yellow().apply_to(candidate.id()),
            candidate.version(),
            Style::new().dim().apply_to(candidate.origin())
        );
    }

    if !report.disabled.is_empty() {
        println!();
        println!("{}", Style::new().bold().apply_to("Disabled:"));
        for label in &report.disabled {
            println!("  {label}");
        }
    }

    if !report.diagnostics.is_empty() {
        println!();
        println!("{}", Style::new().bold().red().apply_to("Skipped packages:"));
        for diagnostic in &report.diagnostics {
            println!("  {diagnostic}");
        }
    }

    if !report.non_leaf.is_empty() {
        println!();
        println!(
            "{} ({})",
            Style::new().bold().apply_to("Archives without a mod manifest"),
            report.non_leaf.len()
        );
    }
}
