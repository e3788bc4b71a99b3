//! Resolve command implementation

use console::Style;
use serde_json::json;

use crate::cli::{LoaderFlags, OutputArgs};
use crate::discovery::Scanner;
use crate::error::Result;
use crate::loader::format_mod_list;
use crate::resolver::{Resolution, ResolveOptions, Resolver};

/// Run resolve command
pub fn run(flags: &LoaderFlags, args: &OutputArgs) -> Result<()> {
    let config = flags.load_config()?;
    let report = Scanner::new(config.scan_options()?).scan();
    let resolution = Resolver::new(ResolveOptions {
        load_late: config.load_late_ids(),
    })
    .resolve(&report.candidates)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution_json(&resolution))?);
    } else {
        display_resolution(&resolution);
    }
    Ok(())
}

fn resolution_json(resolution: &Resolution) -> serde_json::Value {
    json!({
        "order": resolution.ordered().iter().map(|m| json!({
            "id": m.id,
            "version": m.version.to_string(),
            "origin": m.origin.to_string(),
        })).collect::<Vec<_>>(),
        "warnings": resolution.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "broken_edges": resolution.broken_edges,
    })
}

fn display_resolution(resolution: &Resolution) {
    print!("{}", format_mod_list(&resolution.ordered()));

    if !resolution.warnings.is_empty() {
        println!();
        println!("{}", Style::new().bold().yellow().apply_to("Warnings:"));
        for warning in &resolution.warnings {
            println!("  {warning}");
        }
    }

    for (from, to) in &resolution.broken_edges {
        println!(
            "  {} dependency cycle broken at {from} -> {to}",
            Style::new().yellow().apply_to("note:")
        );
    }
}
