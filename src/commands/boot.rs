//! Boot command implementation
//!
//! Runs every boot step with no entrypoints registered: mods that declare
//! entrypoints fail the boot the same way a host without their code would.

use console::Style;

use crate::cli::{BootArgs, LoaderFlags};
use crate::error::Result;
use crate::launch::GameArguments;
use crate::loader::Loader;

/// Run boot command
pub fn run(flags: &LoaderFlags, args: &BootArgs) -> Result<()> {
    let config = flags.load_config()?;
    let mut loader = Loader::new(config).with_arguments(GameArguments::parse(&args.game_args));
    loader.handle().install_global()?;

    let result = loader.boot();
    crate::loader::uninstall_global();
    let report = result?;

    if report.is_dry_run() {
        println!(
            "{} {} candidates discovered, {} packages skipped",
            Style::new().bold().apply_to("Dry run:"),
            report.discovered,
            report.skipped
        );
        return Ok(());
    }

    println!(
        "{} {} mods loaded, {} entrypoints run, {} libraries verified, {} classes defined",
        Style::new().bold().green().apply_to("✓"),
        report.mods.len(),
        report.entrypoints_run,
        report.libraries_verified,
        report.classes_defined
    );
    Ok(())
}
