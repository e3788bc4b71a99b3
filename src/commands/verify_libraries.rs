//! Verify-libraries command implementation

use console::Style;

use crate::cli::LoaderFlags;
use crate::error::Result;
use crate::error::config::invalid;
use crate::libraries::{LibraryLayout, LibraryManifest};

/// Run verify-libraries command
pub fn run(flags: &LoaderFlags) -> Result<()> {
    let config = flags.load_config()?;
    let path = config
        .effective_library_manifest()
        .ok_or_else(|| invalid("no library manifest configured (use --library-manifest)"))?;

    let manifest = LibraryManifest::load(&path)?;
    let layout = LibraryLayout {
        libraries_dir: config.effective_libraries_dir(),
        loader_jars_dir: config.effective_loader_jars_dir(),
    };
    let verified = layout.verify(&manifest, config.side, config.development)?;

    for library in &verified {
        println!(
            "  {} {}",
            Style::new().green().apply_to("ok"),
            library.coordinate
        );
    }
    println!(
        "{} {} librar{} verified",
        Style::new().bold().green().apply_to("✓"),
        verified.len(),
        if verified.len() == 1 { "y" } else { "ies" }
    );
    Ok(())
}
