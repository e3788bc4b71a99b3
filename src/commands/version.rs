//! Version command implementation

use crate::error::Result;
use crate::libraries::MANIFEST_VERSION;
use crate::transform::class::FORMAT_VERSION;

/// Run version command
pub fn run() -> Result<()> {
    println!("leaf {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Build info:");
    println!("  Rust version: {}", rustc_version());
    println!("  Profile: {}", build_profile());
    println!("  Class image format: {FORMAT_VERSION}");
    println!("  Library manifest format: {MANIFEST_VERSION}");

    Ok(())
}

fn rustc_version() -> &'static str {
    env!("CARGO_PKG_RUST_VERSION")
}

fn build_profile() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}
