//! Transform command implementation
//!
//! Boots the loader up to an installed pipeline and requests one class
//! through the loading gate, exactly as the host would.

use console::Style;

use crate::cli::{LoaderFlags, TransformArgs};
use crate::error::{GateError, Result};
use crate::gate::ClassLoad;
use crate::loader::Loader;

/// Run transform command
pub fn run(flags: &LoaderFlags, args: &TransformArgs) -> Result<()> {
    let config = flags.load_config()?;
    let mut loader = Loader::new(config);
    loader.discover()?;
    loader.resolve()?;
    let gate = loader.install_pipeline()?;

    let class = match gate.load_class(&args.class)? {
        ClassLoad::Delegated if gate.covers(&args.class) => {
            return Err(GateError::ClassNotFound {
                name: args.class.clone(),
            }
            .into());
        }
        ClassLoad::Delegated => {
            println!(
                "{} is outside the loader's authority and is loaded by the host unchanged",
                Style::new().bold().apply_to(&args.class)
            );
            return Ok(());
        }
        ClassLoad::Defined(class) => class,
    };

    println!("{}", Style::new().bold().yellow().apply_to(&class.name));
    if class.source_name != class.name {
        println!("  {} {}", Style::new().bold().apply_to("Source name:"), class.source_name);
    }
    println!("  {} {}", Style::new().bold().apply_to("Original:"), class.original_fingerprint);
    println!("  {} {}", Style::new().bold().apply_to("Transformed:"), class.fingerprint);
    println!(
        "  {} {}",
        Style::new().bold().apply_to("Units:"),
        gate.pipeline().unit_names().join(", ")
    );
    if !class.is_transformed() {
        println!("  {}", Style::new().dim().apply_to("no unit changed this class"));
    }

    if let Some(output) = &args.output {
        std::fs::write(output, &class.bytes)?;
        println!("  {} {}", Style::new().bold().apply_to("Written to:"), output.display());
    }

    if args.replay {
        let replay = gate.replay(&class.name)?;
        if replay.matches() {
            println!("  {} replay produced identical bytes", Style::new().green().apply_to("✓"));
        } else {
            println!(
                "  {} replay produced {} instead of {}",
                Style::new().red().apply_to("✗"),
                replay.replayed,
                replay.recorded
            );
        }
    }
    Ok(())
}
