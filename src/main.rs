//! Leaf Loader command line

use clap::Parser;

use leaf_loader::cli::{Cli, Commands};
use leaf_loader::{commands, logging};

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Some("debug".to_string())
    } else {
        cli.loader.log_level_setting()
    };
    logging::init(level.as_deref(), console::colors_enabled_stderr());

    let result = match &cli.command {
        Commands::Scan(args) => commands::scan::run(&cli.loader, args),
        Commands::Resolve(args) => commands::resolve::run(&cli.loader, args),
        Commands::VerifyLibraries => commands::verify_libraries::run(&cli.loader),
        Commands::Transform(args) => commands::transform::run(&cli.loader, args),
        Commands::Boot(args) => commands::boot::run(&cli.loader, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(1);
    }
}
