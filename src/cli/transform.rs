use clap::Parser;
use std::path::PathBuf;

/// Arguments for the transform command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show what the pipeline changes:\n    leaf transform zombie/core/Core\n\n\
                  Write the transformed image:\n    leaf transform zombie.core.Core -o Core.class\n\n\
                  Check the result is reproducible:\n    leaf transform zombie/core/Core --replay")]
pub struct TransformArgs {
    /// Class name, `a/b/C` or `a.b.C`
    pub class: String,

    /// Write the transformed class image here
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Re-run the pipeline and compare fingerprints
    #[arg(long)]
    pub replay: bool,
}
