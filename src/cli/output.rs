use clap::Parser;

/// Output flags shared by `scan` and `resolve`
#[derive(Parser, Debug, Default)]
#[command(after_help = "EXAMPLES:\n  \
                  Human readable output:\n    leaf resolve\n\n\
                  Machine readable output:\n    leaf resolve --json")]
pub struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}
