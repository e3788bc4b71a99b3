use clap::Parser;

/// Arguments for the boot command
#[derive(Parser, Debug, Default)]
#[command(after_help = "EXAMPLES:\n  \
                  Boot with the configuration in the current directory:\n    leaf boot\n\n\
                  Pass game arguments to entrypoints:\n    leaf boot -- -debug -port 16261\n\n\
                  Only discover mods:\n    leaf boot --dry-run")]
pub struct BootArgs {
    /// Game arguments handed to entrypoints
    #[arg(last = true, allow_hyphen_values = true)]
    pub game_args: Vec<String>,
}
