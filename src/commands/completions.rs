//! Shell completions command

use clap::CommandFactory;

use crate::cli::CompletionsArgs;
use crate::error::Result;
use crate::error::config::invalid;

/// Generate shell completions
pub fn run(args: &CompletionsArgs) -> Result<()> {
    let shell = match args.shell.to_lowercase().as_str() {
        "bash" => clap_complete::Shell::Bash,
        "elvish" => clap_complete::Shell::Elvish,
        "fish" => clap_complete::Shell::Fish,
        "powershell" | "pwsh" => clap_complete::Shell::PowerShell,
        "zsh" => clap_complete::Shell::Zsh,
        _ => {
            return Err(invalid(format!(
                "unknown shell '{}', supported shells: bash, elvish, fish, powershell, zsh",
                args.shell
            ))
            .into());
        }
    };

    let mut cmd = <crate::cli::Cli as CommandFactory>::command();
    clap_complete::generate(shell, &mut cmd, "leaf", &mut std::io::stdout().lock());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completions(shell: &str) -> CompletionsArgs {
        CompletionsArgs {
            shell: shell.to_string(),
        }
    }

    #[test]
    fn test_completions_known_shells() {
        for shell in ["bash", "elvish", "fish", "powershell", "pwsh", "zsh"] {
            assert!(run(&completions(shell)).is_ok(), "{shell}");
        }
    }

    #[test]
    fn test_completions_mixed_case() {
        assert!(run(&completions("Zsh")).is_ok());
    }

    #[test]
    fn test_completions_unknown_shell() {
        assert!(run(&completions("tcsh")).is_err());
    }
}
