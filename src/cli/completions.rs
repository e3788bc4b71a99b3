use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    leaf completions bash > ~/.bash_completion.d/leaf\n\n\
                  Generate zsh completions:\n    leaf completions zsh > ~/.zfunc/_leaf\n\n\
                  Generate fish completions:\n    leaf completions fish > ~/.config/fish/completions/leaf.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
