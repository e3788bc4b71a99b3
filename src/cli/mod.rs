//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - output: Shared output flags of `scan` and `resolve`
//! - transform: Transform command arguments
//! - boot: Boot command arguments
//! - completions: Completions command arguments
//!
//! Global flags mirror the fields of `leaf.yaml`; each one can also be set
//! through a `LEAF_*` environment variable and wins over the file.

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod boot;
pub mod completions;
pub mod output;
pub mod transform;

pub use boot::BootArgs;
pub use completions::CompletionsArgs;
pub use output::OutputArgs;
pub use transform::TransformArgs;

use crate::config::overrides::{parse_id_list, parse_version_overrides};
use crate::config::{CONFIG_FILE, LoaderConfig};
use crate::error::ConfigError;
use crate::error::config::invalid;
use crate::metadata::Side;

/// Leaf Loader - mod loading core
///
/// Discovers mods, resolves a consistent mod set and transforms game classes at load time.
#[derive(Parser, Debug)]
#[command(
    name = "leaf",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Mod loading core: discovery, dependency resolution and class transformation",
    long_about = "Leaf scans mod packages, selects one mutually compatible version of every mod \
                  and serves game classes through a transform pipeline built from the mods' \
                  access rules and patches.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  leaf scan -g ~/games/zomboid                 \x1b[90m# List discovered mods\x1b[0m\n   \
                  leaf resolve --side server                    \x1b[90m# Show the resolved load order\x1b[0m\n   \
                  leaf verify-libraries                         \x1b[90m# Check installed libraries\x1b[0m\n   \
                  leaf transform zombie/core/Core -o Core.class \x1b[90m# Transform one class\x1b[0m\n   \
                  leaf boot -- -debug -port 16261               \x1b[90m# Run a full boot\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    #[command(flatten)]
    pub loader: LoaderFlags,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover mod candidates
    Scan(OutputArgs),

    /// Resolve the mod set and print the load order
    Resolve(OutputArgs),

    /// Verify installed libraries against their manifest
    #[command(name = "verify-libraries")]
    VerifyLibraries,

    /// Run one class through the transform pipeline
    Transform(TransformArgs),

    /// Run the full boot sequence
    Boot(BootArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Flags that override `leaf.yaml`
#[derive(Args, Debug, Default, Clone)]
pub struct LoaderFlags {
    /// Game directory (defaults to current directory)
    #[arg(long, short = 'g', global = true, env = "LEAF_GAME_DIR")]
    pub game_dir: Option<PathBuf>,

    /// Configuration file (defaults to leaf.yaml in the game directory)
    #[arg(long, short = 'c', global = true, env = "LEAF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mod search directory, repeatable
    #[arg(long = "mods-dir", global = true, env = "LEAF_MODS_DIRS", value_delimiter = ',')]
    pub mods_dirs: Vec<PathBuf>,

    /// Search depth below each mods directory
    #[arg(long, global = true, env = "LEAF_SCAN_DEPTH")]
    pub scan_depth: Option<usize>,

    /// Extra packages, separated by the path separator; `@file` reads a list
    #[arg(long, global = true, env = "LEAF_ADD_MODS")]
    pub add_mods: Option<String>,

    /// Side to load for (client or server)
    #[arg(long, global = true, env = "LEAF_SIDE")]
    pub side: Option<Side>,

    /// Development mode
    #[arg(long, global = true, env = "LEAF_DEVELOPMENT")]
    pub development: bool,

    /// Version of the builtin game mod
    #[arg(long, global = true, env = "LEAF_GAME_VERSION")]
    pub game_version: Option<String>,

    /// Class path entry (directory or archive), repeatable
    #[arg(long = "class-path", global = true, env = "LEAF_CLASS_PATH", value_delimiter = ',')]
    pub class_path: Vec<PathBuf>,

    /// Installed-library manifest
    #[arg(long, global = true, env = "LEAF_LIBRARY_MANIFEST")]
    pub library_manifest: Option<PathBuf>,

    /// Maven layout root for installed libraries
    #[arg(long, global = true, env = "LEAF_LIBRARIES_DIR")]
    pub libraries_dir: Option<PathBuf>,

    /// Directory of development library entries
    #[arg(long, global = true, env = "LEAF_LOADER_JARS_DIR")]
    pub loader_jars_dir: Option<PathBuf>,

    /// Comma separated mod ids to skip
    #[arg(long, global = true, env = "LEAF_DISABLED_MODS")]
    pub disable: Option<String>,

    /// Comma separated `id:version` pairs replacing discovered versions
    #[arg(long, global = true, env = "LEAF_VERSION_OVERRIDES")]
    pub version_overrides: Option<String>,

    /// Comma separated mod ids to load after the others
    #[arg(long, global = true, env = "LEAF_LOAD_LATE")]
    pub load_late: Option<String>,

    /// Stop after discovery
    #[arg(long, global = true, env = "LEAF_DRY_RUN")]
    pub dry_run: bool,

    /// Log level when LEAF_LOG is unset
    #[arg(long, global = true, env = "LEAF_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl LoaderFlags {
    /// Reads the configuration file and applies the flags on top
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a missing explicit file, an invalid file
    /// or a malformed flag value.
    pub fn load_config(&self) -> Result<LoaderConfig, ConfigError> {
        let game_dir = match &self.game_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .map_err(|e| invalid(format!("cannot determine current directory: {e}")))?,
        };
        let mut config = match &self.config {
            Some(path) => {
                let mut config = LoaderConfig::load(path)?;
                if self.game_dir.is_some() {
                    config.game_dir.clone_from(&game_dir);
                }
                config
            }
            None => LoaderConfig::discover(&game_dir)?,
        };
        tracing::debug!(
            target: "leaf::loader",
            game_dir = %config.game_dir.display(),
            "Configuration loaded ({CONFIG_FILE})"
        );

        self.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Log level for the binary: the flag, else `log_level` from `leaf.yaml`
    ///
    /// A configuration that fails to load yields `None`; the command reports
    /// that error itself.
    pub fn log_level_setting(&self) -> Option<String> {
        if self.log_level.is_some() {
            return self.log_level.clone();
        }
        self.load_config().ok().and_then(|config| config.log_level)
    }

    fn apply(&self, config: &mut LoaderConfig) -> Result<(), ConfigError> {
        if !self.mods_dirs.is_empty() {
            config.mods_dirs.clone_from(&self.mods_dirs);
        }
        if let Some(depth) = self.scan_depth {
            config.scan_depth = depth;
        }
        if let Some(add_mods) = &self.add_mods {
            config.add_mods.push(add_mods.clone());
        }
        if let Some(side) = self.side {
            config.side = side;
        }
        config.development |= self.development;
        if self.game_version.is_some() {
            config.game_version.clone_from(&self.game_version);
        }
        if !self.class_path.is_empty() {
            config.class_path.clone_from(&self.class_path);
        }
        if self.library_manifest.is_some() {
            config.library_manifest.clone_from(&self.library_manifest);
        }
        if self.libraries_dir.is_some() {
            config.libraries_dir.clone_from(&self.libraries_dir);
        }
        if self.loader_jars_dir.is_some() {
            config.loader_jars_dir.clone_from(&self.loader_jars_dir);
        }
        if let Some(disable) = &self.disable {
            config.disabled_mods.extend(parse_id_list(disable));
        }
        if let Some(overrides) = &self.version_overrides {
            for (id, version) in parse_version_overrides(overrides)? {
                config.version_overrides.insert(id, version.to_string());
            }
        }
        if let Some(load_late) = &self.load_late {
            config.load_late.extend(parse_id_list(load_late));
        }
        config.dry_run |= self.dry_run;
        if self.log_level.is_some() {
            config.log_level.clone_from(&self.log_level);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_scan() {
        let cli = Cli::try_parse_from(["leaf", "scan"]).expect("valid command line");
        assert!(matches!(cli.command, Commands::Scan(_)));
    }

    #[test]
    fn test_cli_parsing_transform() {
        let cli = Cli::try_parse_from(["leaf", "transform", "net/game/Player", "-o", "out.class"])
            .expect("valid command line");
        match cli.command {
            Commands::Transform(args) => {
                assert_eq!(args.class, "net/game/Player");
                assert_eq!(args.output, Some(PathBuf::from("out.class")));
            }
            other => panic!("Expected Transform command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing_version() {
        let cli = Cli::try_parse_from(["leaf", "version"]).expect("valid command line");
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "leaf",
            "resolve",
            "-g",
            "/tmp/game",
            "--side",
            "server",
            "--disable",
            "a,b",
        ])
        .expect("valid command line");
        assert_eq!(cli.loader.game_dir, Some(PathBuf::from("/tmp/game")));
        assert_eq!(cli.loader.side, Some(Side::Server));
        assert_eq!(cli.loader.disable.as_deref(), Some("a,b"));
    }

    #[test]
    fn test_cli_rejects_unknown_side() {
        assert!(Cli::try_parse_from(["leaf", "scan", "--side", "both"]).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "side: client\nscan_depth: 2\ndisabled_mods: [old]\n",
        )
        .expect("write config");

        let flags = LoaderFlags {
            game_dir: Some(temp.path().to_path_buf()),
            side: Some(Side::Server),
            disable: Some("extra".to_string()),
            version_overrides: Some("core:2.0.0".to_string()),
            ..LoaderFlags::default()
        };
        let config = flags.load_config().expect("config");

        assert_eq!(config.side, Side::Server);
        assert_eq!(config.scan_depth, 2);
        assert_eq!(config.disabled_mods, vec!["old", "extra"]);
        assert_eq!(config.version_overrides["core"], "2.0.0");
    }

    #[test]
    fn test_log_level_from_file() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        std::fs::write(temp.path().join(CONFIG_FILE), "log_level: debug\n").expect("write config");

        let flags = LoaderFlags {
            game_dir: Some(temp.path().to_path_buf()),
            ..LoaderFlags::default()
        };
        assert_eq!(flags.log_level_setting().as_deref(), Some("debug"));

        let flags = LoaderFlags {
            log_level: Some("warn".to_string()),
            ..flags
        };
        assert_eq!(flags.log_level_setting().as_deref(), Some("warn"));
    }

    #[test]
    fn test_bad_override_flag() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let flags = LoaderFlags {
            game_dir: Some(temp.path().to_path_buf()),
            version_overrides: Some("core".to_string()),
            ..LoaderFlags::default()
        };
        assert!(flags.load_config().is_err());
    }
}
