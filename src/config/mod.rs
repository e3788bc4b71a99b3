//! Loader configuration (`leaf.yaml`)
//!
//! The configuration is read from `leaf.yaml` in the game directory (or an
//! explicit path). Command line flags and `LEAF_*` environment variables are
//! applied on top by the binary. Relative paths are resolved against
//! `game_dir`.
//!
//! ```yaml
//! side: server
//! mods_dirs: [mods, workshop/mods]
//! game_version: 41.78.16
//! authority:
//!   include: ["zombie/**"]
//! version_overrides:
//!   examplemod: 1.0.1
//! ```

pub mod overrides;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::discovery::ScanOptions;
use crate::error::ConfigError;
use crate::error::config::{invalid, not_found, parse_failed, read_failed};
use crate::gate::Authority;
use crate::metadata::{ModMetadata, Side, Version};
use crate::transform::remap::Mappings;

/// Configuration file name looked up in the game directory
pub const CONFIG_FILE: &str = "leaf.yaml";

/// Id of the builtin loader mod
pub const LOADER_MOD_ID: &str = "leafloader";

/// Default id of the builtin game mod
pub const DEFAULT_GAME_ID: &str = "game";

/// Class name globs the gate serves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Empty means every class
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Runtime remapping settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingsConfig {
    /// tiny v2 file
    pub path: PathBuf,
    /// Namespace mods and class sources use
    #[serde(default = "default_from_namespace")]
    pub from: String,
    /// Namespace the game runs in
    #[serde(default = "default_to_namespace")]
    pub to: String,
}

fn default_from_namespace() -> String {
    "named".to_string()
}

fn default_to_namespace() -> String {
    "official".to_string()
}

/// Everything the loader needs to boot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub game_dir: PathBuf,

    /// Mod search directories; `<game_dir>/mods` when empty
    pub mods_dirs: Vec<PathBuf>,

    /// How deep below each mods directory packages are looked for
    pub scan_depth: usize,

    /// Extra packages; entries may use `@file` lists
    pub add_mods: Vec<String>,

    pub side: Side,

    pub development: bool,

    /// Id and version of the builtin game mod
    pub game_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_version: Option<String>,

    /// Directories and archives holding the game's class images
    pub class_path: Vec<PathBuf>,

    pub authority: AuthorityConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mappings: Option<MappingsConfig>,

    /// Installed-library manifest to verify before boot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_manifest: Option<PathBuf>,

    /// Maven layout root; `<game_dir>/libraries` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libraries_dir: Option<PathBuf>,

    /// Where development library entries live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader_jars_dir: Option<PathBuf>,

    pub disabled_mods: Vec<String>,

    pub version_overrides: BTreeMap<String, String>,

    /// Mods to load after the others where dependency order allows
    pub load_late: Vec<String>,

    /// Classes transformed during boot; a failure aborts boot
    pub eager_classes: Vec<String>,

    /// Stop after discovery
    pub dry_run: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            game_dir: PathBuf::from("."),
            mods_dirs: Vec::new(),
            scan_depth: 1,
            add_mods: Vec::new(),
            side: Side::Client,
            development: false,
            game_id: DEFAULT_GAME_ID.to_string(),
            game_version: None,
            class_path: Vec::new(),
            authority: AuthorityConfig::default(),
            mappings: None,
            library_manifest: None,
            libraries_dir: None,
            loader_jars_dir: None,
            disabled_mods: Vec::new(),
            version_overrides: BTreeMap::new(),
            load_late: Vec::new(),
            eager_classes: Vec::new(),
            dry_run: false,
            log_level: None,
        }
    }
}

impl LoaderConfig {
    /// Default configuration rooted at a game directory
    pub fn for_game_dir(game_dir: impl Into<PathBuf>) -> Self {
        Self {
            game_dir: game_dir.into(),
            ..Self::default()
        }
    }

    /// Parse configuration from YAML string
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseFailed`] for invalid YAML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| parse_failed(CONFIG_FILE, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to YAML string
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| invalid(e.to_string()))
    }

    /// Load configuration from a file
    ///
    /// A `game_dir` missing from the file defaults to the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(not_found(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| read_failed(path.display().to_string(), e.to_string()))?;
        let value: serde_yaml::Value = serde_yaml::from_str(&text)
            .map_err(|e| parse_failed(path.display().to_string(), e.to_string()))?;
        let has_game_dir = value.get("game_dir").is_some();

        let mut config: Self = if value.is_null() {
            Self::default()
        } else {
            serde_yaml::from_value(value)
                .map_err(|e| parse_failed(path.display().to_string(), e.to_string()))?
        };
        if !has_game_dir {
            config.game_dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        }
        config.validate()?;
        Ok(config)
    }

    /// `<game_dir>/leaf.yaml` if it exists, otherwise defaults for `game_dir`
    ///
    /// # Errors
    ///
    /// Returns the error of [`LoaderConfig::load`] for an existing but invalid file.
    pub fn discover(game_dir: &Path) -> Result<Self, ConfigError> {
        let path = game_dir.join(CONFIG_FILE);
        if path.is_file() {
            let mut config = Self::load(&path)?;
            config.game_dir = game_dir.to_path_buf();
            Ok(config)
        } else {
            Ok(Self::for_game_dir(game_dir))
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_depth == 0 {
            return Err(invalid("scan_depth must be at least 1"));
        }
        if self.game_id.trim().is_empty() {
            return Err(invalid("game_id must not be empty"));
        }
        self.builtin_game_version()?;
        self.parsed_version_overrides()?;
        self.authority()?;
        Ok(())
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.game_dir.join(path)
        }
    }

    pub fn effective_mods_dirs(&self) -> Vec<PathBuf> {
        if self.mods_dirs.is_empty() {
            vec![self.game_dir.join("mods")]
        } else {
            self.mods_dirs.iter().map(|p| self.resolve_path(p)).collect()
        }
    }

    pub fn effective_libraries_dir(&self) -> PathBuf {
        self.libraries_dir
            .as_deref()
            .map_or_else(|| self.game_dir.join("libraries"), |p| self.resolve_path(p))
    }

    pub fn effective_loader_jars_dir(&self) -> Option<PathBuf> {
        self.loader_jars_dir.as_deref().map(|p| self.resolve_path(p))
    }

    pub fn effective_library_manifest(&self) -> Option<PathBuf> {
        self.library_manifest.as_deref().map(|p| self.resolve_path(p))
    }

    pub fn effective_class_path(&self) -> Vec<PathBuf> {
        self.class_path.iter().map(|p| self.resolve_path(p)).collect()
    }

    fn builtin_game_version(&self) -> Result<Version, ConfigError> {
        match &self.game_version {
            Some(text) => Version::parse(text)
                .map_err(|e| invalid(format!("game_version '{text}': {e}"))),
            None => Ok(Version::new([0, 0, 0])),
        }
    }

    /// The game and loader mods every mod set contains
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a malformed `game_version`.
    pub fn builtin_mods(&self) -> Result<Vec<ModMetadata>, ConfigError> {
        let loader_version = Version::parse(env!("CARGO_PKG_VERSION"))
            .map_err(|e| invalid(format!("loader version: {e}")))?;
        Ok(vec![
            ModMetadata::builtin(&self.game_id, self.builtin_game_version()?, &self.game_id),
            ModMetadata::builtin(LOADER_MOD_ID, loader_version, "Leaf Loader"),
        ])
    }

    /// Parsed `version_overrides`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a malformed version.
    pub fn parsed_version_overrides(&self) -> Result<BTreeMap<String, Version>, ConfigError> {
        self.version_overrides
            .iter()
            .map(|(id, text)| {
                Version::parse(text)
                    .map(|v| (id.clone(), v))
                    .map_err(|e| invalid(format!("version override for '{id}': {e}")))
            })
            .collect()
    }

    /// Scanner options for this configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for malformed versions.
    pub fn scan_options(&self) -> Result<ScanOptions, ConfigError> {
        Ok(ScanOptions {
            mods_dirs: self.effective_mods_dirs(),
            depth: self.scan_depth,
            add_mods: self.add_mods.clone(),
            side: self.side,
            builtins: self.builtin_mods()?,
            disabled: self.disabled_mods.iter().cloned().collect(),
            version_overrides: self.parsed_version_overrides()?,
        })
    }

    pub fn load_late_ids(&self) -> BTreeSet<String> {
        self.load_late.iter().cloned().collect()
    }

    /// Gate authority from the configured globs
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a bad glob.
    pub fn authority(&self) -> Result<Authority, ConfigError> {
        Authority::new(&self.authority.include, &self.authority.exclude)
    }

    /// Reads the configured mappings file, if any
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadFailed`] or [`ConfigError::Invalid`] when
    /// the file cannot be read or parsed.
    pub fn load_mappings(&self) -> Result<Option<Arc<Mappings>>, ConfigError> {
        let Some(mappings) = &self.mappings else {
            return Ok(None);
        };
        let path = self.resolve_path(&mappings.path);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| read_failed(path.display().to_string(), e.to_string()))?;
        let parsed = Mappings::parse_tiny_v2(&text, &mappings.from, &mappings.to)
            .map_err(|e| invalid(format!("mappings '{}': {e}", path.display())))?;
        Ok(Some(Arc::new(parsed)))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::for_game_dir("/games/zomboid");
        assert_eq!(
            config.effective_mods_dirs(),
            vec![PathBuf::from("/games/zomboid/mods")]
        );
        assert_eq!(
            config.effective_libraries_dir(),
            PathBuf::from("/games/zomboid/libraries")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let config = LoaderConfig::from_yaml(
            "side: server\nmods_dirs: [mods, /abs/mods]\ngame_version: 41.78.16\nload_late: [slow]\n",
        )
        .expect("valid config");
        assert_eq!(config.side, Side::Server);
        assert_eq!(
            config.effective_mods_dirs(),
            vec![PathBuf::from("./mods"), PathBuf::from("/abs/mods")]
        );
        assert!(config.load_late_ids().contains("slow"));

        let builtins = config.builtin_mods().expect("builtins");
        assert_eq!(builtins[0].id, DEFAULT_GAME_ID);
        assert_eq!(builtins[0].version.to_string(), "41.78.16");
        assert_eq!(builtins[1].id, LOADER_MOD_ID);
    }

    #[test]
    fn test_invalid_values() {
        assert!(LoaderConfig::from_yaml("scan_depth: 0\n").is_err());
        assert!(LoaderConfig::from_yaml("game_version: not.a.version!\n").is_err());
        assert!(LoaderConfig::from_yaml("version_overrides: {a: bogus}\n").is_err());
        assert!(LoaderConfig::from_yaml("authority: {include: ['a/[']}\n").is_err());
        assert!(matches!(
            LoaderConfig::from_yaml("side: [1, 2]\n"),
            Err(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn test_load_defaults_game_dir_to_file_dir() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = temp.path().join(CONFIG_FILE);
        std::fs::write(&path, "dry_run: true\n").expect("write config");

        let config = LoaderConfig::load(&path).expect("load");
        assert!(config.dry_run);
        assert_eq!(config.game_dir, temp.path());

        let discovered = LoaderConfig::discover(temp.path()).expect("discover");
        assert!(discovered.dry_run);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            LoaderConfig::load(Path::new("/no/such/leaf.yaml")),
            Err(ConfigError::NotFound { .. })
        ));
        let defaults = LoaderConfig::discover(Path::new("/no/such/dir")).expect("defaults");
        assert!(!defaults.dry_run);
    }

    #[test]
    fn test_yaml_round_trip_keeps_fields() {
        let mut config = LoaderConfig::for_game_dir("/g");
        config.disabled_mods.push("broken".to_string());
        let yaml = config.to_yaml().expect("serialize");
        assert_eq!(LoaderConfig::from_yaml(&yaml).expect("parse"), config);
    }
}
