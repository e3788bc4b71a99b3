//! Mod metadata model
//!
//! This module provides the immutable description of a mod candidate:
//! - [`version`]: [`Version`] parsing and total order
//! - [`range`]: [`VersionRange`] predicates
//! - [`dependency`]: [`ModDependency`] declarations
//! - [`manifest`]: `leaf.mod.json` parsing and validation
//!
//! A [`ModMetadata`] is built once by the scanner and then shared as
//! `Arc<ModMetadata>` by the resolver, the transform pipeline and the
//! entrypoint dispatcher.

pub mod dependency;
pub mod manifest;
pub mod range;
pub mod version;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use dependency::{DependencyKind, ModDependency};
pub use manifest::{MANIFEST_FILE, ResourceReader, parse_manifest};
pub use range::VersionRange;
pub use version::Version;

use crate::transform::access::AccessRule;
use crate::transform::mixin::MixinPatch;

/// A version or range string that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version '{input}': {reason}")]
pub struct ParseError {
    pub input: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// The physical side the game runs as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Client,
    Server,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Client => "client",
            Side::Server => "server",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(Side::Client),
            "server" | "dedicated_server" => Ok(Side::Server),
            other => Err(format!("unknown side '{other}', expected client or server")),
        }
    }
}

/// Sides a mod declares it can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Environment {
    #[default]
    #[serde(rename = "*")]
    Any,
    #[serde(rename = "client")]
    Client,
    #[serde(rename = "server")]
    Server,
}

impl Environment {
    pub fn allows(self, side: Side) -> bool {
        match self {
            Environment::Any => true,
            Environment::Client => side == Side::Client,
            Environment::Server => side == Side::Server,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Any => "*",
            Environment::Client => "client",
            Environment::Server => "server",
        })
    }
}

/// Where a candidate came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModOrigin {
    /// A directory containing leaf.mod.json
    Directory(PathBuf),
    /// A zip archive containing leaf.mod.json
    Archive(PathBuf),
    /// Provided by the loader itself (the game, the loader)
    Builtin,
}

impl ModOrigin {
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ModOrigin::Directory(path) | ModOrigin::Archive(path) => Some(path),
            ModOrigin::Builtin => None,
        }
    }
}

impl fmt::Display for ModOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModOrigin::Directory(path) | ModOrigin::Archive(path) => {
                write!(f, "{}", path.display())
            }
            ModOrigin::Builtin => f.write_str("<builtin>"),
        }
    }
}

/// One entrypoint declared by a mod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrypointDescriptor {
    /// Phase name: preLaunch, main, client, server or custom
    pub phase: String,
    /// Adapter-specific reference, usually a registered hook name
    pub reference: String,
    /// Language adapter key
    pub adapter: String,
}

/// Parsed, validated description of a mod candidate
#[derive(Debug, Clone)]
pub struct ModMetadata {
    pub id: String,
    pub version: Version,
    pub name: Option<String>,
    pub description: Option<String>,
    pub authors: Vec<String>,
    pub environment: Environment,
    pub dependencies: Vec<ModDependency>,
    pub entrypoints: Vec<EntrypointDescriptor>,
    pub access_rules: Vec<AccessRule>,
    pub mixins: Vec<MixinPatch>,
    pub origin: ModOrigin,
}

impl ModMetadata {
    /// A builtin candidate with no dependencies or class changes
    pub fn builtin(id: impl Into<String>, version: Version, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version,
            name: Some(name.into()),
            description: None,
            authors: Vec::new(),
            environment: Environment::Any,
            dependencies: Vec::new(),
            entrypoints: Vec::new(),
            access_rules: Vec::new(),
            mixins: Vec::new(),
            origin: ModOrigin::Builtin,
        }
    }

    /// Name for display, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Dependencies of one kind
    pub fn dependencies_of(&self, kind: DependencyKind) -> impl Iterator<Item = &ModDependency> {
        self.dependencies.iter().filter(move |d| d.kind == kind)
    }

    /// Entrypoints declared for a phase, in declaration order
    pub fn entrypoints_for<'a>(
        &'a self,
        phase: &'a str,
    ) -> impl Iterator<Item = &'a EntrypointDescriptor> + 'a {
        self.entrypoints.iter().filter(move |e| e.phase == phase)
    }

    /// Copy of this metadata with another version
    pub fn with_version(&self, version: Version) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    /// Short `id version` label used in reports
    pub fn label(&self) -> String {
        format!("{} {}", self.id, self.version)
    }
}
