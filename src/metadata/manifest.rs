//! leaf.mod.json parsing and validation
//!
//! ## Format
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "id": "examplemod",
//!   "version": "1.0.0",
//!   "environment": "*",
//!   "entrypoints": { "main": ["example.Init"] },
//!   "depends": { "core": ">=2.0" },
//!   "accessWidener": "example.accesswidener",
//!   "mixins": ["example.mixins.json"]
//! }
//! ```
//!
//! Files referenced by the manifest are read through a [`ResourceReader`]
//! so directory and archive packages share one code path.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{
    DependencyKind, EntrypointDescriptor, Environment, ModDependency, ModMetadata, ModOrigin,
    Version,
};
use crate::error::ScanError;
use crate::error::scan::invalid_manifest;
use crate::transform::access;
use crate::transform::mixin;

/// Manifest file name at the root of a mod package
pub const MANIFEST_FILE: &str = "leaf.mod.json";

/// Highest manifest schema this loader reads
pub const SCHEMA_VERSION: u64 = 1;

/// Default language adapter key for entrypoints
pub const DEFAULT_ADAPTER: &str = "default";

/// Read access to files inside a mod package
pub trait ResourceReader {
    /// Reads a package-relative file, `Ok(None)` when it does not exist
    ///
    /// # Errors
    ///
    /// Returns a human readable reason when the file exists but cannot be read.
    fn read_resource(&self, path: &str) -> Result<Option<Vec<u8>>, String>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    #[serde(default = "default_schema")]
    schema_version: u64,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    authors: Vec<RawAuthor>,
    #[serde(default)]
    environment: Environment,
    #[serde(default)]
    entrypoints: BTreeMap<String, Vec<RawEntrypoint>>,
    #[serde(default, alias = "requires")]
    depends: BTreeMap<String, RawRanges>,
    #[serde(default)]
    recommends: BTreeMap<String, RawRanges>,
    #[serde(default)]
    breaks: BTreeMap<String, RawRanges>,
    #[serde(default)]
    conflicts: BTreeMap<String, RawRanges>,
    #[serde(default)]
    access_widener: Option<String>,
    #[serde(default)]
    access_widening: Vec<String>,
    #[serde(default)]
    mixins: Vec<String>,
}

fn default_schema() -> u64 {
    SCHEMA_VERSION
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAuthor {
    Name(String),
    Person { name: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntrypoint {
    Reference(String),
    Adapted {
        #[serde(default = "default_adapter")]
        adapter: String,
        value: String,
    },
}

fn default_adapter() -> String {
    DEFAULT_ADAPTER.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRanges {
    One(String),
    Many(Vec<String>),
}

impl RawRanges {
    fn as_slice(&self) -> &[String] {
        match self {
            RawRanges::One(s) => std::slice::from_ref(s),
            RawRanges::Many(v) => v,
        }
    }
}

/// Checks the mod id shape: `^[a-z][a-z0-9_-]{1,63}$`
pub fn is_valid_mod_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    (2..=64).contains(&bytes.len())
        && bytes[0].is_ascii_lowercase()
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-' || *b == b'_')
}

/// Parses and validates a manifest
///
/// # Arguments
///
/// * `bytes` - Raw contents of leaf.mod.json
/// * `origin` - Where the package lives; also used to label errors
/// * `resources` - Reader for access widener and mixin files in the package
///
/// # Errors
///
/// Returns the first [`ScanError`] found. Validation stops at the first
/// problem because later checks depend on the id being known.
pub fn parse_manifest(
    bytes: &[u8],
    origin: ModOrigin,
    resources: &dyn ResourceReader,
) -> Result<ModMetadata, ScanError> {
    let path = origin.to_string();
    let raw: RawManifest =
        serde_json::from_slice(bytes).map_err(|e| invalid_manifest(&path, e.to_string()))?;

    if raw.schema_version != SCHEMA_VERSION {
        return Err(ScanError::UnsupportedSchema {
            path,
            schema: raw.schema_version,
        });
    }

    let id = match raw.id.as_deref().map(str::trim) {
        None | Some("") => return Err(ScanError::MissingId { path }),
        Some(id) => id.to_string(),
    };
    if !is_valid_mod_id(&id) {
        return Err(ScanError::InvalidId { path, id });
    }

    let version_text = raw.version.clone().unwrap_or_default();
    let version = Version::parse(&version_text).map_err(|e| ScanError::MalformedVersion {
        path: path.clone(),
        id: id.clone(),
        version: version_text.clone(),
        reason: e.reason,
    })?;

    let dependencies = parse_dependencies(&raw, &path, &id)?;

    let entrypoints = raw
        .entrypoints
        .iter()
        .flat_map(|(phase, entries)| {
            entries.iter().map(move |entry| match entry {
                RawEntrypoint::Reference(reference) => EntrypointDescriptor {
                    phase: phase.clone(),
                    reference: reference.clone(),
                    adapter: default_adapter(),
                },
                RawEntrypoint::Adapted { adapter, value } => EntrypointDescriptor {
                    phase: phase.clone(),
                    reference: value.clone(),
                    adapter: adapter.clone(),
                },
            })
        })
        .collect();

    let access_rules = parse_access_rules(&raw, &path, &id, resources)?;
    let mixins = parse_mixins(&raw, &path, &id, resources)?;

    Ok(ModMetadata {
        id,
        version,
        name: raw.name,
        description: raw.description,
        authors: raw
            .authors
            .into_iter()
            .map(|a| match a {
                RawAuthor::Name(name) | RawAuthor::Person { name } => name,
            })
            .collect(),
        environment: raw.environment,
        dependencies,
        entrypoints,
        access_rules,
        mixins,
        origin,
    })
}

fn parse_dependencies(
    raw: &RawManifest,
    path: &str,
    id: &str,
) -> Result<Vec<ModDependency>, ScanError> {
    let tables = [
        (DependencyKind::Requires, &raw.depends),
        (DependencyKind::Recommends, &raw.recommends),
        (DependencyKind::Breaks, &raw.breaks),
        (DependencyKind::Conflicts, &raw.conflicts),
    ];

    let mut dependencies = Vec::new();
    for (kind, table) in tables {
        for (target, ranges) in table {
            if target == id {
                return Err(ScanError::SelfDependency {
                    path: path.to_string(),
                    id: id.to_string(),
                });
            }
            let dependency = ModDependency::parse(target.clone(), ranges.as_slice(), kind)
                .map_err(|e| ScanError::MalformedRange {
                    path: path.to_string(),
                    id: id.to_string(),
                    target: target.clone(),
                    range: e.input,
                    reason: e.reason,
                })?;
            dependencies.push(dependency);
        }
    }
    Ok(dependencies)
}

fn read_text(
    resources: &dyn ResourceReader,
    path: &str,
    id: &str,
    resource: &str,
) -> Result<String, ScanError> {
    let bytes = resources
        .read_resource(resource)
        .map_err(|reason| ScanError::MalformedResource {
            path: path.to_string(),
            id: id.to_string(),
            resource: resource.to_string(),
            reason,
        })?
        .ok_or_else(|| ScanError::MissingResource {
            path: path.to_string(),
            id: id.to_string(),
            resource: resource.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| ScanError::MalformedResource {
        path: path.to_string(),
        id: id.to_string(),
        resource: resource.to_string(),
        reason: e.to_string(),
    })
}

fn parse_access_rules(
    raw: &RawManifest,
    path: &str,
    id: &str,
    resources: &dyn ResourceReader,
) -> Result<Vec<access::AccessRule>, ScanError> {
    let malformed = |resource: &str, reason: String| ScanError::MalformedResource {
        path: path.to_string(),
        id: id.to_string(),
        resource: resource.to_string(),
        reason,
    };

    let mut rules = Vec::new();
    if let Some(file) = &raw.access_widener {
        let text = read_text(resources, path, id, file)?;
        let parsed = access::parse_access_widener(id, &text).map_err(|r| malformed(file, r))?;
        rules.extend(parsed.rules);
    }
    for line in &raw.access_widening {
        if let Some(rule) =
            access::parse_rule_line(id, line).map_err(|r| malformed("accessWidening", r))?
        {
            rules.push(rule);
        }
    }
    Ok(rules)
}

fn parse_mixins(
    raw: &RawManifest,
    path: &str,
    id: &str,
    resources: &dyn ResourceReader,
) -> Result<Vec<mixin::MixinPatch>, ScanError> {
    let mut patches = Vec::new();
    for file in &raw.mixins {
        let text = read_text(resources, path, id, file)?;
        let parsed = mixin::parse_mixin_config(id, &text, patches.len()).map_err(|reason| {
            ScanError::MalformedResource {
                path: path.to_string(),
                id: id.to_string(),
                resource: file.clone(),
                reason,
            }
        })?;
        patches.extend(parsed);
    }
    Ok(patches)
}
