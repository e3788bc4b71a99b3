//! Candidate scanner errors
//!
//! A scan error never stops discovery: the offending package is skipped and
//! the error is kept in the scan report.

use miette::Diagnostic;
use thiserror::Error;

/// Why a single mod package could not become a candidate
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Failed to read mod package '{path}': {reason}")]
    #[diagnostic(code(leaf::scan::unreadable))]
    Unreadable { path: String, reason: String },

    #[error("Invalid manifest in '{path}': {reason}")]
    #[diagnostic(
        code(leaf::scan::invalid_manifest),
        help("leaf.mod.json must be a JSON object with at least 'id' and 'version'")
    )]
    InvalidManifest { path: String, reason: String },

    #[error("Mod manifest in '{path}' has no id")]
    #[diagnostic(code(leaf::scan::missing_id))]
    MissingId { path: String },

    #[error("Invalid mod id '{id}' in '{path}'")]
    #[diagnostic(
        code(leaf::scan::invalid_id),
        help(
            "Mod ids start with a lowercase letter, contain only a-z, 0-9, '-' and '_', and are 2 to 64 characters long"
        )
    )]
    InvalidId { path: String, id: String },

    #[error("Malformed version '{version}' of mod '{id}' in '{path}': {reason}")]
    #[diagnostic(
        code(leaf::scan::malformed_version),
        help("Versions look like 1.2.3, 1.2.3-beta.1 or 1.2.3+build.7")
    )]
    MalformedVersion {
        path: String,
        id: String,
        version: String,
        reason: String,
    },

    #[error("Malformed version range '{range}' for '{target}' in mod '{id}': {reason}")]
    #[diagnostic(
        code(leaf::scan::malformed_range),
        help("Ranges look like *, 1.2.3, >=1.2, <2, ~1.4, ^2.0 or 1.x")
    )]
    MalformedRange {
        path: String,
        id: String,
        target: String,
        range: String,
        reason: String,
    },

    #[error("Mod '{id}' in '{path}' declares a dependency on itself")]
    #[diagnostic(code(leaf::scan::self_dependency))]
    SelfDependency { path: String, id: String },

    #[error("Unsupported manifest schema version {schema} in '{path}'")]
    #[diagnostic(
        code(leaf::scan::unsupported_schema),
        help("This loader reads schemaVersion 1")
    )]
    UnsupportedSchema { path: String, schema: u64 },

    #[error("Mod '{id}' references missing resource '{resource}' in '{path}'")]
    #[diagnostic(code(leaf::scan::missing_resource))]
    MissingResource {
        path: String,
        id: String,
        resource: String,
    },

    #[error("Malformed resource '{resource}' of mod '{id}': {reason}")]
    #[diagnostic(code(leaf::scan::malformed_resource))]
    MalformedResource {
        path: String,
        id: String,
        resource: String,
        reason: String,
    },

    #[error("Mod '{id}' from '{path}' does not run on side '{side}'")]
    #[diagnostic(code(leaf::scan::wrong_environment))]
    WrongEnvironment {
        path: String,
        id: String,
        side: String,
    },
}

impl ScanError {
    /// Origin path of the package that failed
    pub fn path(&self) -> &str {
        match self {
            ScanError::Unreadable { path, .. }
            | ScanError::InvalidManifest { path, .. }
            | ScanError::MissingId { path }
            | ScanError::InvalidId { path, .. }
            | ScanError::MalformedVersion { path, .. }
            | ScanError::MalformedRange { path, .. }
            | ScanError::SelfDependency { path, .. }
            | ScanError::UnsupportedSchema { path, .. }
            | ScanError::MissingResource { path, .. }
            | ScanError::MalformedResource { path, .. }
            | ScanError::WrongEnvironment { path, .. } => path,
        }
    }
}

/// Creates a package read error
pub fn unreadable(path: impl Into<String>, reason: impl Into<String>) -> ScanError {
    ScanError::Unreadable {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a manifest syntax error
pub fn invalid_manifest(path: impl Into<String>, reason: impl Into<String>) -> ScanError {
    ScanError::InvalidManifest {
        path: path.into(),
        reason: reason.into(),
    }
}
