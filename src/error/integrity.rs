//! Installed-library verification errors

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("Failed to read library manifest '{path}': {reason}")]
    #[diagnostic(code(leaf::libraries::manifest_unreadable))]
    ManifestUnreadable { path: String, reason: String },

    #[error("Unsupported library manifest version {version}")]
    #[diagnostic(code(leaf::libraries::unsupported_manifest))]
    UnsupportedManifest { version: u32 },

    #[error("Library '{artifact}' is missing required field '{field}'")]
    #[diagnostic(code(leaf::libraries::incomplete_entry))]
    IncompleteEntry { artifact: String, field: String },

    #[error("Invalid maven coordinate '{artifact}'")]
    #[diagnostic(
        code(leaf::libraries::invalid_coordinate),
        help("Coordinates look like group:artifact:version[:classifier]")
    )]
    InvalidCoordinate { artifact: String },

    #[error("Library '{artifact}' is not installed at '{path}'")]
    #[diagnostic(
        code(leaf::libraries::missing),
        help("Re-run the installer to restore the loader libraries")
    )]
    Missing { artifact: String, path: String },

    #[error("Failed to read library '{artifact}' at '{path}': {reason}")]
    #[diagnostic(code(leaf::libraries::unreadable))]
    Unreadable {
        artifact: String,
        path: String,
        reason: String,
    },

    #[error("Library '{artifact}' has size {actual}, expected {expected}")]
    #[diagnostic(code(leaf::libraries::size_mismatch))]
    SizeMismatch {
        artifact: String,
        expected: u64,
        actual: u64,
    },

    #[error(
        "Library '{artifact}' failed {algorithm} verification: expected {expected}, got {actual}"
    )]
    #[diagnostic(
        code(leaf::libraries::hash_mismatch),
        help("The installed file is corrupt or was replaced. Re-run the installer")
    )]
    HashMismatch {
        artifact: String,
        algorithm: String,
        expected: String,
        actual: String,
    },
}

impl IntegrityError {
    /// The artifact the error is about, if it concerns a single library
    pub fn artifact(&self) -> Option<&str> {
        match self {
            IntegrityError::IncompleteEntry { artifact, .. }
            | IntegrityError::InvalidCoordinate { artifact }
            | IntegrityError::Missing { artifact, .. }
            | IntegrityError::Unreadable { artifact, .. }
            | IntegrityError::SizeMismatch { artifact, .. }
            | IntegrityError::HashMismatch { artifact, .. } => Some(artifact),
            IntegrityError::ManifestUnreadable { .. }
            | IntegrityError::UnsupportedManifest { .. } => None,
        }
    }
}
