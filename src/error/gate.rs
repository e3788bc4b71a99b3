//! Loading gate errors

use miette::Diagnostic;
use thiserror::Error;

use super::TransformError;

/// A class request that could not be served
///
/// Gate errors are cloned into the per-class slot so every later request
/// for the same name observes the same failure.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Class '{name}' was not found in any class source")]
    #[diagnostic(code(leaf::gate::class_not_found))]
    ClassNotFound { name: String },

    #[error("Failed to read class '{name}': {reason}")]
    #[diagnostic(code(leaf::gate::read_failed))]
    ReadFailed { name: String, reason: String },

    #[error("Invalid class name '{name}'")]
    #[diagnostic(
        code(leaf::gate::invalid_name),
        help("Class names use '/' as package separator, e.g. net/game/Player")
    )]
    InvalidName { name: String },

    #[error("Class '{name}' is a source name; the runtime name is '{runtime}'")]
    #[diagnostic(
        code(leaf::gate::source_name),
        help("Request classes by their runtime name when mappings are active")
    )]
    SourceName { name: String, runtime: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transform(#[from] TransformError),

    #[error("Host refused to define class '{name}': {reason}")]
    #[diagnostic(code(leaf::gate::define_failed))]
    DefineFailed { name: String, reason: String },
}

/// Creates a read error for a class source
pub fn read_failed(name: impl Into<String>, reason: impl Into<String>) -> GateError {
    GateError::ReadFailed {
        name: name.into(),
        reason: reason.into(),
    }
}
