//! Class transform pipeline errors
//!
//! Every variant names the class being transformed. Unit and mod are named
//! whenever the failure can be attributed to them.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Class '{class}' is not a valid class image: {reason}")]
    #[diagnostic(code(leaf::transform::malformed))]
    Malformed { class: String, reason: String },

    #[error("[{unit}] mod '{mod_id}' targets {target} which does not exist in class '{class}'")]
    #[diagnostic(
        code(leaf::transform::missing_target),
        help("The mod was likely built against a different game version")
    )]
    MissingTarget {
        unit: String,
        class: String,
        mod_id: String,
        target: String,
    },

    #[error("[{unit}] mod '{mod_id}' cannot patch class '{class}': {reason}")]
    #[diagnostic(code(leaf::transform::structural))]
    Structural {
        unit: String,
        class: String,
        mod_id: String,
        reason: String,
    },

    #[error("[{unit}] Cannot load class '{class}' in environment type '{side}'")]
    #[diagnostic(code(leaf::transform::wrong_environment))]
    WrongEnvironment {
        unit: String,
        class: String,
        side: String,
    },

    #[error("Failed to encode class '{class}': {reason}")]
    #[diagnostic(code(leaf::transform::encode_failed))]
    Encode { class: String, reason: String },
}

impl TransformError {
    /// Name of the class whose transformation failed
    pub fn class(&self) -> &str {
        match self {
            TransformError::Malformed { class, .. }
            | TransformError::MissingTarget { class, .. }
            | TransformError::Structural { class, .. }
            | TransformError::WrongEnvironment { class, .. }
            | TransformError::Encode { class, .. } => class,
        }
    }

    /// Name of the unit that aborted, if the failure happened inside one
    pub fn unit(&self) -> Option<&str> {
        match self {
            TransformError::MissingTarget { unit, .. }
            | TransformError::Structural { unit, .. }
            | TransformError::WrongEnvironment { unit, .. } => Some(unit),
            TransformError::Malformed { .. } | TransformError::Encode { .. } => None,
        }
    }

    /// The mod whose rule or patch caused the failure
    pub fn mod_id(&self) -> Option<&str> {
        match self {
            TransformError::MissingTarget { mod_id, .. }
            | TransformError::Structural { mod_id, .. } => Some(mod_id),
            _ => None,
        }
    }
}

/// Creates a missing target error
pub fn missing_target(
    unit: &str,
    class: &str,
    mod_id: &str,
    target: impl Into<String>,
) -> TransformError {
    TransformError::MissingTarget {
        unit: unit.to_string(),
        class: class.to_string(),
        mod_id: mod_id.to_string(),
        target: target.into(),
    }
}

/// Creates a structural conflict error
pub fn structural(
    unit: &str,
    class: &str,
    mod_id: &str,
    reason: impl Into<String>,
) -> TransformError {
    TransformError::Structural {
        unit: unit.to_string(),
        class: class.to_string(),
        mod_id: mod_id.to_string(),
        reason: reason.into(),
    }
}
