//! Entrypoint dispatch errors

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum EntrypointError {
    #[error("Could not execute entrypoint stage '{phase}' due to errors, provided by '{mod_id}' ({reference}): {reason}")]
    #[diagnostic(code(leaf::entrypoint::hook_failed))]
    HookFailed {
        mod_id: String,
        phase: String,
        reference: String,
        reason: String,
    },

    #[error("Mod '{mod_id}' uses unknown language adapter '{adapter}'")]
    #[diagnostic(
        code(leaf::entrypoint::unknown_adapter),
        help("Register the adapter with the loader before booting")
    )]
    UnknownAdapter { mod_id: String, adapter: String },

    #[error("Failed to create entrypoint '{reference}' of mod '{mod_id}' for stage '{phase}': {reason}")]
    #[diagnostic(code(leaf::entrypoint::create_failed))]
    CreateFailed {
        mod_id: String,
        phase: String,
        reference: String,
        reason: String,
    },

    #[error("Could not execute entrypoint stage '{phase}': {} entrypoints failed", .failures.len())]
    #[diagnostic(code(leaf::entrypoint::phase_failed))]
    PhaseFailed {
        phase: String,
        #[related]
        failures: Vec<EntrypointError>,
    },

    #[error("Entrypoint stage '{phase}' was already dispatched")]
    #[diagnostic(code(leaf::entrypoint::already_dispatched))]
    AlreadyDispatched { phase: String },
}

impl EntrypointError {
    /// The mod whose entrypoint failed, if any
    pub fn mod_id(&self) -> Option<&str> {
        match self {
            EntrypointError::HookFailed { mod_id, .. }
            | EntrypointError::UnknownAdapter { mod_id, .. }
            | EntrypointError::CreateFailed { mod_id, .. } => Some(mod_id),
            EntrypointError::PhaseFailed { failures, .. } => {
                failures.first().and_then(EntrypointError::mod_id)
            }
            EntrypointError::AlreadyDispatched { .. } => None,
        }
    }
}
