//! Loader handle query errors

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Mod list is not available yet: loader is {phase}")]
    #[diagnostic(
        code(leaf::query::not_yet_available),
        help("Mod queries answer once the loader has installed its class pipeline")
    )]
    NotYetAvailable { phase: String },

    #[error("Loader failed during {stage}")]
    #[diagnostic(code(leaf::query::loader_failed))]
    LoaderFailed { stage: String },

    #[error("A global loader handle is already installed")]
    #[diagnostic(code(leaf::query::global_installed))]
    GlobalAlreadyInstalled,

    #[error("No global loader handle is installed")]
    #[diagnostic(code(leaf::query::global_missing))]
    GlobalNotInstalled,
}
