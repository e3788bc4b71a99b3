//! Dependency resolution errors

use miette::Diagnostic;
use thiserror::Error;

use crate::resolver::ConflictSet;

/// Resolution failed for the discovered candidates
#[derive(Error, Diagnostic, Debug, Clone)]
pub enum ResolutionError {
    #[error("Incompatible mod set:\n{conflict}")]
    #[diagnostic(
        code(leaf::resolve::unsatisfiable),
        help("Remove, update or add one of the mods listed above")
    )]
    Unsatisfiable { conflict: ConflictSet },
}

impl ResolutionError {
    /// The minimal set of candidates and constraints that cannot hold together
    pub fn conflict(&self) -> &ConflictSet {
        match self {
            ResolutionError::Unsatisfiable { conflict } => conflict,
        }
    }
}
