//! Error types and handling for the loader
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by the component that detects
//! the failure:
//! - [`scan`]: Candidate scanner errors (non-fatal, collected in the scan report)
//! - [`resolve`]: Dependency resolution errors
//! - [`transform`]: Class transform pipeline errors
//! - [`gate`]: Loading gate errors
//! - [`entrypoint`]: Entrypoint dispatch errors
//! - [`integrity`]: Installed-library verification errors
//! - [`query`]: Loader handle query errors
//! - [`config`]: Configuration errors
//!
//! [`LoaderError`] wraps all of them transparently so a boot failure keeps the
//! component's own diagnostic code and help text.

pub mod config;
pub mod entrypoint;
pub mod gate;
pub mod integrity;
pub mod query;
pub mod resolve;
pub mod scan;
pub mod transform;


use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

pub use config::ConfigError;
pub use entrypoint::EntrypointError;
pub use gate::GateError;
pub use integrity::IntegrityError;
pub use query::QueryError;
pub use resolve::ResolutionError;
pub use scan::ScanError;
pub use transform::TransformError;

/// The loader component that detected a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Scanner,
    Resolver,
    Pipeline,
    Gate,
    Dispatcher,
    Libraries,
    Orchestrator,
    Config,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Scanner => "scanner",
            Component::Resolver => "resolver",
            Component::Pipeline => "pipeline",
            Component::Gate => "gate",
            Component::Dispatcher => "dispatcher",
            Component::Libraries => "libraries",
            Component::Orchestrator => "orchestrator",
            Component::Config => "config",
        };
        f.write_str(name)
    }
}

/// Main error type for loader operations
#[derive(Error, Diagnostic, Debug)]
pub enum LoaderError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Entrypoint(#[from] EntrypointError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    // Orchestrator errors
    #[error("Cannot {operation} while the loader is {phase}")]
    #[diagnostic(
        code(leaf::loader::invalid_phase),
        help("Boot steps run in order: scan, resolve, install pipeline, run entrypoints")
    )]
    InvalidPhase { operation: String, phase: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(leaf::fs::io_error))]
    IoError { message: String },
}

impl LoaderError {
    /// The component that detected this error
    pub fn component(&self) -> Component {
        match self {
            LoaderError::Scan(_) => Component::Scanner,
            LoaderError::Resolution(_) => Component::Resolver,
            LoaderError::Transform(_) => Component::Pipeline,
            LoaderError::Gate(_) => Component::Gate,
            LoaderError::Entrypoint(_) => Component::Dispatcher,
            LoaderError::Integrity(_) => Component::Libraries,
            LoaderError::Config(_) => Component::Config,
            LoaderError::Query(_)
            | LoaderError::InvalidPhase { .. }
            | LoaderError::IoError { .. } => Component::Orchestrator,
        }
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for LoaderError {
    fn from(err: serde_yaml::Error) -> Self {
        LoaderError::Config(config::parse_failed("unknown", err.to_string()))
    }
}

impl From<serde_json::Error> for LoaderError {
    fn from(err: serde_json::Error) -> Self {
        LoaderError::Config(config::parse_failed("unknown", err.to_string()))
    }
}

/// Creates an out-of-order operation error
pub fn invalid_phase(operation: impl Into<String>, phase: impl fmt::Display) -> LoaderError {
    LoaderError::InvalidPhase {
        operation: operation.into(),
        phase: phase.to_string(),
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, LoaderError>;
