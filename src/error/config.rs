//! Configuration errors

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(leaf::config::not_found))]
    NotFound { path: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(leaf::config::parse_failed))]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(leaf::config::invalid))]
    Invalid { message: String },

    #[error("Failed to read configuration file: {path}: {reason}")]
    #[diagnostic(code(leaf::config::read_failed))]
    ReadFailed { path: String, reason: String },
}

/// Creates a config not found error
pub fn not_found(path: impl Into<String>) -> ConfigError {
    ConfigError::NotFound { path: path.into() }
}

/// Creates a config parse failed error
pub fn parse_failed(path: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::ParseFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an invalid config error
pub fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

/// Creates a config read failed error
pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::ReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}
