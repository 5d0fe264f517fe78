//! CLI error types with exit code handling
//!
//! Library errors from the generator and the chart loader are folded into a
//! single type that knows its process exit code.

use miette::Diagnostic;
use schemagen_core::{ErrorKind, SchemaError};
use schemagen_repo::RepoError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Values document could not be decoded
    #[error("Decode error: {message}")]
    #[diagnostic(code(schemagen::cli::decode))]
    Decode {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Schema compilation, generation or validation failed
    #[error("Schema error: {message}")]
    #[diagnostic(code(schemagen::cli::schema))]
    Schema {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(schemagen::cli::io))]
    Io { message: String },

    /// The chart has no values file
    #[error("{message}")]
    #[diagnostic(code(schemagen::cli::not_found))]
    NotFound {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Repository unreachable, HTTP failure or chart lookup failure
    #[error("Repository error: {message}")]
    #[diagnostic(code(schemagen::cli::network))]
    Network {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Operation cancelled")]
    #[diagnostic(code(schemagen::cli::cancelled))]
    Cancelled,

    /// Invalid user input
    #[error("{message}")]
    #[diagnostic(code(schemagen::cli::input))]
    Input { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(schemagen::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Decode { .. } => exit_codes::DECODE_ERROR,
            CliError::Schema { .. } => exit_codes::SCHEMA_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::Network { .. } => exit_codes::NETWORK_ERROR,
            CliError::Cancelled => exit_codes::ERROR,
            CliError::Input { .. } => exit_codes::USAGE_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create an IO error for a path
    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }
}

/// `error: cause: cause…`
fn chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl From<SchemaError> for CliError {
    fn from(err: SchemaError) -> Self {
        let message = chain(&err);
        match err.kind() {
            ErrorKind::Decode => CliError::Decode {
                message,
                help: Some("values files must be a YAML mapping at the top level".to_string()),
            },
            ErrorKind::Io => CliError::Io { message },
            ErrorKind::Validation => CliError::Schema {
                help: err
                    .violations()
                    .iter()
                    .skip(1)
                    .map(|v| v.to_string())
                    .reduce(|acc, v| format!("{acc}\n{v}")),
                message,
            },
            ErrorKind::Compile | ErrorKind::Generation => CliError::Schema {
                message,
                help: None,
            },
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        // Repository errors already render their cause inline
        let message = err.to_string();
        match err {
            RepoError::Cancelled => CliError::Cancelled,
            RepoError::ValuesNotFound { .. } => CliError::NotFound {
                message,
                help: Some("the chart archive must contain <chart>/values.yaml or <chart>/values.yml".to_string()),
            },
            RepoError::AuthRequired { .. } | RepoError::AuthFailed { .. } => CliError::Network {
                message,
                help: Some("pass --username and --password for private repositories".to_string()),
            },
            RepoError::Timeout { .. } => CliError::Network {
                message,
                help: Some("raise --timeout or SCHEMAGEN_TIMEOUT".to_string()),
            },
            _ => CliError::Network {
                message,
                help: None,
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
