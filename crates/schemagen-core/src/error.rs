//! Core error types
//!
//! Every variant carries a short context naming the stage that failed and
//! keeps the underlying cause reachable through `source()`.

use thiserror::Error;

/// Boxed underlying cause of a stage failure
pub type Cause = Box<dyn std::error::Error + Send + Sync>;

/// Kind of a [`SchemaError`], for callers that branch on the failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input bytes are not valid YAML/JSON, or not a mapping
    Decode,
    /// The constraint engine rejected the generated definition
    Compile,
    /// The exporter could not produce a schema
    Generation,
    /// The schema is not valid OpenAPI v3, or the root schema is missing
    Validation,
    /// Reading input failed
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode => write!(f, "decode"),
            Self::Compile => write!(f, "compile"),
            Self::Generation => write!(f, "generation"),
            Self::Validation => write!(f, "validation"),
            Self::Io => write!(f, "io"),
        }
    }
}

/// A single OpenAPI validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending node, `(root)` for the document itself
    pub path: String,
    /// Human readable message
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("{context}")]
    Decode {
        context: String,
        #[source]
        source: Cause,
    },

    #[error("{context}")]
    Compile {
        context: String,
        #[source]
        source: Cause,
    },

    #[error("{context}")]
    Generation {
        context: String,
        #[source]
        source: Cause,
    },

    #[error("{context}: {}", summarize(.violations))]
    Validation {
        context: String,
        violations: Vec<Violation>,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    pub fn decode(context: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self::Decode {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn compile(context: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self::Compile {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn generation(context: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self::Generation {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn validation(context: impl Into<String>, violations: Vec<Violation>) -> Self {
        Self::Validation {
            context: context.into(),
            violations,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get the failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Compile { .. } => ErrorKind::Compile,
            Self::Generation { .. } => ErrorKind::Generation,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Validation failures, empty for every other kind
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Validation { violations, .. } => violations,
            _ => &[],
        }
    }
}

fn summarize(violations: &[Violation]) -> String {
    match violations {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
