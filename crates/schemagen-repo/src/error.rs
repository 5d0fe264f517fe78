//! Error types for chart repository operations

use std::time::Duration;
use thiserror::Error;

/// Chart repository errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Configuration Errors ============
    #[error("Invalid repository URL: {url} - {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    #[error("No getter registered for scheme '{scheme}' ({url})")]
    UnsupportedScheme { scheme: String, url: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    // ============ Authentication Errors ============
    #[error("Authentication required for {url}")]
    AuthRequired { url: String },

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    // ============ Index Errors ============
    #[error("Index parse error: {message}")]
    IndexParseError { message: String },

    #[error("Chart not found: {name} in repository {repo}")]
    ChartNotFound { name: String, repo: String },

    #[error("Version not found: {name}@{version} in repository {repo}")]
    VersionNotFound {
        name: String,
        version: String,
        repo: String,
    },

    #[error("Chart {name} has no download URL")]
    MissingChartUrl { name: String },

    #[error("Invalid chart URL: {url} - {reason}")]
    InvalidChartUrl { url: String, reason: String },

    // ============ Archive Errors ============
    #[error("Integrity check failed for {name}: expected {expected}, got {actual}")]
    IntegrityCheckFailed {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid chart archive: {message}")]
    InvalidArchive { message: String },

    #[error("cannot find values.yaml nor values.yml in chart {chart}")]
    ValuesNotFound { chart: String },

    // ============ Other ============
    #[error("Operation cancelled")]
    Cancelled,
}

impl RepoError {
    /// The chart was fetched but carries no values file
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::ValuesNotFound { .. })
    }

    /// Chart or version lookup in the index failed
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            RepoError::ChartNotFound { .. }
                | RepoError::VersionNotFound { .. }
                | RepoError::MissingChartUrl { .. }
                | RepoError::InvalidChartUrl { .. }
        )
    }
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            RepoError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            RepoError::HttpError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            RepoError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}
