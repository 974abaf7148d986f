//! Error types for sonarsnap
use sonarcloud_api::SonarError;

/// Custom error type for sonarsnap operations
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    /// SonarCloud API error
    #[error("SonarCloud API error: {0}")]
    SonarApi(#[from] SonarError),

    /// No usable token was supplied
    #[error("SONAR_TOKEN must be set to a non-blank SonarCloud user token")]
    MissingToken,

    /// Project version could not be read from the build descriptor
    #[error("Failed to read project version from {path}: {message}")]
    ProjectVersion { path: String, message: String },

    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for sonarsnap operations
pub type Result<T> = std::result::Result<T, SnapshotError>;
