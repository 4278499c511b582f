//! Error types for configuration and project loading
//!
//! Resolution failures and ambiguity are values of
//! [`crate::ResolutionResult`]; these errors cover malformed inputs only.

use thiserror::Error;

/// Errors from loading resolver inputs
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Configuration could not be parsed
    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be written
    #[error("cannot serialize configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Configuration parsed but holds out-of-range values
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Project JSON could not be parsed
    #[error("invalid project json: {0}")]
    Json(#[from] serde_json::Error),

    /// Project YAML could not be parsed
    #[error("invalid project yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A project record's identifier is not an entity category
    #[error("'{0}' does not name a project entity")]
    NotAnEntity(String),

    /// Two project records share an identifier
    #[error("duplicate entity '{0}'")]
    DuplicateEntity(String),
}

/// Result alias for loading operations
pub type Result<T> = std::result::Result<T, ResolveError>;
