//! Error types for bc-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes
//! and that tells the orchestrator whether a failure ends the run.

use thiserror::Error;

/// Result type alias for bc-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for bc-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required parameters were not supplied anywhere
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    /// Source listing failed
    #[error("Listing failed: {0}")]
    Listing(String),

    /// Fetching a single source object failed
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Destination bucket does not exist
    #[error("Bucket does not exist: {0}")]
    MissingBucket(String),

    /// Destination rejected the credentials
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Destination failure scoped to one request
    #[error("Request failed: {0}")]
    Transient(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether this error must stop the whole run rather than a single item
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::MissingParameters(_)
                | Error::Listing(_)
                | Error::MissingBucket(_)
                | Error::AccessDenied(_)
        )
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_)
            | Error::MissingParameters(_)
            | Error::InvalidUrl(_)
            | Error::TomlParse(_) => 2, // UsageError
            Error::Listing(_) | Error::Transient(_) | Error::Fetch(_) => 3, // NetworkError
            Error::AccessDenied(_) => 4,                                    // AuthError
            Error::MissingBucket(_) => 5,                                   // NotFound
            _ => 1,                                                         // GeneralError
        }
    }
}
