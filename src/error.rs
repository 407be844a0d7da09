//! Error types for the repetition feedback library.

use thiserror::Error;

/// Main error type for the library.
///
/// Errors only occur at the configuration edges (loading profiles or
/// traces). The per-frame engine path is total: missing detections and
/// out-of-range angles are ordinary domain values, not errors.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Exercise profile failed validation
    #[error("Profile error: {0}")]
    Profile(String),

    /// Landmark trace is malformed
    #[error("Trace error: {0}")]
    Trace(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
