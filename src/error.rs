//! Error handling module for postgis-bootstrap
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the provisioning pipeline should use these types for consistency.
//!
//! The taxonomy mirrors how failures are handled:
//! - `Config` is fatal and raised before any mutation happens.
//! - `ExternalTool` is fatal and aborts the remaining pipeline.
//! - `Discovery` and `Filesystem` are non-fatal: the affected step is logged
//!   and skipped, the pipeline continues.

use thiserror::Error;

/// Main error type for postgis-bootstrap
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// IO errors (file operations, process spawning, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (missing input, not running as root)
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external tool (apt-get, psql, ufw, systemctl) returned failure
    #[error("External tool failure: {0}")]
    ExternalTool(String),

    /// Server path discovery failed (non-fatal, degrades remote access setup)
    #[error("Discovery failure: {0}")]
    Discovery(String),

    /// An expected file is absent or unreadable
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

// Convenient error constructors
impl ProvisionError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an external tool error
    pub fn external_tool(msg: impl Into<String>) -> Self {
        Self::ExternalTool(msg.into())
    }

    /// Create a discovery error
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Create a filesystem error
    pub fn filesystem(msg: impl Into<String>) -> Self {
        Self::Filesystem(msg.into())
    }
}
