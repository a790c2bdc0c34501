//! Common error types for the volume driver.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`OfsError`].
pub type OfsResult<T> = Result<T, OfsError>;

/// Errors returned by volume driver operations.
///
/// Every variant is terminal for the request that produced it; nothing is
/// retried internally.
#[derive(Error, Diagnostic, Debug)]
pub enum OfsError {
    /// A volume with this name is already registered.
    #[error("volume '{name}' already exists")]
    #[diagnostic(code(ofs::volume::already_exists))]
    AlreadyExists {
        /// The duplicate volume name.
        name: String,
    },

    /// No volume with this name is registered.
    #[error("volume '{name}' not found")]
    #[diagnostic(code(ofs::volume::not_found))]
    NotFound {
        /// The volume name that was not found.
        name: String,
    },

    /// The volume still has attached callers.
    #[error("volume '{name}' currently in use ({count} unique)")]
    #[diagnostic(
        code(ofs::volume::in_use),
        help("Stop the containers using this volume before removing it")
    )]
    InUse {
        /// The volume name.
        name: String,
        /// Number of distinct callers still attached.
        count: usize,
    },

    /// The mount command failed.
    #[error(
        "unexpected error mounting '{name}' check log (/var/log/syslog or /var/log/messages): {reason}"
    )]
    #[diagnostic(
        code(ofs::volume::mount_failed),
        help("The mount helper logs its failures to syslog")
    )]
    MountFailed {
        /// The volume name.
        name: String,
        /// Underlying error text.
        reason: String,
    },

    /// The unmount command failed.
    #[error("unmounting '{name}' failed: {reason}")]
    #[diagnostic(code(ofs::volume::unmount_failed))]
    UnmountFailed {
        /// The volume name.
        name: String,
        /// Underlying error text.
        reason: String,
    },

    /// Creating a mountpoint directory failed.
    #[error("mountpoint directory {}: {source}", path.display())]
    #[diagnostic(code(ofs::volume::directory))]
    Directory {
        /// The mountpoint path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Invalid volume name.
    #[error("invalid volume name: '{name}'")]
    #[diagnostic(
        code(ofs::volume::invalid_name),
        help("Volume names must be 1-255 characters and may not contain '/' or be '.' or '..'")
    )]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// Invalid caller ID.
    #[error("invalid caller ID: '{id}'")]
    #[diagnostic(code(ofs::volume::invalid_caller))]
    InvalidCallerId {
        /// The rejected caller ID.
        id: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(ofs::serialization))]
    Serialization(String),
}

impl OfsError {
    /// Build a [`OfsError::NotFound`] for `name`.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}

impl From<serde_json::Error> for OfsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
