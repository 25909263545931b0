use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Handoff encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The path is not a key of the active set. Always a caller bug.
    #[error("No shortcut is tracked for {0}")]
    Lookup(String),

    /// Moving the file was denied. Recoverable once per lineage by elevating.
    #[error("Permission denied moving {path}: {source}")]
    PermissionDenied {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A permission failure after elevation was already attempted.
    #[error("Run as Administrator: {0}")]
    InsufficientPrivileges(String),

    #[error("Corrupt handoff: {0}")]
    CorruptHandoff(String),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Unknown cleanup root '{0}'")]
    UnknownRoot(String),

    #[error("Could not relaunch with elevated privileges: {0}")]
    Elevation(String),
}

impl Error {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::PermissionDenied { .. })
    }
}
