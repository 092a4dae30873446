//! Error types for the save module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while handing a finished download to the host.
#[derive(Debug, Error)]
pub enum SaveError {
    /// File system error while writing the download.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The object URL was never registered or was already revoked.
    #[error("unknown object URL: {url}")]
    UnknownObjectUrl {
        /// The unresolved URL.
        url: String,
    },
}

impl SaveError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an unknown object URL error.
    pub fn unknown_object_url(url: impl Into<String>) -> Self {
        Self::UnknownObjectUrl { url: url.into() }
    }
}
