//! Synthetic download surface.
//!
//! A completed response becomes a [`Blob`] registered under a transient
//! [`ObjectUrl`]. The lifecycle then either saves it under a filename or
//! opens it in a navigation target, and finally revokes the URL.

mod directory;
mod error;

pub use directory::{DirectorySink, MAX_TRACKED_WRITES};
pub use error::SaveError;

use std::fmt;

use bytes::Bytes;

/// In-memory binary object built from a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
    content_type: Option<String>,
}

impl Blob {
    /// Wraps a body and its media type.
    #[must_use]
    pub fn new(data: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            data: data.into(),
            content_type,
        }
    }

    /// The raw bytes.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Media type, when the response declared one.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the blob is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Transient reference to a registered [`Blob`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    /// Wraps a URL string.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where finished downloads go.
///
/// Calls are synchronous: they model handing a blob to the host, not
/// performing network work.
pub trait SaveTarget: Send + Sync {
    /// Registers a blob and returns its transient URL.
    fn create_object_url(&self, blob: Blob) -> ObjectUrl;

    /// Triggers a save-as of the blob under `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] when the URL is unknown or the save fails.
    fn save_as(&self, url: &ObjectUrl, filename: &str) -> Result<(), SaveError>;

    /// Opens the blob in a navigation target instead of saving it.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] when the URL is unknown or opening fails.
    fn open_in(&self, url: &ObjectUrl, target: &str) -> Result<(), SaveError>;

    /// Releases the blob behind `url`. Unknown URLs are ignored.
    fn revoke_object_url(&self, url: &ObjectUrl);
}
