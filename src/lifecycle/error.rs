//! Error types for the download lifecycle.

use thiserror::Error;

use crate::options::ConfigurationError;
use crate::save::SaveError;
use crate::transport::TransportError;

/// A download that started but did not complete.
///
/// This is what a configured error handler receives.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request failed or returned a non-success response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response could not be handed to the save target.
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Why a click did not produce a download.
#[derive(Debug, Error)]
pub enum ClickError {
    /// Options could not be resolved; the element was not touched.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The element has no resource locator to fetch.
    #[error("element {element} has no resource locator")]
    MissingLocator {
        /// Identity of the element.
        element: String,
    },

    /// The download failed and no error handler was configured.
    ///
    /// The element was restored before this was returned.
    #[error(transparent)]
    Download(#[from] DownloadError),
}

impl ClickError {
    /// Creates a missing locator error.
    pub fn missing_locator(element: impl Into<String>) -> Self {
        Self::MissingLocator {
            element: element.into(),
        }
    }
}
