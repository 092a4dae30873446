//! auth-href Library
//!
//! Turns a clickable element into an authenticated download trigger: a
//! click is intercepted, the resource is fetched with a token header, a
//! placeholder is shown while the request runs, and the response is handed
//! to the host as a download before the element is put back the way it was.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`options`] - Three-tier option resolution (binding > plugin > default)
//! - [`lifecycle`] - Per-click download state machine and restoration
//! - [`filename`] - Download filename derivation
//! - [`binding`] - Host binding registry, one listener per element
//! - [`element`] - Display surface seam ([`TriggerElement`])
//! - [`transport`] - HTTP seam ([`Transport`]) with a reqwest implementation
//! - [`save`] - Download sink seam ([`SaveTarget`]) with a directory implementation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod binding;
pub mod element;
pub mod filename;
pub mod lifecycle;
pub mod options;
pub mod save;
#[cfg(test)]
pub mod test_support;
pub mod transport;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use binding::{BindOutcome, BindingRegistry};
pub use element::{ClickEvent, ContentKind, MemoryElement, TriggerElement};
pub use filename::{FALLBACK_FILENAME, parse_content_disposition, suggested_filename};
pub use lifecycle::{ClickError, ClickOutcome, DownloadController, DownloadError, LifecycleState};
pub use options::{
    ConfigurationError, EffectiveOptions, InvocationOptions, PluginOptions, TextMode, TokenSource,
    resolve,
};
pub use save::{Blob, DirectorySink, ObjectUrl, SaveError, SaveTarget};
pub use transport::{FetchedResponse, HttpTransport, ResponseHeaders, Transport, TransportError};
