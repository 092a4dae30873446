//! Download lifecycle for one trigger element.
//!
//! A click moves an element through
//! `Idle → Guarding → Fetching → (Succeeding | Failing) → Restoring → Idle`:
//!
//! - the in-flight marker rejects overlapping clicks
//! - the placeholder replaces the element content while the request runs,
//!   with optional trailing dots in text mode
//! - the response becomes a blob handed to the [`SaveTarget`](crate::save::SaveTarget)
//! - the original content, locator and marker are always restored
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use auth_href::element::{ClickEvent, MemoryElement};
//! use auth_href::lifecycle::DownloadController;
//! use auth_href::options::{PluginOptions, TokenSource};
//! use auth_href::save::DirectorySink;
//! use auth_href::transport::HttpTransport;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let plugin = PluginOptions {
//!     token: Some(TokenSource::from("abc")),
//!     ..PluginOptions::default()
//! };
//! let controller = DownloadController::new(
//!     Arc::new(HttpTransport::new()?),
//!     Arc::new(DirectorySink::new("downloads")),
//!     plugin,
//! );
//!
//! let link = MemoryElement::new("report", "https://example.com/report.pdf", "Report");
//! let outcome = controller.handle_click(&mut ClickEvent::new(), &link, None).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod controller;
mod error;
mod restore;
mod state;
mod ticker;

pub use controller::{ClickOutcome, DownloadController};
pub use error::{ClickError, DownloadError};
pub use state::LifecycleState;
pub use ticker::{DOTS_PERIOD, DotsCycle, MAX_DOTS};
