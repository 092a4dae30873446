//! Per-click download lifecycle.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument, warn};

use super::error::{ClickError, DownloadError};
use super::restore::RestoreGuard;
use super::state::LifecycleState;
use super::ticker::{DOTS_PERIOD, DotsCycle};
use crate::element::{ClickEvent, ContentKind, TriggerElement};
use crate::filename::suggested_filename;
use crate::options::{EffectiveOptions, InvocationOptions, PluginOptions, resolve};
use crate::save::{Blob, ObjectUrl, SaveTarget};
use crate::transport::{FetchedResponse, Transport, TransportError};

/// How an accepted click ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The body was saved under `filename`.
    Saved {
        /// Derived filename.
        filename: String,
    },
    /// The body was opened in the element's navigation target.
    Opened {
        /// Navigation target the object URL was opened in.
        target: String,
        /// Derived filename.
        filename: String,
    },
    /// A download was already in flight; nothing happened.
    AlreadyDownloading,
    /// The download failed and the configured error handler was invoked.
    Failed,
}

/// Drives one trigger element from click to restoration.
///
/// The controller holds the plugin tier of the options and the two
/// collaborators every lifecycle needs. It keeps no per-element state; the
/// snapshot for a click lives in that click's future.
pub struct DownloadController {
    transport: Arc<dyn Transport>,
    save: Arc<dyn SaveTarget>,
    plugin: PluginOptions,
}

impl DownloadController {
    /// Creates a controller.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        save: Arc<dyn SaveTarget>,
        plugin: PluginOptions,
    ) -> Self {
        Self {
            transport,
            save,
            plugin,
        }
    }

    /// Plugin-wide options this controller resolves against.
    #[must_use]
    pub fn plugin_options(&self) -> &PluginOptions {
        &self.plugin
    }

    /// Handles one click on `element`.
    ///
    /// `binding` is the element's current binding value, already interpreted
    /// by [`InvocationOptions::from_binding`].
    ///
    /// The element is restored on every path that mutated it, including when
    /// the returned future is dropped before completion.
    ///
    /// # Errors
    ///
    /// - [`ClickError::Configuration`] when options cannot be resolved; the
    ///   element is untouched
    /// - [`ClickError::MissingLocator`] when the element has no locator
    /// - [`ClickError::Download`] when the download fails and no error
    ///   handler is configured
    #[instrument(skip_all, fields(element = %element.id()))]
    pub async fn handle_click<E: TriggerElement + ?Sized>(
        &self,
        event: &mut ClickEvent,
        element: &E,
        binding: Option<&InvocationOptions>,
    ) -> Result<ClickOutcome, ClickError> {
        event.prevent_default();
        let options = resolve(binding, &self.plugin)?;

        transition(LifecycleState::Idle, LifecycleState::Guarding);
        if !element.try_begin_download() {
            debug!("download already in flight, ignoring click");
            transition(LifecycleState::Guarding, LifecycleState::Idle);
            return Ok(ClickOutcome::AlreadyDownloading);
        }
        let Some(locator) = element.href() else {
            element.finish_download();
            transition(LifecycleState::Guarding, LifecycleState::Idle);
            return Err(ClickError::missing_locator(element.id()));
        };

        transition(LifecycleState::Guarding, LifecycleState::Fetching);
        let guard = RestoreGuard::engage(element, locator.clone(), &options);
        if let Some(before_download) = options.before_download() {
            before_download();
        }

        let result = match self.fetch(element, &options, &locator).await {
            Ok(response) => {
                transition(LifecycleState::Fetching, LifecycleState::Succeeding);
                self.deliver(element, &options, &locator, response)
                    .inspect_err(|_| {
                        transition(LifecycleState::Succeeding, LifecycleState::Failing);
                    })
            }
            Err(e) => {
                transition(LifecycleState::Fetching, LifecycleState::Failing);
                Err(DownloadError::from(e))
            }
        };

        let outcome = match result {
            Ok(outcome) => {
                transition(LifecycleState::Succeeding, LifecycleState::Restoring);
                Ok(outcome)
            }
            Err(error) => {
                let handled = match options.error_handler() {
                    Some(handler) => {
                        warn!(error = %error, "download failed");
                        handler(&error);
                        Ok(ClickOutcome::Failed)
                    }
                    None => Err(ClickError::from(error)),
                };
                transition(LifecycleState::Failing, LifecycleState::Restoring);
                handled
            }
        };

        guard.restore();
        transition(LifecycleState::Restoring, LifecycleState::Idle);
        outcome
    }

    /// Issues the request, animating the placeholder while it is in flight.
    async fn fetch<E: TriggerElement + ?Sized>(
        &self,
        element: &E,
        options: &EffectiveOptions,
        locator: &str,
    ) -> Result<FetchedResponse, TransportError> {
        let mut request = self.transport.get(locator, options.request_headers());

        let response = if options.animates_dots() {
            let base = options.downloading_text();
            let mut dots = DotsCycle::default();
            let mut ticker = interval_at(Instant::now() + DOTS_PERIOD, DOTS_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    response = &mut request => break response?,
                    _ = ticker.tick() => {
                        dots.advance();
                        element.set_content(&dots.frame(base), ContentKind::Text);
                    }
                }
            }
        } else {
            request.await?
        };

        if !response.is_success() {
            return Err(TransportError::http_status(locator, response.status));
        }
        Ok(response)
    }

    /// Hands the body to the save target and schedules the object URL release.
    fn deliver<E: TriggerElement + ?Sized>(
        &self,
        element: &E,
        options: &EffectiveOptions,
        locator: &str,
        response: FetchedResponse,
    ) -> Result<ClickOutcome, DownloadError> {
        let filename = suggested_filename(&response.headers, locator);
        let content_type = response.content_type().map(str::to_string);
        let blob = Blob::new(response.body, content_type);
        let bytes = blob.len();
        let url = self.save.create_object_url(blob);

        let result = match element.target().filter(|target| !target.is_empty()) {
            Some(target) => self
                .save
                .open_in(&url, &target)
                .map(|()| ClickOutcome::Opened {
                    target,
                    filename: filename.clone(),
                }),
            None => self
                .save
                .save_as(&url, &filename)
                .map(|()| ClickOutcome::Saved {
                    filename: filename.clone(),
                }),
        };
        self.schedule_release(url, options.remove_delay_ms());

        let outcome = result?;
        info!(filename = %filename, bytes, "download complete");
        Ok(outcome)
    }

    fn schedule_release(&self, url: ObjectUrl, delay_ms: i64) {
        let Ok(delay_ms) = u64::try_from(delay_ms) else {
            self.save.revoke_object_url(&url);
            return;
        };
        let save = Arc::clone(&self.save);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            save.revoke_object_url(&url);
        });
    }
}

impl fmt::Debug for DownloadController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadController")
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

fn transition(from: LifecycleState, to: LifecycleState) {
    debug_assert!(from.can_transition_to(to), "illegal transition {from} -> {to}");
    debug!(from = %from, to = %to, "lifecycle transition");
}
