//! Host binding registry.
//!
//! A host attaches the download behavior to an element with a binding value
//! and may update that value later. The registry keeps at most one listener
//! per element: re-binding an element replaces its stored value (or leaves
//! it alone when nothing changed) instead of stacking a second handler.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::element::{ClickEvent, TriggerElement};
use crate::lifecycle::{ClickError, ClickOutcome, DownloadController};
use crate::options::InvocationOptions;

/// What a bind or update did to the element's listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// First binding; a listener was attached.
    Attached,
    /// The element was bound with a different value; the value was replaced.
    Replaced,
    /// The element was bound with an equal value; nothing changed.
    Unchanged,
}

/// Maps element identities to their current binding value.
#[derive(Debug)]
pub struct BindingRegistry {
    controller: DownloadController,
    bindings: DashMap<String, Option<InvocationOptions>>,
}

impl BindingRegistry {
    /// Creates an empty registry dispatching to `controller`.
    #[must_use]
    pub fn new(controller: DownloadController) -> Self {
        Self {
            controller,
            bindings: DashMap::new(),
        }
    }

    /// The controller clicks are dispatched to.
    #[must_use]
    pub fn controller(&self) -> &DownloadController {
        &self.controller
    }

    /// Binds `element_id` with an already interpreted value.
    ///
    /// `None` means the binding value carried no options (a scalar, array or
    /// null), so every field falls through to the plugin tier.
    pub fn bind(&self, element_id: &str, value: Option<InvocationOptions>) -> BindOutcome {
        let outcome = match self.bindings.entry(element_id.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(value);
                BindOutcome::Attached
            }
            Entry::Occupied(mut entry) => {
                if *entry.get() == value {
                    BindOutcome::Unchanged
                } else {
                    entry.insert(value);
                    BindOutcome::Replaced
                }
            }
        };
        debug!(element = element_id, ?outcome, "binding updated");
        outcome
    }

    /// Binds `element_id` with a raw binding value.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is an object with a mistyped field.
    pub fn bind_value(
        &self,
        element_id: &str,
        value: &serde_json::Value,
    ) -> Result<BindOutcome, serde_json::Error> {
        let options = InvocationOptions::from_binding(value)?;
        Ok(self.bind(element_id, options))
    }

    /// Host update hook; identical to [`BindingRegistry::bind`].
    pub fn update(&self, element_id: &str, value: Option<InvocationOptions>) -> BindOutcome {
        self.bind(element_id, value)
    }

    /// Detaches the listener. Returns `false` if the element was not bound.
    pub fn unbind(&self, element_id: &str) -> bool {
        self.bindings.remove(element_id).is_some()
    }

    /// Number of elements with an attached listener.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.bindings.len()
    }

    /// Whether `element_id` has an attached listener.
    #[must_use]
    pub fn is_bound(&self, element_id: &str) -> bool {
        self.bindings.contains_key(element_id)
    }

    /// Dispatches a click on `element` with its current binding value.
    ///
    /// Returns `None` when the element is not bound; the click is left alone
    /// so the host's default navigation still happens.
    pub async fn dispatch_click<E: TriggerElement + ?Sized>(
        &self,
        event: &mut ClickEvent,
        element: &E,
    ) -> Option<Result<ClickOutcome, ClickError>> {
        // Clone so the shard lock is released before awaiting.
        let value = self.bindings.get(element.id())?.value().clone();
        Some(
            self.controller
                .handle_click(event, element, value.as_ref())
                .await,
        )
    }
}
