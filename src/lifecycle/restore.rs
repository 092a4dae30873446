//! Snapshot and restoration of a trigger element.

use tracing::debug;

use crate::element::{ContentKind, TriggerElement};
use crate::options::{Callback, EffectiveOptions, TextMode};

/// Owns the element's pre-click state for one lifecycle.
///
/// Restoration runs exactly once: either through [`RestoreGuard::restore`] or,
/// if the click future is dropped mid-flight, when the guard is dropped.
pub(crate) struct RestoreGuard<'a, E: TriggerElement + ?Sized> {
    element: &'a E,
    locator: String,
    content: Option<String>,
    on_finish: Option<Callback>,
    restored: bool,
}

impl<'a, E: TriggerElement + ?Sized> RestoreGuard<'a, E> {
    /// Captures the element, writes the placeholder and removes the locator.
    pub(crate) fn engage(element: &'a E, locator: String, options: &EffectiveOptions) -> Self {
        let content = options.override_inner_html().then(|| element.content());
        if content.is_some() {
            let kind = match options.text_mode() {
                TextMode::Text => ContentKind::Text,
                TextMode::Html => ContentKind::Html,
            };
            element.set_content(options.placeholder(), kind);
        }
        element.remove_href();

        Self {
            element,
            locator,
            content,
            on_finish: options.on_finish().cloned(),
            restored: false,
        }
    }

    /// Restores the element now.
    pub(crate) fn restore(mut self) {
        self.restore_in_place();
    }

    fn restore_in_place(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;

        // Content first, marker last: a click landing between the two must
        // still see the element as busy.
        if let Some(content) = self.content.take() {
            self.element.set_content(&content, ContentKind::Html);
        }
        self.element.set_href(&self.locator);
        self.element.finish_download();
        debug!(element = %self.element.id(), "element restored");

        if let Some(on_finish) = &self.on_finish {
            on_finish();
        }
    }
}

impl<E: TriggerElement + ?Sized> Drop for RestoreGuard<'_, E> {
    fn drop(&mut self) {
        self.restore_in_place();
    }
}
