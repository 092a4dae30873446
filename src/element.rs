//! Display surface seam: the clickable element a download is bound to.
//!
//! The lifecycle controller only talks to elements through
//! [`TriggerElement`]. Hosts wrap their own widgets; [`MemoryElement`] is an
//! in-process implementation used by the CLI and tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// How a content write should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Plain text; markup characters are shown literally.
    Text,
    /// Markup written verbatim.
    Html,
}

/// A click delivered to a trigger element.
#[derive(Debug, Default)]
pub struct ClickEvent {
    default_prevented: bool,
}

impl ClickEvent {
    /// Creates a fresh click event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses the host's default navigation for this click.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether default navigation was suppressed.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Capabilities the lifecycle needs from a trigger element.
///
/// Methods take `&self`: an element is shared between the host and any
/// in-flight lifecycle, so implementations use interior mutability.
pub trait TriggerElement: Send + Sync {
    /// Stable identity of the element.
    fn id(&self) -> &str;

    /// Current resource locator, if the attribute is present.
    fn href(&self) -> Option<String>;

    /// Sets the resource locator attribute.
    fn set_href(&self, href: &str);

    /// Removes the resource locator attribute.
    fn remove_href(&self);

    /// Navigation target hint (e.g. `_blank`), if any.
    fn target(&self) -> Option<String>;

    /// Current display content as markup.
    fn content(&self) -> String;

    /// Replaces the display content.
    fn set_content(&self, content: &str, kind: ContentKind);

    /// Sets the in-flight marker unless it is already set.
    ///
    /// Returns `false` when a download is already in flight. The read and
    /// the write must not be separable by another caller.
    fn try_begin_download(&self) -> bool;

    /// Whether the in-flight marker is set.
    fn is_downloading(&self) -> bool;

    /// Clears the in-flight marker.
    fn finish_download(&self);
}

#[derive(Debug, Default)]
struct ElementState {
    href: Option<String>,
    target: Option<String>,
    content: String,
    downloading: bool,
    content_writes: Vec<String>,
}

/// In-memory trigger element.
///
/// Content writes are recorded so callers can inspect what was displayed
/// over the course of a download.
#[derive(Debug)]
pub struct MemoryElement {
    id: String,
    state: Mutex<ElementState>,
}

impl MemoryElement {
    /// Creates an element with a locator and initial markup.
    #[must_use]
    pub fn new(id: impl Into<String>, href: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(ElementState {
                href: Some(href.into()),
                content: content.into(),
                ..ElementState::default()
            }),
        }
    }

    /// Sets the navigation target hint.
    #[must_use]
    pub fn with_target(self, target: impl Into<String>) -> Self {
        self.lock().target = Some(target.into());
        self
    }

    /// Every content value written since creation, oldest first.
    #[must_use]
    pub fn content_history(&self) -> Vec<String> {
        self.lock().content_writes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TriggerElement for MemoryElement {
    fn id(&self) -> &str {
        &self.id
    }

    fn href(&self) -> Option<String> {
        self.lock().href.clone()
    }

    fn set_href(&self, href: &str) {
        self.lock().href = Some(href.to_string());
    }

    fn remove_href(&self) {
        self.lock().href = None;
    }

    fn target(&self) -> Option<String> {
        self.lock().target.clone()
    }

    fn content(&self) -> String {
        self.lock().content.clone()
    }

    fn set_content(&self, content: &str, kind: ContentKind) {
        let markup = match kind {
            ContentKind::Text => escape_text(content),
            ContentKind::Html => content.to_string(),
        };
        let mut state = self.lock();
        state.content_writes.push(markup.clone());
        state.content = markup;
    }

    fn try_begin_download(&self) -> bool {
        let mut state = self.lock();
        if state.downloading {
            return false;
        }
        state.downloading = true;
        true
    }

    fn is_downloading(&self) -> bool {
        self.lock().downloading
    }

    fn finish_download(&self) {
        self.lock().downloading = false;
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}
