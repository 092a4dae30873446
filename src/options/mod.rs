//! Option resolution for download triggers.
//!
//! Every click recomputes one [`EffectiveOptions`] record from three tiers,
//! field by field:
//!
//! 1. the per-element binding value ([`InvocationOptions`]), when it is a
//!    structured object and the field holds a non-empty value
//! 2. the plugin-wide configuration ([`PluginOptions`])
//! 3. the built-in defaults (`DEFAULT_*` constants)
//!
//! # Example
//!
//! ```
//! use auth_href::options::{InvocationOptions, PluginOptions, TokenSource, resolve};
//!
//! let plugin = PluginOptions {
//!     token: Some(TokenSource::from("plugin-token")),
//!     ..PluginOptions::default()
//! };
//! let binding = InvocationOptions {
//!     downloading_text: Some("Fetching".to_string()),
//!     ..InvocationOptions::default()
//! };
//!
//! let options = resolve(Some(&binding), &plugin).unwrap();
//! assert_eq!(options.token(), "plugin-token");
//! assert_eq!(options.downloading_text(), "Fetching");
//! assert_eq!(options.header_name(), "Authorization");
//! ```

mod error;

pub use error::ConfigurationError;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

use crate::lifecycle::DownloadError;

/// Default name of the header carrying the token.
pub const DEFAULT_HEADER_NAME: &str = "Authorization";

/// Default prefix placed in front of the token.
pub const DEFAULT_HEADER_VALUE_PREFIX: &str = "Bearer ";

/// Default placeholder shown while a download is in flight (text mode).
pub const DEFAULT_DOWNLOADING_TEXT: &str = "Downloading";

/// Default placeholder markup (html mode).
pub const DEFAULT_DOWNLOADING_HTML: &str = "";

/// Default object URL release delay; negative means release immediately.
pub const DEFAULT_REMOVE_DELAY_MS: i64 = -1;

/// Receives download failures instead of the caller.
pub type ErrorHandler = Arc<dyn Fn(&DownloadError) + Send + Sync>;

/// Zero-argument lifecycle hook.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Produces the current token on demand.
pub type TokenProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// How the placeholder is written into the trigger element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Placeholder is plain text and may be animated.
    #[default]
    Text,
    /// Placeholder is markup, written verbatim.
    Html,
}

impl TextMode {
    /// Returns the configuration label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for TextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            other => Err(ConfigurationError::invalid_text_mode(other)),
        }
    }
}

/// Plugin-level token: a fixed string or a provider for rotating tokens.
///
/// Providers are called at resolution time, once per click, and only when
/// the binding value does not carry its own token.
#[derive(Clone)]
pub enum TokenSource {
    /// A fixed token.
    Static(String),
    /// A callback returning the current token.
    Provider(TokenProvider),
}

impl TokenSource {
    /// Wraps a token provider callback.
    pub fn provider(provider: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self::Provider(Arc::new(provider))
    }

    /// Returns the current token value.
    #[must_use]
    pub fn current(&self) -> String {
        match self {
            Self::Static(token) => token.clone(),
            Self::Provider(provider) => provider(),
        }
    }
}

impl From<&str> for TokenSource {
    fn from(token: &str) -> Self {
        Self::Static(token.to_string())
    }
}

impl From<String> for TokenSource {
    fn from(token: String) -> Self {
        Self::Static(token)
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Static(<redacted>)"),
            Self::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// Per-element binding value.
///
/// Deserializes from the camelCase object a host passes as the binding
/// value (`{"token": "...", "downloadingText": "..."}`). Callbacks can only
/// be set from Rust.
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvocationOptions {
    /// Token for this element.
    pub token: Option<String>,
    /// Header carrying the token.
    pub header_name: Option<String>,
    /// Prefix placed before the token.
    pub header_value_prefix: Option<String>,
    /// Extra request headers; may override the token header.
    pub additional_headers: BTreeMap<String, String>,
    /// `text` or `html`, validated at resolution time.
    pub text_mode: Option<String>,
    /// Placeholder text.
    pub downloading_text: Option<String>,
    /// Placeholder markup.
    pub downloading_html: Option<String>,
    /// Animate trailing dots in text mode.
    pub dots_animation: Option<bool>,
    /// Replace the element content while downloading.
    pub override_inner_html: Option<bool>,
    /// Object URL release delay in milliseconds.
    pub remove_delay_ms: Option<i64>,
    /// Failure hook.
    #[serde(skip)]
    pub error_handler: Option<ErrorHandler>,
    /// Hook run after restoration.
    #[serde(skip)]
    pub on_finish: Option<Callback>,
    /// Hook run right before the request is issued.
    #[serde(skip)]
    pub before_download: Option<Callback>,
}

impl InvocationOptions {
    /// Interprets a raw binding value.
    ///
    /// Only JSON objects carry options; strings, numbers, arrays and `null`
    /// yield `None` so resolution falls through to the plugin tier.
    ///
    /// # Errors
    ///
    /// Returns an error when an object field has the wrong JSON type.
    pub fn from_binding(value: &serde_json::Value) -> Result<Option<Self>, serde_json::Error> {
        if !value.is_object() {
            return Ok(None);
        }
        serde_json::from_value(value.clone()).map(Some)
    }
}

impl PartialEq for InvocationOptions {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
            && self.header_name == other.header_name
            && self.header_value_prefix == other.header_value_prefix
            && self.additional_headers == other.additional_headers
            && self.text_mode == other.text_mode
            && self.downloading_text == other.downloading_text
            && self.downloading_html == other.downloading_html
            && self.dots_animation == other.dots_animation
            && self.override_inner_html == other.override_inner_html
            && self.remove_delay_ms == other.remove_delay_ms
            && same_callback(&self.error_handler, &other.error_handler)
            && same_callback(&self.on_finish, &other.on_finish)
            && same_callback(&self.before_download, &other.before_download)
    }
}

impl fmt::Debug for InvocationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationOptions")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("header_name", &self.header_name)
            .field("header_value_prefix", &self.header_value_prefix)
            .field("additional_headers", &self.additional_headers.keys())
            .field("text_mode", &self.text_mode)
            .field("downloading_text", &self.downloading_text)
            .field("downloading_html", &self.downloading_html)
            .field("dots_animation", &self.dots_animation)
            .field("override_inner_html", &self.override_inner_html)
            .field("remove_delay_ms", &self.remove_delay_ms)
            .field("error_handler", &self.error_handler.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .field("before_download", &self.before_download.is_some())
            .finish()
    }
}

/// Plugin-wide defaults, read-only once the controller is built.
#[derive(Clone, Default)]
pub struct PluginOptions {
    /// Fallback token or token provider.
    pub token: Option<TokenSource>,
    /// Header carrying the token.
    pub header_name: Option<String>,
    /// Prefix placed before the token.
    pub header_value_prefix: Option<String>,
    /// Extra request headers.
    pub additional_headers: BTreeMap<String, String>,
    /// `text` or `html`.
    pub text_mode: Option<String>,
    /// Placeholder text.
    pub downloading_text: Option<String>,
    /// Placeholder markup.
    pub downloading_html: Option<String>,
    /// Animate trailing dots in text mode.
    pub dots_animation: Option<bool>,
    /// Replace the element content while downloading.
    pub override_inner_html: Option<bool>,
    /// Object URL release delay in milliseconds.
    pub remove_delay_ms: Option<i64>,
    /// Failure hook.
    pub error_handler: Option<ErrorHandler>,
    /// Hook run after restoration.
    pub on_finish: Option<Callback>,
    /// Hook run right before the request is issued.
    pub before_download: Option<Callback>,
}

impl fmt::Debug for PluginOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginOptions")
            .field("token", &self.token)
            .field("header_name", &self.header_name)
            .field("header_value_prefix", &self.header_value_prefix)
            .field("additional_headers", &self.additional_headers.keys())
            .field("text_mode", &self.text_mode)
            .field("downloading_text", &self.downloading_text)
            .field("downloading_html", &self.downloading_html)
            .field("dots_animation", &self.dots_animation)
            .field("override_inner_html", &self.override_inner_html)
            .field("remove_delay_ms", &self.remove_delay_ms)
            .field("error_handler", &self.error_handler.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .field("before_download", &self.before_download.is_some())
            .finish()
    }
}

/// Fully resolved configuration for one lifecycle.
///
/// Built only by [`resolve`]; every field is populated and the request
/// headers are validated up front.
#[derive(Clone)]
pub struct EffectiveOptions {
    token: String,
    header_name: String,
    header_value_prefix: String,
    additional_headers: BTreeMap<String, String>,
    text_mode: TextMode,
    downloading_text: String,
    downloading_html: String,
    dots_animation: bool,
    override_inner_html: bool,
    remove_delay_ms: i64,
    error_handler: Option<ErrorHandler>,
    on_finish: Option<Callback>,
    before_download: Option<Callback>,
    request_headers: HeaderMap,
}

impl EffectiveOptions {
    /// The resolved token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Header carrying the token.
    #[must_use]
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// Prefix placed before the token.
    #[must_use]
    pub fn header_value_prefix(&self) -> &str {
        &self.header_value_prefix
    }

    /// Extra request headers as configured.
    #[must_use]
    pub fn additional_headers(&self) -> &BTreeMap<String, String> {
        &self.additional_headers
    }

    /// Placeholder rendering mode.
    #[must_use]
    pub fn text_mode(&self) -> TextMode {
        self.text_mode
    }

    /// Placeholder text.
    #[must_use]
    pub fn downloading_text(&self) -> &str {
        &self.downloading_text
    }

    /// Placeholder markup.
    #[must_use]
    pub fn downloading_html(&self) -> &str {
        &self.downloading_html
    }

    /// Whether dots animation was requested.
    #[must_use]
    pub fn dots_animation(&self) -> bool {
        self.dots_animation
    }

    /// Whether the element content is swapped for the placeholder.
    #[must_use]
    pub fn override_inner_html(&self) -> bool {
        self.override_inner_html
    }

    /// Object URL release delay; negative means immediately.
    #[must_use]
    pub fn remove_delay_ms(&self) -> i64 {
        self.remove_delay_ms
    }

    /// Failure hook, if any.
    #[must_use]
    pub fn error_handler(&self) -> Option<&ErrorHandler> {
        self.error_handler.as_ref()
    }

    /// Post-restoration hook, if any.
    #[must_use]
    pub fn on_finish(&self) -> Option<&Callback> {
        self.on_finish.as_ref()
    }

    /// Pre-request hook, if any.
    #[must_use]
    pub fn before_download(&self) -> Option<&Callback> {
        self.before_download.as_ref()
    }

    /// Placeholder for the current text mode.
    #[must_use]
    pub fn placeholder(&self) -> &str {
        match self.text_mode {
            TextMode::Text => &self.downloading_text,
            TextMode::Html => &self.downloading_html,
        }
    }

    /// The dots ticker only runs for text placeholders that replace content.
    #[must_use]
    pub fn animates_dots(&self) -> bool {
        self.text_mode == TextMode::Text && self.dots_animation && self.override_inner_html
    }

    /// Headers sent with the download request.
    ///
    /// The token header (`header_name: header_value_prefix + token`) is
    /// inserted first, then `additional_headers` on top of it. Header names
    /// are case-insensitive, so an additional `authorization` entry replaces
    /// the computed token header.
    #[must_use]
    pub fn request_headers(&self) -> &HeaderMap {
        &self.request_headers
    }
}

impl fmt::Debug for EffectiveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveOptions")
            .field("token", &"<redacted>")
            .field("header_name", &self.header_name)
            .field("header_value_prefix", &self.header_value_prefix)
            .field("additional_headers", &self.additional_headers.keys())
            .field("text_mode", &self.text_mode)
            .field("downloading_text", &self.downloading_text)
            .field("downloading_html", &self.downloading_html)
            .field("dots_animation", &self.dots_animation)
            .field("override_inner_html", &self.override_inner_html)
            .field("remove_delay_ms", &self.remove_delay_ms)
            .finish_non_exhaustive()
    }
}

/// Resolves the effective options for one click.
///
/// `invocation` is `None` when the binding value is not a structured object.
/// A plugin token provider is only called when the invocation has no token.
///
/// Empty strings fall through to the next tier for every field except
/// `header_value_prefix`: an explicitly empty prefix counts as provided, so
/// `Some("")` in the invocation overrides the plugin's prefix and the token
/// is sent bare.
///
/// # Errors
///
/// - [`ConfigurationError::MissingToken`] when no tier yields a non-empty token
/// - [`ConfigurationError::InvalidTextMode`] when the text mode is not `text`/`html`
/// - [`ConfigurationError::InvalidHeader`] when a header cannot be encoded
pub fn resolve(
    invocation: Option<&InvocationOptions>,
    plugin: &PluginOptions,
) -> Result<EffectiveOptions, ConfigurationError> {
    let token = invocation
        .and_then(|i| non_empty(i.token.as_deref()))
        .map(str::to_string)
        .or_else(|| {
            plugin
                .token
                .as_ref()
                .map(TokenSource::current)
                .filter(|token| !token.is_empty())
        })
        .ok_or(ConfigurationError::MissingToken)?;

    let text_mode: TextMode = pick_str(
        invocation.and_then(|i| i.text_mode.as_deref()),
        plugin.text_mode.as_deref(),
        TextMode::default().as_str(),
    )
    .parse()?;

    let header_name = pick_str(
        invocation.and_then(|i| i.header_name.as_deref()),
        plugin.header_name.as_deref(),
        DEFAULT_HEADER_NAME,
    );
    // An explicitly empty prefix is meaningful (raw API key headers), so
    // presence rather than non-emptiness decides the tier here.
    let header_value_prefix = invocation
        .and_then(|i| i.header_value_prefix.clone())
        .or_else(|| plugin.header_value_prefix.clone())
        .unwrap_or_else(|| DEFAULT_HEADER_VALUE_PREFIX.to_string());
    let additional_headers = invocation
        .map(|i| &i.additional_headers)
        .filter(|headers| !headers.is_empty())
        .or_else(|| Some(&plugin.additional_headers).filter(|headers| !headers.is_empty()))
        .cloned()
        .unwrap_or_default();

    let request_headers =
        build_request_headers(&header_name, &header_value_prefix, &token, &additional_headers)?;

    Ok(EffectiveOptions {
        token,
        header_name,
        header_value_prefix,
        additional_headers,
        text_mode,
        downloading_text: pick_str(
            invocation.and_then(|i| i.downloading_text.as_deref()),
            plugin.downloading_text.as_deref(),
            DEFAULT_DOWNLOADING_TEXT,
        ),
        downloading_html: pick_str(
            invocation.and_then(|i| i.downloading_html.as_deref()),
            plugin.downloading_html.as_deref(),
            DEFAULT_DOWNLOADING_HTML,
        ),
        dots_animation: invocation
            .and_then(|i| i.dots_animation)
            .or(plugin.dots_animation)
            .unwrap_or(true),
        override_inner_html: invocation
            .and_then(|i| i.override_inner_html)
            .or(plugin.override_inner_html)
            .unwrap_or(true),
        remove_delay_ms: invocation
            .and_then(|i| i.remove_delay_ms)
            .or(plugin.remove_delay_ms)
            .unwrap_or(DEFAULT_REMOVE_DELAY_MS),
        error_handler: invocation
            .and_then(|i| i.error_handler.clone())
            .or_else(|| plugin.error_handler.clone()),
        on_finish: invocation
            .and_then(|i| i.on_finish.clone())
            .or_else(|| plugin.on_finish.clone()),
        before_download: invocation
            .and_then(|i| i.before_download.clone())
            .or_else(|| plugin.before_download.clone()),
        request_headers,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn pick_str(invocation: Option<&str>, plugin: Option<&str>, default: &str) -> String {
    non_empty(invocation)
        .or_else(|| non_empty(plugin))
        .unwrap_or(default)
        .to_string()
}

fn build_request_headers(
    header_name: &str,
    prefix: &str,
    token: &str,
    additional: &BTreeMap<String, String>,
) -> Result<HeaderMap, ConfigurationError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        parse_header_name(header_name)?,
        parse_header_value(header_name, &format!("{prefix}{token}"))?,
    );
    for (name, value) in additional {
        headers.insert(parse_header_name(name)?, parse_header_value(name, value)?);
    }
    Ok(headers)
}

fn parse_header_name(name: &str) -> Result<HeaderName, ConfigurationError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ConfigurationError::invalid_header(name, e))
}

fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigurationError> {
    let mut value =
        HeaderValue::from_str(value).map_err(|e| ConfigurationError::invalid_header(name, e))?;
    value.set_sensitive(true);
    Ok(value)
}

fn same_callback<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}
