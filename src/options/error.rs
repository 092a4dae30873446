//! Errors raised while resolving effective options.

use thiserror::Error;

/// Invalid or incomplete download trigger configuration.
///
/// Always raised before the trigger element is touched, so a failed
/// resolution leaves the element exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// No tier supplied a non-empty token.
    #[error(
        "no token configured: provide one in the binding value or in the plugin options"
    )]
    MissingToken,

    /// The text mode is not one of `text` or `html`.
    #[error("invalid text mode {value:?}: expected \"text\" or \"html\"")]
    InvalidTextMode {
        /// The rejected value.
        value: String,
    },

    /// A configured header name or value cannot be sent over HTTP.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
        /// Why the header was rejected.
        reason: String,
    },
}

impl ConfigurationError {
    /// Creates an invalid text mode error.
    pub fn invalid_text_mode(value: impl Into<String>) -> Self {
        Self::InvalidTextMode {
            value: value.into(),
        }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_display_mentions_both_sources() {
        let msg = ConfigurationError::MissingToken.to_string();
        assert!(msg.contains("binding value"), "unexpected message: {msg}");
        assert!(msg.contains("plugin options"), "unexpected message: {msg}");
    }

    #[test]
    fn test_invalid_text_mode_display_quotes_value() {
        let msg = ConfigurationError::invalid_text_mode("markdown").to_string();
        assert!(msg.contains("\"markdown\""), "unexpected message: {msg}");
    }

    #[test]
    fn test_invalid_header_display_contains_name_and_reason() {
        let msg = ConfigurationError::invalid_header("Bad Header", "invalid HTTP header name")
            .to_string();
        assert!(msg.contains("Bad Header"));
        assert!(msg.contains("invalid HTTP header name"));
    }
}
