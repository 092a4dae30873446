//! Plugin-wide defaults loaded from the config file.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use auth_href::options::{PluginOptions, TextMode, TokenSource};
use auth_href::transport::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use serde::Deserialize;

/// Environment variable read lazily when no token is configured anywhere else.
pub const TOKEN_ENV_VAR: &str = "AUTH_HREF_TOKEN";

/// TOML-backed file configuration for plugin defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Token sent with every download.
    pub token: Option<String>,
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
    /// Object URL release delay in milliseconds (-1 releases immediately).
    pub remove_delay_ms: Option<i64>,
    /// Default output directory for downloads.
    pub output_dir: Option<PathBuf>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(text_mode) = self.text_mode.as_deref()
            && text_mode.parse::<TextMode>().is_err()
        {
            bail!("Invalid config value for `text_mode`: {text_mode:?}. Expected \"text\" or \"html\"");
        }

        if let Some(delay) = self.remove_delay_ms
            && delay < -1
        {
            bail!("Invalid config value for `remove_delay_ms`: {delay}. Expected -1 or greater");
        }

        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }

    /// Connect timeout, falling back to the transport default.
    #[must_use]
    pub fn connect_timeout_secs(&self) -> u64 {
        self.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS)
    }

    /// Read timeout, falling back to the transport default.
    #[must_use]
    pub fn read_timeout_secs(&self) -> u64 {
        self.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS)
    }

    /// Converts the file values into the plugin tier.
    ///
    /// Without a configured token the plugin tier gets a provider that reads
    /// [`TOKEN_ENV_VAR`] at click time.
    #[must_use]
    pub fn plugin_options(&self) -> PluginOptions {
        let token = match self.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => TokenSource::from(token),
            None => TokenSource::provider(|| env::var(TOKEN_ENV_VAR).unwrap_or_default()),
        };

        PluginOptions {
            token: Some(token),
            header_name: self.header_name.clone(),
            header_value_prefix: self.header_value_prefix.clone(),
            additional_headers: self.additional_headers.clone(),
            text_mode: self.text_mode.clone(),
            downloading_text: self.downloading_text.clone(),
            downloading_html: self.downloading_html.clone(),
            dots_animation: self.dots_animation,
            override_inner_html: self.override_inner_html,
            remove_delay_ms: self.remove_delay_ms,
            ..PluginOptions::default()
        }
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Path the config was looked up at, if one could be determined.
    pub path: Option<PathBuf>,
    /// Parsed config, or defaults when no file was found.
    pub config: FileConfig,
    /// Whether the config came from disk.
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/auth-href/config.toml`
/// 2. `$HOME/.config/auth-href/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("auth-href")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("auth-href")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist. The default path is optional; when it is
/// missing, defaults are returned.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config,
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            config: FileConfig::default(),
            loaded_from_file: false,
        }),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use auth_href::options::resolve;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_parse_config_full() {
        let cfg = parse_config_str(
            r#"
            token = "file-token"
            header_name = "X-Api-Key"
            header_value_prefix = ""
            text_mode = "html"
            downloading_html = "<em>wait</em>"
            dots_animation = false
            remove_delay_ms = 2000
            output_dir = "/tmp/downloads"
            connect_timeout_secs = 10

            [additional_headers]
            X-Tenant = "acme"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.token.as_deref(), Some("file-token"));
        assert_eq!(cfg.header_value_prefix.as_deref(), Some(""));
        assert_eq!(cfg.additional_headers["X-Tenant"], "acme");
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/tmp/downloads")));
        assert_eq!(cfg.connect_timeout_secs(), 10);
        assert_eq!(cfg.read_timeout_secs(), READ_TIMEOUT_SECS);
    }

    #[test]
    fn test_parse_config_empty_uses_defaults() {
        let cfg = parse_config_str("").unwrap();
        assert!(cfg.token.is_none());
        assert_eq!(cfg.connect_timeout_secs(), CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_parse_config_rejects_unknown_key() {
        let err = parse_config_str("concurrency = 4").unwrap_err();
        assert!(err.to_string().contains("concurrency"), "got: {err}");
    }

    #[test]
    fn test_parse_config_rejects_bad_text_mode() {
        let err = parse_config_str(r#"text_mode = "markdown""#).unwrap_err();
        assert!(err.to_string().contains("text_mode"), "got: {err}");
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_values() {
        assert!(parse_config_str("read_timeout_secs = 0").is_err());
        assert!(parse_config_str("connect_timeout_secs = 3601").is_err());
        assert!(parse_config_str("remove_delay_ms = -2").is_err());
        assert!(parse_config_str("remove_delay_ms = -1").is_ok());
    }

    #[test]
    fn test_load_config_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "downloading_text = \"Fetching\"\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert!(loaded.loaded_from_file);
        assert_eq!(loaded.config.downloading_text.as_deref(), Some("Fetching"));
    }

    #[test]
    fn test_load_config_explicit_missing_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_config(Some(&temp_dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_plugin_options_carry_file_token() {
        let cfg = parse_config_str(r#"token = "file-token""#).unwrap();
        let options = resolve(None, &cfg.plugin_options()).unwrap();
        assert_eq!(options.token(), "file-token");
    }
}
