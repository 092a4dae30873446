//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use auth_href::options::{InvocationOptions, TextMode};
use clap::Parser;

/// Turn links into authenticated, token-protected download triggers.
///
/// Each URL is bound to its own trigger element and clicked once. Defaults
/// come from the config file; flags override them for every element.
#[derive(Parser, Debug)]
#[command(name = "auth-href")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to download (read from stdin when omitted)
    pub urls: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Token sent with every request
    #[arg(short, long)]
    pub token: Option<String>,

    /// Header carrying the token
    #[arg(long)]
    pub header_name: Option<String>,

    /// Prefix placed before the token (may be empty)
    #[arg(long)]
    pub header_prefix: Option<String>,

    /// Extra request header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Placeholder mode while downloading
    #[arg(long, value_parser = parse_text_mode)]
    pub text_mode: Option<TextMode>,

    /// Placeholder text while downloading
    #[arg(long)]
    pub downloading_text: Option<String>,

    /// Placeholder markup while downloading (html mode)
    #[arg(long)]
    pub downloading_html: Option<String>,

    /// Disable the trailing dots animation
    #[arg(long)]
    pub no_dots: bool,

    /// Keep the element content while downloading
    #[arg(long)]
    pub no_override: bool,

    /// Open downloads in this navigation target instead of saving them
    #[arg(long)]
    pub target: Option<String>,

    /// Delay before the object URL is released in milliseconds (-1 releases immediately)
    #[arg(long, allow_negative_numbers = true, value_parser = clap::value_parser!(i64).range(-1..))]
    pub remove_delay_ms: Option<i64>,

    /// Directory downloads are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Config file path (defaults to $XDG_CONFIG_HOME/auth-href/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Binding value shared by every element of this invocation.
    #[must_use]
    pub fn invocation_options(&self) -> InvocationOptions {
        InvocationOptions {
            token: self.token.clone(),
            header_name: self.header_name.clone(),
            header_value_prefix: self.header_prefix.clone(),
            additional_headers: self.headers.iter().cloned().collect(),
            text_mode: self.text_mode.map(|mode| mode.as_str().to_string()),
            downloading_text: self.downloading_text.clone(),
            downloading_html: self.downloading_html.clone(),
            dots_animation: self.no_dots.then_some(false),
            override_inner_html: self.no_override.then_some(false),
            remove_delay_ms: self.remove_delay_ms,
            ..InvocationOptions::default()
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name must not be empty".to_string());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_text_mode(raw: &str) -> Result<TextMode, String> {
    raw.parse().map_err(|e: auth_href::ConfigurationError| e.to_string())
}
