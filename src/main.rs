//! CLI entry point for the auth-href tool.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use auth_href::{
    BindingRegistry, ClickEvent, ClickOutcome, DirectorySink, DownloadController, HttpTransport,
    MemoryElement, TriggerElement,
};
use clap::Parser;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

mod app_config;
mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let loaded = app_config::load_config(args.config.as_deref())?;
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "Config loaded");
    }

    // Read input: from positional args or stdin
    let urls: Vec<String> = if !args.urls.is_empty() {
        args.urls.clone()
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    } else {
        info!("No input provided. Pipe URLs via stdin or pass as arguments.");
        info!("Example: echo 'https://example.com/report.pdf' | auth-href -t TOKEN");
        return Ok(());
    };

    if urls.is_empty() {
        info!("No URLs found in input");
        return Ok(());
    }

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| loaded.config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!("Failed to create output directory '{}'", output_dir.display())
    })?;

    let transport = HttpTransport::with_timeouts(
        loaded.config.connect_timeout_secs(),
        loaded.config.read_timeout_secs(),
    )?;
    let controller = DownloadController::new(
        Arc::new(transport),
        Arc::new(DirectorySink::new(&output_dir)),
        loaded.config.plugin_options(),
    );
    let registry = BindingRegistry::new(controller);

    let invocation = args.invocation_options();
    let elements: Vec<MemoryElement> = urls
        .iter()
        .enumerate()
        .map(|(index, url)| {
            let element = MemoryElement::new(format!("link-{}", index + 1), url, url);
            match &args.target {
                Some(target) => element.with_target(target),
                None => element,
            }
        })
        .collect();
    for element in &elements {
        registry.bind(element.id(), Some(invocation.clone()));
    }

    info!(urls = elements.len(), output_dir = %output_dir.display(), "Downloading");

    let results = join_all(elements.iter().map(|element| {
        let registry = &registry;
        async move {
            let mut event = ClickEvent::new();
            (element, registry.dispatch_click(&mut event, element).await)
        }
    }))
    .await;

    let mut completed = 0usize;
    let mut failed = 0usize;
    for (element, result) in results {
        let url = element.href().unwrap_or_default();
        match result {
            Some(Ok(ClickOutcome::Saved { filename })) => {
                completed += 1;
                debug!(url = %url, filename = %filename, "Saved");
            }
            Some(Ok(ClickOutcome::Opened { target, filename })) => {
                completed += 1;
                debug!(url = %url, target = %target, filename = %filename, "Opened");
            }
            Some(Ok(ClickOutcome::AlreadyDownloading | ClickOutcome::Failed)) | None => {
                failed += 1;
            }
            Some(Err(e)) => {
                failed += 1;
                warn!(url = %url, error = %e, "Download failed");
            }
        }
    }

    info!(completed, failed, total = elements.len(), "Download complete");

    if failed > 0 {
        bail!("{failed} of {} downloads failed", elements.len());
    }
    Ok(())
}
