//! `mailwatch` - logs every new message arriving in one IMAP mailbox.
//!
//! ```text
//! mailwatch [CONFIG.json]
//! ```
//!
//! Without a path the configuration comes from `MAIL_HOST`, `MAIL_PORT`,
//! `MAIL_USERNAME`, `MAIL_PASSWORD`, `MAIL_PROTOCOL` and `MAIL_FOLDER`.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::Path;

use anyhow::{Context, Result};
use mailwatch_core::{ListenerSupervisor, WatchConfig, log_sink};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailwatch=info,mailwatch_core=info,mailwatch_imap=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => load_file(Path::new(&path))?,
        None => WatchConfig::from_env().context("reading MAIL_* environment")?,
    };

    info!(
        host = %config.connection.host,
        port = config.connection.port,
        protocol = %config.connection.protocol,
        mailbox = %config.listener.mailbox,
        "starting mailwatch"
    );

    let supervisor = ListenerSupervisor::new(config.connection, config.listener, log_sink());
    supervisor.start().context("invalid configuration")?;

    shutdown_signal().await?;
    info!("shutdown requested");
    supervisor.stop().await;
    Ok(())
}

fn load_file(path: &Path) -> Result<WatchConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    WatchConfig::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

/// Completes on Ctrl-C, or on SIGTERM where there is one.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("waiting for Ctrl-C")?,
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;

    Ok(())
}
