#![forbid(unsafe_code)]

//! `branch-freezer` — forge webhook bot enforcing branch freezes.
//!
//! Bootstraps configuration and credentials, then serves the webhook
//! listener until Ctrl-C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use branch_freezer::config::GlobalConfig;
use branch_freezer::forge::gitee::GiteeClient;
use branch_freezer::forge::ForgeClient;
use branch_freezer::webhook::dispatcher::Dispatcher;
use branch_freezer::webhook::server::{self, WebhookState};
use branch_freezer::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "branch-freezer", about = "Branch freeze webhook bot", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the webhook listener port.
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("branch-freezer bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    config.load_credentials().await?;

    let config = Arc::new(config);
    info!(
        items = config.config_items.len(),
        freeze_label = %config.labels.freeze,
        mergeable_label = %config.labels.mergeable,
        "configuration loaded"
    );

    // ── Build forge client and dispatcher ───────────────
    let forge: Arc<dyn ForgeClient> = Arc::new(GiteeClient::new(&config.forge)?);
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&config), forge)?);
    let state = Arc::new(WebhookState {
        dispatcher,
        webhook_secret: config.forge.webhook_secret.clone(),
    });

    // ── Serve until shutdown ────────────────────────────
    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    let port = config.http_port;
    let server_handle = tokio::spawn(async move {
        if let Err(err) = server::serve(port, state, server_ct).await {
            error!(%err, "webhook listener failed");
        }
    });

    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    let _ = server_handle.await;
    info!("branch-freezer shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
