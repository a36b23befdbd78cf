mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use policy_engine::PolicyEngine;
use qw_protocol::Direction;
use qw_proxy::{Handlers, Proxy, ProxyConfig};
use stufftext_firewall::{DownloadGuard, StufftextFilter};

use crate::cli::Cli;

fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Register the packet handlers the policy calls for.
///
/// The download guard only exists when downloads are disabled; the
/// stufftext filter is always active.
fn build_handlers(engine: &Arc<PolicyEngine>, verbose: bool) -> Handlers {
    let mut handlers = Handlers::new();

    if !engine.allows_downloads() {
        handlers.handle_func(Direction::Clc, DownloadGuard::new());
    }
    handlers.handle_func(
        Direction::Svc,
        StufftextFilter::new(Arc::clone(engine)).verbose(verbose),
    );

    handlers
}

/// Resolves on ctrl-c or, on unix, SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("received SIGINT (ctrl-c)"),
                    _ = sigterm.recv() => info!("received SIGTERM"),
                }
                return;
            }
            Err(err) => warn!(%err, "failed to register SIGTERM handler"),
        }
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("received SIGINT (ctrl-c)");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.json_logs);

    info!(version = env!("CARGO_PKG_VERSION"), "QuakeWorld stufftext firewall");

    let policy = policy_engine::loader::load_policy(&cli.config_file)
        .with_context(|| format!("failed to load policy file {}", cli.config_file.display()))?
        .with_downloads_allowed(cli.allow_downloads);
    let engine = Arc::new(PolicyEngine::new(policy));

    info!(
        config_file = %cli.config_file.display(),
        ?engine,
        "policy loaded"
    );
    if engine.allows_downloads() {
        info!("client-initiated downloads: enabled");
    } else {
        info!("client-initiated downloads: disabled");
    }
    info!(
        allowed_commands = engine.config().allowed_prefixes.len(),
        aliases = engine.alias_commands().len(),
        "stufftext policy active"
    );

    let handlers = build_handlers(&engine, cli.verbose);
    let proxy = Proxy::bind(ProxyConfig {
        listen_addr: cli.listen_addr.clone(),
        upstream_addr: cli.upstream.clone(),
        handlers,
    })
    .await?;

    tokio::select! {
        result = proxy.run() => result?,
        _ = shutdown_signal() => {}
    }

    info!("qwstfw shutting down");
    Ok(())
}
