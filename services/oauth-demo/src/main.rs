//! Twitch OAuth demo service
//!
//! Small axum app that drives the authorization-code flow against Twitch:
//! 1. Generates a CSRF state and builds the token manager
//! 2. Logs the authorize URL (open it in a browser, or visit `/authorize`)
//! 3. Handles the redirect callback and exchanges the code
//! 4. Serves example Helix calls that refresh the token on demand

mod config;
mod metrics;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twitch_auth::TwitchOAuth;

use crate::config::Config;
use crate::routes::{AppState, build_router};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting twitch-oauth-demo");

    let prometheus_handle = metrics::install_recorder();

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        redirect_uri = %config.twitch.redirect_uri,
        scopes = config.twitch.scopes.len(),
        "configuration loaded"
    );

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.server.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let state = twitch_auth::generate_state();
    let oauth = Arc::new(TwitchOAuth::with_client(
        config.client_config(),
        state,
        http_client,
    ));

    info!(authorize_url = %oauth.authorize_url(), "open this URL to authorize");

    let app = build_router(AppState::new(oauth, prometheus_handle));

    let listener = TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.listen_addr))?;
    info!(addr = %config.server.listen_addr, "accepting requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
