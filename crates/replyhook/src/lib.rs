// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replyhook: answers keyword comments on a linked account's media with an
//! automatic message.

pub mod config;
pub mod credential;
pub mod error;
pub mod notifier;
pub mod rules;
pub mod state;
pub mod transport;
pub mod upstream;
pub mod webhook;

#[doc(hidden)]
pub mod test_support;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::HookConfig;
use crate::state::AppState;
use crate::transport::build_router;
use crate::upstream::GraphClient;

/// Install the tracing subscriber described by `config`.
pub fn init_tracing(config: &HookConfig) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

/// Run the service until SIGTERM or SIGINT.
pub async fn run(config: HookConfig) -> anyhow::Result<()> {
    // reqwest is built without a default crypto provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let api = Arc::new(GraphClient::new(&config));
    let state = Arc::new(AppState::new(config, api, shutdown.clone()));
    spawn_signal_handler(shutdown.clone());

    let listener = TcpListener::bind(&addr).await?;
    info!("replyhook listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("replyhook stopped");
    Ok(())
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGTERM");
                shutdown.cancel();
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGINT");
                shutdown.cancel();
            }
            _ = shutdown.cancelled() => {}
        }
    });
}
