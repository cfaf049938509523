// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the replyhook service.

pub mod http;
pub mod http_auth;
pub mod http_webhook;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum `Router` with all replyhook routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(http::health))
        // Login
        .route("/auth/start", get(http_auth::auth_start))
        .route("/auth/callback", get(http_auth::auth_callback))
        // Platform webhooks
        .route("/webhook", get(http_webhook::webhook_verify).post(http_webhook::webhook_receive))
        // Rules and messaging
        .route("/configure", post(http::configure))
        .route("/rules", get(http::rules_for_account))
        .route("/send-message", post(http::send_message))
        .route("/account-info", get(http::account_info))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
