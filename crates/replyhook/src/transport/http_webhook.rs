// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::state::AppState;
use crate::webhook;

#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode", default)]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: Option<String>,
}

/// `GET /webhook`: subscription handshake.
pub async fn webhook_verify(
    State(s): State<Arc<AppState>>,
    Query(q): Query<VerifyQuery>,
) -> Response {
    match webhook::verify(
        q.mode.as_deref(),
        q.verify_token.as_deref(),
        q.challenge.as_deref(),
        &s.config.verify_token,
    ) {
        Some(challenge) => {
            tracing::info!("webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        None => {
            tracing::warn!(mode = ?q.mode, "webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// `POST /webhook`: acknowledge at once, dispatch in the background.
pub async fn webhook_receive(State(s): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(err = %e, len = body.len(), "unparseable webhook body");
            return StatusCode::OK;
        }
    };

    let dispatcher = Arc::clone(&s.dispatcher);
    let shutdown = s.shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::warn!("webhook dispatch abandoned at shutdown");
            }
            _ = dispatcher.dispatch(&payload) => {}
        }
    });
    StatusCode::OK
}
