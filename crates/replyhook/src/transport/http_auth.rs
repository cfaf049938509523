// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Browser-facing login endpoints. Every outcome is a redirect.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::credential::state_param::{append_query, build_auth_url};
use crate::error::ErrorCode;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Set by the platform when the user declines consent.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// `GET /auth/start`: redirect to the platform consent dialog.
pub async fn auth_start(State(s): State<Arc<AppState>>) -> Response {
    let state = s.pending_states.issue().await;
    let url = build_auth_url(
        &s.config.auth_url,
        &s.config.app_id,
        &s.config.redirect_uri,
        &s.config.scope_list(),
        &state,
    );
    redirect(url)
}

/// `GET /auth/callback`: finish the login and send the browser on.
pub async fn auth_callback(
    State(s): State<Arc<AppState>>,
    Query(q): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = q.error {
        let message = q.error_description.unwrap_or(error);
        tracing::info!(reason = %message, "login declined");
        return error_redirect(&s, &message);
    }

    let code = q.code.unwrap_or_default();

    if let Some(ref state) = q.state {
        if !s.pending_states.consume(state).await {
            // A replayed callback carries the state its first delivery consumed.
            if let Some(account_id) = s.ledger.account_for(code.trim()).await {
                tracing::info!(account_id = %account_id, "login callback replayed");
                return dashboard_redirect(&s, &account_id);
            }
            tracing::warn!("callback with unknown login state");
            return error_redirect(&s, "Your login session expired. Please try again.");
        }
    }

    if code.trim().is_empty() {
        return error_redirect(&s, "Missing authorization code.");
    }

    match s.exchanger.exchange(&code).await {
        Ok(credential) => dashboard_redirect(&s, &credential.account_id),
        Err(e) if e.code == ErrorCode::CodeAlreadyUsed => {
            match s.ledger.account_for(code.trim()).await {
                Some(account_id) => dashboard_redirect(&s, &account_id),
                None => error_redirect(&s, "This login link was already used. Please log in again."),
            }
        }
        Err(e) => {
            tracing::warn!(code = %e.code, err = %e.message, "login failed");
            error_redirect(&s, &format!("Login failed: {}", e.message))
        }
    }
}

fn dashboard_redirect(s: &AppState, account_id: &str) -> Response {
    redirect(append_query(&s.config.dashboard_url, &[("account_id", account_id)]))
}

fn error_redirect(s: &AppState, message: &str) -> Response {
    redirect(append_query(&s.config.error_url, &[("message", message)]))
}

fn redirect(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
