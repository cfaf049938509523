// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON API handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::credential::AccountSummary;
use crate::error::{ErrorCode, HookError};
use crate::rules::AutomationRule;
use crate::state::AppState;
use crate::upstream::{Recipient, UpstreamError};

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub accounts: usize,
    pub rules: usize,
}

#[derive(Debug, Deserialize)]
pub struct ConfigureRequest {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub media_id: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    #[serde(default)]
    pub account_id: Option<String>,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /health`
pub async fn health(State(s): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running".to_owned(),
        accounts: s.store.len().await,
        rules: s.rules.len().await,
    })
}

/// `POST /configure`: set the account's rule after confirming it owns the media.
pub async fn configure(
    State(s): State<Arc<AppState>>,
    body: Result<Json<ConfigureRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, HookError> {
    let Json(req) = body.map_err(|e| HookError::invalid_request(e.body_text()))?;
    let account_id = path_id(required(req.account_id, "account_id")?, "account_id")?;
    let media_id = path_id(required(req.media_id, "media_id")?, "media_id")?;
    let keyword = required(req.keyword, "keyword")?;
    let response = required(req.response, "response")?;

    if s.store.get(&account_id).await.is_none() {
        return Err(HookError::not_found(format!("unknown account: {account_id}")));
    }
    if !s.store.refresh_if_needed(&account_id).await {
        return Err(HookError::credential_unavailable(&account_id));
    }
    let credential =
        s.store.get(&account_id).await.ok_or_else(|| HookError::credential_unavailable(&account_id))?;

    let media = match s.api.fetch_media(&credential.access_token, &media_id).await {
        Ok(media) => media,
        Err(UpstreamError::Rejected { status: 400 | 404, .. }) => {
            return Err(HookError::not_found(format!("media not found: {media_id}")));
        }
        Err(e) => return Err(e.into()),
    };
    match media.owner_id.as_deref() {
        Some(owner) if owner == account_id => {}
        Some(_) => {
            tracing::warn!(account_id = %account_id, media_id = %media_id, "media owned by another account");
            return Err(HookError::new(
                ErrorCode::Forbidden,
                format!("media {media_id} does not belong to account {account_id}"),
            ));
        }
        None => {
            return Err(HookError::new(
                ErrorCode::MalformedResponse,
                "media lookup returned no owner",
            ));
        }
    }

    let rule = AutomationRule::new(account_id.clone(), media_id, keyword, response);
    s.rules.set(&account_id, rule).await;
    Ok(Json(SuccessResponse { success: true, message_id: None }))
}

/// `GET /rules?account_id=`
pub async fn rules_for_account(
    State(s): State<Arc<AppState>>,
    Query(q): Query<AccountQuery>,
) -> Result<Json<AutomationRule>, HookError> {
    let account_id = required(q.account_id, "account_id")?;
    s.rules
        .get(&account_id)
        .await
        .map(Json)
        .ok_or_else(|| HookError::not_found(format!("no rule for account: {account_id}")))
}

/// `POST /send-message`: direct message from a linked account.
pub async fn send_message(
    State(s): State<Arc<AppState>>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, HookError> {
    let Json(req) = body.map_err(|e| HookError::invalid_request(e.body_text()))?;
    let account_id = path_id(required(req.account_id, "account_id")?, "account_id")?;
    let username = required(req.username, "username")?;
    let text = required(req.text, "text")?;

    if s.store.get(&account_id).await.is_none() {
        return Err(HookError::not_found(format!("unknown account: {account_id}")));
    }
    let message_id = s.notifier.send(&account_id, &Recipient::Username(username), &text).await?;
    Ok(Json(SuccessResponse { success: true, message_id }))
}

/// `GET /account-info?account_id=`
pub async fn account_info(
    State(s): State<Arc<AppState>>,
    Query(q): Query<AccountQuery>,
) -> Result<Json<AccountSummary>, HookError> {
    let account_id = required(q.account_id, "account_id")?;
    s.store
        .get(&account_id)
        .await
        .map(|c| Json(c.summary()))
        .ok_or_else(|| HookError::not_found(format!("unknown account: {account_id}")))
}

fn required(value: Option<String>, name: &str) -> Result<String, HookError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_owned()),
        _ => Err(HookError::invalid_request(format!("{name} is required"))),
    }
}

/// Ids end up as platform URL path segments; only `[A-Za-z0-9_-]` passes.
fn path_id(value: String, name: &str) -> Result<String, HookError> {
    if value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
        Ok(value)
    } else {
        Err(HookError::invalid_request(format!("{name} is not a valid id")))
    }
}
