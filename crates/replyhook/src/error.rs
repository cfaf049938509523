// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::upstream::UpstreamError;

/// Error codes for the replyhook API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidRequest,
    Unauthenticated,
    CredentialUnavailable,
    InvalidToken,
    Forbidden,
    NotFound,
    CodeAlreadyUsed,
    UpstreamTimeout,
    UpstreamRejected,
    MalformedResponse,
    TokenUpgradeFailed,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest => 400,
            Self::Unauthenticated => 401,
            Self::CredentialUnavailable => 401,
            Self::InvalidToken => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::CodeAlreadyUsed => 409,
            Self::UpstreamTimeout => 504,
            Self::UpstreamRejected => 502,
            Self::MalformedResponse => 502,
            Self::TokenUpgradeFailed => 502,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::CredentialUnavailable => "CREDENTIAL_UNAVAILABLE",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::CodeAlreadyUsed => "CODE_ALREADY_USED",
            Self::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            Self::UpstreamRejected => "UPSTREAM_REJECTED",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::TokenUpgradeFailed => "TOKEN_UPGRADE_FAILED",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain error: a code from the taxonomy plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookError {
    pub code: ErrorCode,
    pub message: String,
}

impl HookError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn credential_unavailable(account_id: &str) -> Self {
        Self::new(
            ErrorCode::CredentialUnavailable,
            format!("no usable credential for account {account_id}"),
        )
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for HookError {}

impl From<UpstreamError> for HookError {
    fn from(err: UpstreamError) -> Self {
        let code = match err {
            UpstreamError::Timeout => ErrorCode::UpstreamTimeout,
            UpstreamError::Unreachable(_) | UpstreamError::Rejected { .. } => {
                ErrorCode::UpstreamRejected
            }
            UpstreamError::Malformed(_) => ErrorCode::MalformedResponse,
        };
        Self::new(code, err.to_string())
    }
}

impl IntoResponse for HookError {
    fn into_response(self) -> Response {
        self.code.to_http_response(self.message).into_response()
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
