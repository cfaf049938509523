// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform API access: the contract, its HTTP implementation, and retries.

pub mod graph;
pub mod retry;

use std::fmt;

pub use graph::{GraphApi, GraphClient, MediaInfo, PlatformProfile, Recipient, TokenGrant};
pub use retry::RetryPolicy;

/// Every way an upstream call can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// No response within the configured timeout.
    Timeout,
    /// The request never produced a response (DNS, connect, TLS).
    Unreachable(String),
    /// The platform answered with a non-success status.
    Rejected { status: u16, message: String },
    /// A success status whose body lacks the expected fields.
    Malformed(String),
}

impl UpstreamError {
    /// Failures worth another attempt under a retry policy.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Unreachable(_) | Self::Malformed(_))
    }

    /// A rejection meaning the token itself is no good.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::Rejected { status: 400 | 401 | 403, .. })
    }

    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Rejected { status: status.as_u16(), message: err.to_string() }
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("upstream timed out"),
            Self::Unreachable(e) => write!(f, "upstream unreachable: {e}"),
            Self::Rejected { status, message } => write!(f, "upstream rejected ({status}): {message}"),
            Self::Malformed(e) => write!(f, "malformed upstream response: {e}"),
        }
    }
}

impl std::error::Error for UpstreamError {}
