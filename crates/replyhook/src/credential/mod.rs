// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account credentials: login, storage, and refresh.
//!
//! Everything here lives for the process lifetime only. A login turns an
//! authorization code into a long-lived token plus profile and stores it under
//! the platform account id; later sends refresh it shortly before expiry.

pub mod ledger;
pub mod oauth;
pub mod profile;
pub mod state_param;
pub mod store;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::upstream::TokenGrant;

/// Lifetime class of an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    ShortLived,
    LongLived,
}

/// Public identity of a linked account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Stored credential for one account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub account_id: String,
    pub access_token: String,
    pub token_kind: TokenKind,
    /// Epoch seconds.
    pub issued_at: u64,
    /// Epoch seconds; `None` for tokens without an expiry.
    pub expires_at: Option<u64>,
    pub profile: Profile,
}

impl Credential {
    /// Build a long-lived credential from a token grant issued now.
    pub fn from_grant(account_id: String, grant: TokenGrant, profile: Profile) -> Self {
        let now = epoch_secs();
        Self {
            account_id,
            access_token: grant.access_token,
            token_kind: TokenKind::LongLived,
            issued_at: now,
            expires_at: grant.expires_in.map(|s| now + s),
            profile,
        }
    }

    /// True once `expires_at - now` is within `buffer_secs` (or the token is past expiry).
    pub fn needs_refresh(&self, now: u64, buffer_secs: u64) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at.saturating_sub(buffer_secs),
            None => false,
        }
    }

    pub fn summary(&self) -> AccountSummary {
        let now = epoch_secs();
        AccountSummary {
            account_id: self.account_id.clone(),
            profile: self.profile.clone(),
            token_kind: self.token_kind,
            issued_at: self.issued_at,
            expires_in_secs: self.expires_at.map(|e| e.saturating_sub(now)),
        }
    }
}

// Hand-written so the token never reaches logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("account_id", &self.account_id)
            .field("access_token", &"<redacted>")
            .field("token_kind", &self.token_kind)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("profile", &self.profile)
            .finish()
    }
}

/// Account view returned by the API (no secrets).
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub account_id: String,
    pub profile: Profile,
    pub token_kind: TokenKind,
    pub issued_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_secs: Option<u64>,
}

pub fn epoch_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
