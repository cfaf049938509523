// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authorization code → long-lived credential.

use std::sync::Arc;

use crate::credential::ledger::{Claim, CodeLedger};
use crate::credential::profile::ProfileFetcher;
use crate::credential::store::TokenStore;
use crate::credential::Credential;
use crate::error::{ErrorCode, HookError};
use crate::upstream::{GraphApi, UpstreamError};

/// Completes a login: code exchange, long-lived upgrade, identity lookup,
/// then storage under the platform account id.
pub struct OAuthExchanger {
    api: Arc<dyn GraphApi>,
    ledger: Arc<CodeLedger>,
    fetcher: Arc<ProfileFetcher>,
    store: Arc<TokenStore>,
    webhook_fields: Vec<String>,
}

impl OAuthExchanger {
    pub fn new(
        api: Arc<dyn GraphApi>,
        ledger: Arc<CodeLedger>,
        fetcher: Arc<ProfileFetcher>,
        store: Arc<TokenStore>,
        webhook_fields: Vec<String>,
    ) -> Self {
        Self { api, ledger, fetcher, store, webhook_fields }
    }

    /// Exchange `code` exactly once.
    ///
    /// The code is claimed in the ledger before any upstream call, so a
    /// duplicate (even a concurrent one) fails with `CODE_ALREADY_USED`
    /// without reaching the platform. A claimed code stays claimed when the
    /// exchange fails; the platform would reject the replay anyway.
    pub async fn exchange(&self, code: &str) -> Result<Credential, HookError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(HookError::invalid_request("authorization code is required"));
        }

        if let Claim::Used { account_id } = self.ledger.claim(code).await {
            tracing::info!(linked = account_id.is_some(), "authorization code reused");
            return Err(HookError::new(
                ErrorCode::CodeAlreadyUsed,
                "authorization code was already exchanged",
            ));
        }

        let short = self.api.exchange_code(code).await?;
        if short.access_token.is_empty() {
            return Err(HookError::new(
                ErrorCode::MalformedResponse,
                "code exchange returned no access token",
            ));
        }

        let long = match self.api.exchange_long_lived(&short.access_token).await {
            Ok(grant) if !grant.access_token.is_empty() => grant,
            Ok(_) => {
                return Err(HookError::new(
                    ErrorCode::TokenUpgradeFailed,
                    "long-lived exchange returned no access token",
                ));
            }
            Err(UpstreamError::Timeout) => {
                return Err(HookError::new(
                    ErrorCode::UpstreamTimeout,
                    "long-lived exchange timed out",
                ));
            }
            Err(e) => {
                tracing::warn!(err = %e, "long-lived exchange failed");
                return Err(HookError::new(
                    ErrorCode::TokenUpgradeFailed,
                    format!("could not upgrade to a long-lived token: {e}"),
                ));
            }
        };

        let identity = self.fetcher.fetch(&long.access_token).await?;
        let account_id = identity.account_id.clone();
        let credential = Credential::from_grant(account_id.clone(), long, identity.profile);

        self.store.put(&account_id, credential.clone()).await;
        self.ledger.record(code, &account_id).await;
        tracing::info!(
            account_id = %account_id,
            username = %credential.profile.username,
            "account linked"
        );

        self.subscribe(&credential).await;
        Ok(credential)
    }

    // Best-effort; a failed subscription leaves the login intact.
    async fn subscribe(&self, credential: &Credential) {
        if self.webhook_fields.is_empty() {
            return;
        }
        let account_id = credential.account_id.as_str();
        match self
            .api
            .subscribe_webhooks(&credential.access_token, account_id, &self.webhook_fields)
            .await
        {
            Ok(true) => tracing::info!(account_id, fields = ?self.webhook_fields, "webhooks subscribed"),
            Ok(false) => tracing::warn!(account_id, "webhook subscription not acknowledged"),
            Err(e) => tracing::warn!(account_id, err = %e, "webhook subscription failed"),
        }
    }
}

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
