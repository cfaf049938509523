// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outgoing messages on behalf of a linked account.

use std::sync::Arc;

use crate::credential::store::TokenStore;
use crate::error::HookError;
use crate::upstream::{GraphApi, Recipient};

const USERNAME_PLACEHOLDER: &str = "{username}";

/// Replace every `{username}` in `template`.
pub fn render_template(template: &str, username: &str) -> String {
    template.replace(USERNAME_PLACEHOLDER, username)
}

pub struct Notifier {
    api: Arc<dyn GraphApi>,
    store: Arc<TokenStore>,
}

impl Notifier {
    pub fn new(api: Arc<dyn GraphApi>, store: Arc<TokenStore>) -> Self {
        Self { api, store }
    }

    /// Send `text` to `recipient` as `account_id`.
    ///
    /// The account's credential is refreshed first if it is close to expiry;
    /// when that fails nothing is sent. Returns the platform message id when
    /// one is reported.
    pub async fn send(
        &self,
        account_id: &str,
        recipient: &Recipient,
        text: &str,
    ) -> Result<Option<String>, HookError> {
        if !self.store.refresh_if_needed(account_id).await {
            tracing::warn!(account_id, "send skipped, no usable credential");
            return Err(HookError::credential_unavailable(account_id));
        }
        let Some(credential) = self.store.get(account_id).await else {
            return Err(HookError::credential_unavailable(account_id));
        };

        match self.api.send_message(&credential.access_token, account_id, recipient, text).await {
            Ok(message_id) => {
                tracing::info!(account_id, ?recipient, message_id = ?message_id, "message sent");
                Ok(message_id)
            }
            Err(e) => {
                tracing::warn!(account_id, ?recipient, err = %e, "message send failed");
                Err(e.into())
            }
        }
    }
}
