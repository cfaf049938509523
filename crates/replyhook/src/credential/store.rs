// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory credential store with per-account serialized refresh.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::credential::{epoch_secs, Credential, TokenKind};
use crate::upstream::GraphApi;

/// Serializes refreshes for one account.
///
/// `generation` bumps after every completed refresh attempt so a caller that
/// queued behind the lock can tell a refresh finished while it waited and
/// reuse that outcome instead of refreshing again.
#[derive(Default)]
struct RefreshGate {
    generation: AtomicU64,
    last_ok: Mutex<bool>,
}

pub struct TokenStore {
    credentials: RwLock<HashMap<String, Credential>>,
    gates: Mutex<HashMap<String, Arc<RefreshGate>>>,
    api: Arc<dyn GraphApi>,
    buffer_secs: u64,
}

impl TokenStore {
    pub fn new(api: Arc<dyn GraphApi>, refresh_buffer: Duration) -> Self {
        Self {
            credentials: RwLock::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            api,
            buffer_secs: refresh_buffer.as_secs(),
        }
    }

    pub async fn get(&self, account_id: &str) -> Option<Credential> {
        self.credentials.read().await.get(account_id).cloned()
    }

    /// Insert or replace the credential for `account_id`.
    pub async fn put(&self, account_id: &str, mut credential: Credential) {
        credential.account_id = account_id.to_owned();
        let replaced =
            self.credentials.write().await.insert(account_id.to_owned(), credential).is_some();
        tracing::info!(account_id, replaced, "credential stored");
    }

    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.credentials.read().await.is_empty()
    }

    /// Make sure the account's credential is usable right now.
    ///
    /// Refreshes when inside the buffer window before expiry. Returns `false`
    /// when there is no credential or the refresh failed; callers must not
    /// use the credential in that case.
    pub async fn refresh_if_needed(&self, account_id: &str) -> bool {
        match self.get(account_id).await {
            None => return false,
            Some(c) if !c.needs_refresh(epoch_secs(), self.buffer_secs) => return true,
            Some(_) => {}
        }

        let gate = self.gate(account_id).await;
        let seen = gate.generation.load(Ordering::SeqCst);
        let mut last_ok = gate.last_ok.lock().await;
        if gate.generation.load(Ordering::SeqCst) != seen {
            return *last_ok;
        }

        // Re-check under the gate: the credential may have been replaced by a login.
        let Some(current) = self.get(account_id).await else {
            return false;
        };
        if !current.needs_refresh(epoch_secs(), self.buffer_secs) {
            return true;
        }

        let ok = match self.api.exchange_long_lived(&current.access_token).await {
            Ok(grant) if !grant.access_token.is_empty() => {
                let now = epoch_secs();
                let mut credentials = self.credentials.write().await;
                match credentials.get_mut(account_id) {
                    Some(c) if c.access_token == current.access_token => {
                        c.access_token = grant.access_token;
                        c.token_kind = TokenKind::LongLived;
                        c.issued_at = now;
                        c.expires_at = grant.expires_in.map(|s| now + s);
                        tracing::info!(account_id, "credential refreshed");
                        true
                    }
                    // A login stored a newer credential while the refresh was in flight.
                    Some(c) => {
                        tracing::info!(account_id, "credential replaced during refresh, keeping newer");
                        !c.needs_refresh(now, self.buffer_secs)
                    }
                    None => false,
                }
            }
            Ok(_) => {
                tracing::warn!(account_id, "refresh returned an empty token");
                false
            }
            Err(e) => {
                tracing::warn!(account_id, err = %e, "credential refresh failed");
                false
            }
        };

        *last_ok = ok;
        gate.generation.fetch_add(1, Ordering::SeqCst);
        ok
    }

    async fn gate(&self, account_id: &str) -> Arc<RefreshGate> {
        let mut gates = self.gates.lock().await;
        Arc::clone(gates.entry(account_id.to_owned()).or_default())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
