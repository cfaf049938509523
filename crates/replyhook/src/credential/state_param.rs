// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth `state` parameter and consent URL helpers.

use std::collections::HashMap;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Generate a random state parameter (32 bytes → 43 URL-safe chars).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the consent dialog URL the browser is redirected to.
pub fn build_auth_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
) -> String {
    let scope = scopes.join(",");
    append_query(
        auth_url,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("scope", &scope),
            ("response_type", "code"),
            ("state", state),
        ],
    )
}

/// Append form-encoded query parameters to `base`, which may already carry a query.
pub fn append_query(base: &str, params: &[(&str, &str)]) -> String {
    let query =
        params.iter().map(|(k, v)| format!("{k}={}", urlencoding(v))).collect::<Vec<_>>().join("&");
    if query.is_empty() {
        return base.to_owned();
    }
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}{query}")
}

/// How long a consent round trip may take before its state is forgotten.
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// States handed out by `/auth/start` and not yet seen on a callback.
///
/// Entries expire after `ttl`; expired ones are pruned on every `issue`, so
/// abandoned logins do not accumulate.
pub struct PendingStates {
    states: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
}

impl Default for PendingStates {
    fn default() -> Self {
        Self::new(STATE_TTL)
    }
}

impl PendingStates {
    pub fn new(ttl: Duration) -> Self {
        Self { states: Mutex::new(HashMap::new()), ttl }
    }

    /// Mint and remember a new state.
    pub async fn issue(&self) -> String {
        let state = generate_state();
        let now = Instant::now();
        let mut states = self.states.lock().await;
        states.retain(|_, issued| now.duration_since(*issued) < self.ttl);
        states.insert(state.clone(), now);
        state
    }

    /// Consume a state. `false` if it was never issued, already used, or expired.
    pub async fn consume(&self, state: &str) -> bool {
        match self.states.lock().await.remove(state) {
            Some(issued) => issued.elapsed() < self.ttl,
            None => false,
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.states.lock().await.len()
    }
}

/// Form-style encoding for URL query parameters (spaces as `+`).
fn urlencoding(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0xf) as usize]));
            }
        }
    }
    out
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

#[cfg(test)]
#[path = "state_param_tests.rs"]
mod tests;
