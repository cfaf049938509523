// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger of consumed authorization codes.
//!
//! Append-only and never pruned: codes are single-use upstream and short
//! lived, so growth is bounded by the number of logins in this process.

use std::collections::HashMap;

use tokio::sync::Mutex;

/// Result of claiming a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// First sighting; the caller owns the upstream exchange.
    Fresh,
    /// Seen before. `account_id` is set once the first exchange succeeded.
    Used { account_id: Option<String> },
}

#[derive(Default)]
pub struct CodeLedger {
    codes: Mutex<HashMap<String, Option<String>>>,
}

impl CodeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically record `code` as consumed, reporting whether it was already.
    pub async fn claim(&self, code: &str) -> Claim {
        let mut codes = self.codes.lock().await;
        match codes.get(code) {
            Some(account_id) => Claim::Used { account_id: account_id.clone() },
            None => {
                codes.insert(code.to_owned(), None);
                Claim::Fresh
            }
        }
    }

    /// Remember which account a successfully exchanged code produced.
    pub async fn record(&self, code: &str, account_id: &str) {
        self.codes.lock().await.insert(code.to_owned(), Some(account_id.to_owned()));
    }

    pub async fn account_for(&self, code: &str) -> Option<String> {
        self.codes.lock().await.get(code).cloned().flatten()
    }

    pub async fn len(&self) -> usize {
        self.codes.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.codes.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn first_claim_is_fresh_then_used() {
        let ledger = CodeLedger::new();
        assert_eq!(ledger.claim("c1").await, Claim::Fresh);
        assert_eq!(ledger.claim("c1").await, Claim::Used { account_id: None });
        assert_eq!(ledger.claim("c2").await, Claim::Fresh);
        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test]
    async fn record_links_code_to_account() {
        let ledger = CodeLedger::new();
        ledger.claim("c1").await;
        ledger.record("c1", "acct-9").await;
        assert_eq!(ledger.account_for("c1").await.as_deref(), Some("acct-9"));
        assert_eq!(ledger.claim("c1").await, Claim::Used { account_id: Some("acct-9".into()) });
        assert!(ledger.account_for("unknown").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_claims_yield_single_fresh() {
        let ledger = Arc::new(CodeLedger::new());
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move { ledger.claim("dup").await })
            })
            .collect();
        let results = futures_util::future::join_all(tasks).await;
        let fresh = results.iter().filter(|r| matches!(r, Ok(Claim::Fresh))).count();
        assert_eq!(fresh, 1);
    }
}
