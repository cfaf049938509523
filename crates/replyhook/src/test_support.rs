// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a scripted platform API and builders.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::HookConfig;
use crate::credential::{epoch_secs, Credential, Profile, TokenKind};
use crate::state::AppState;
use crate::upstream::graph::UpstreamFuture;
use crate::upstream::{GraphApi, MediaInfo, PlatformProfile, Recipient, TokenGrant, UpstreamError};

/// One recorded call against [`FakeGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphCall {
    ExchangeCode { code: String },
    ExchangeLongLived { token: String },
    FetchProfile { token: String },
    FetchMedia { token: String, media_id: String },
    SendMessage { token: String, account_id: String, recipient: Recipient, text: String },
    Subscribe { account_id: String, fields: Vec<String> },
}

type Script<T> = Mutex<VecDeque<Result<T, UpstreamError>>>;

/// Scripted [`GraphApi`]. Queued results are served first; once a queue is
/// empty each call falls back to a plausible default.
#[derive(Default)]
pub struct FakeGraph {
    calls: Mutex<Vec<GraphCall>>,
    code_results: Script<TokenGrant>,
    long_lived_results: Script<TokenGrant>,
    profile_results: Script<PlatformProfile>,
    send_results: Script<Option<String>>,
    media_owners: Mutex<HashMap<String, String>>,
    profile: Mutex<Option<(String, String)>>,
    delay: Mutex<Option<Duration>>,
    seq: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl FakeGraph {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Identity returned by default profile lookups.
    pub fn set_profile(&self, account_id: &str, username: &str) {
        *lock(&self.profile) = Some((account_id.to_owned(), username.to_owned()));
    }

    /// Register `owner` as the owner of `media_id`.
    pub fn set_media_owner(&self, media_id: &str, owner: &str) {
        lock(&self.media_owners).insert(media_id.to_owned(), owner.to_owned());
    }

    /// Delay every call (keeps calls in flight for concurrency tests).
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    pub fn push_code_result(&self, result: Result<TokenGrant, UpstreamError>) {
        lock(&self.code_results).push_back(result);
    }

    pub fn push_long_lived_result(&self, result: Result<TokenGrant, UpstreamError>) {
        lock(&self.long_lived_results).push_back(result);
    }

    pub fn push_profile_result(&self, result: Result<PlatformProfile, UpstreamError>) {
        lock(&self.profile_results).push_back(result);
    }

    pub fn push_send_result(&self, result: Result<Option<String>, UpstreamError>) {
        lock(&self.send_results).push_back(result);
    }

    pub fn calls(&self) -> Vec<GraphCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, pred: impl Fn(&GraphCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    pub fn code_exchanges(&self) -> usize {
        self.count(|c| matches!(c, GraphCall::ExchangeCode { .. }))
    }

    pub fn long_lived_exchanges(&self) -> usize {
        self.count(|c| matches!(c, GraphCall::ExchangeLongLived { .. }))
    }

    pub fn profile_fetches(&self) -> usize {
        self.count(|c| matches!(c, GraphCall::FetchProfile { .. }))
    }

    /// `(account_id, recipient, text)` for every send attempt.
    pub fn sent_messages(&self) -> Vec<(String, Recipient, String)> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                GraphCall::SendMessage { account_id, recipient, text, .. } => {
                    Some((account_id.clone(), recipient.clone(), text.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GraphCall) {
        lock(&self.calls).push(call);
    }

    async fn pause(&self) {
        let delay = *lock(&self.delay);
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl GraphApi for FakeGraph {
    fn exchange_code<'a>(&'a self, code: &'a str) -> UpstreamFuture<'a, TokenGrant> {
        Box::pin(async move {
            self.record(GraphCall::ExchangeCode { code: code.to_owned() });
            self.pause().await;
            let scripted = lock(&self.code_results).pop_front();
            scripted.unwrap_or_else(|| {
                Ok(TokenGrant {
                    access_token: format!("short-{code}"),
                    token_type: Some("bearer".into()),
                    expires_in: Some(3600),
                })
            })
        })
    }

    fn exchange_long_lived<'a>(&'a self, token: &'a str) -> UpstreamFuture<'a, TokenGrant> {
        Box::pin(async move {
            self.record(GraphCall::ExchangeLongLived { token: token.to_owned() });
            self.pause().await;
            let scripted = lock(&self.long_lived_results).pop_front();
            scripted.unwrap_or_else(|| {
                Ok(TokenGrant {
                    access_token: format!("long-{}", self.next_seq()),
                    token_type: Some("bearer".into()),
                    expires_in: Some(60 * 24 * 3600),
                })
            })
        })
    }

    fn fetch_profile<'a>(&'a self, token: &'a str) -> UpstreamFuture<'a, PlatformProfile> {
        Box::pin(async move {
            self.record(GraphCall::FetchProfile { token: token.to_owned() });
            self.pause().await;
            let scripted = lock(&self.profile_results).pop_front();
            scripted.unwrap_or_else(|| {
                let (id, username) = lock(&self.profile)
                    .clone()
                    .unwrap_or_else(|| ("acct-1".to_owned(), "brand".to_owned()));
                Ok(PlatformProfile {
                    id: Some(id),
                    username: Some(username),
                    name: Some("Brand Account".into()),
                    profile_picture_url: None,
                })
            })
        })
    }

    fn fetch_media<'a>(
        &'a self,
        token: &'a str,
        media_id: &'a str,
    ) -> UpstreamFuture<'a, MediaInfo> {
        Box::pin(async move {
            self.record(GraphCall::FetchMedia {
                token: token.to_owned(),
                media_id: media_id.to_owned(),
            });
            self.pause().await;
            match lock(&self.media_owners).get(media_id) {
                Some(owner) => {
                    Ok(MediaInfo { id: media_id.to_owned(), owner_id: Some(owner.clone()) })
                }
                None => Err(UpstreamError::Rejected {
                    status: 400,
                    message: format!("Unsupported get request. Object with ID '{media_id}' does not exist"),
                }),
            }
        })
    }

    fn send_message<'a>(
        &'a self,
        token: &'a str,
        account_id: &'a str,
        recipient: &'a Recipient,
        text: &'a str,
    ) -> UpstreamFuture<'a, Option<String>> {
        Box::pin(async move {
            self.record(GraphCall::SendMessage {
                token: token.to_owned(),
                account_id: account_id.to_owned(),
                recipient: recipient.clone(),
                text: text.to_owned(),
            });
            self.pause().await;
            let scripted = lock(&self.send_results).pop_front();
            scripted.unwrap_or_else(|| Ok(Some(format!("mid-{}", self.next_seq()))))
        })
    }

    fn subscribe_webhooks<'a>(
        &'a self,
        _token: &'a str,
        account_id: &'a str,
        fields: &'a [String],
    ) -> UpstreamFuture<'a, bool> {
        Box::pin(async move {
            self.record(GraphCall::Subscribe {
                account_id: account_id.to_owned(),
                fields: fields.to_vec(),
            });
            Ok(true)
        })
    }
}

/// Credential for `account_id` expiring `expires_in` seconds from now.
pub fn credential(account_id: &str, token: &str, expires_in: Option<u64>) -> Credential {
    let now = epoch_secs();
    Credential {
        account_id: account_id.to_owned(),
        access_token: token.to_owned(),
        token_kind: TokenKind::LongLived,
        issued_at: now,
        expires_at: expires_in.map(|s| now + s),
        profile: Profile {
            username: format!("{account_id}-user"),
            display_name: None,
            avatar_url: None,
        },
    }
}

/// App state wired to `fake` with the test config.
pub fn test_state(fake: Arc<FakeGraph>) -> Arc<AppState> {
    Arc::new(AppState::new(HookConfig::test(), fake, CancellationToken::new()))
}

/// Extension trait to convert any `Display` error into `anyhow::Error`.
pub trait AnyhowExt<T> {
    fn anyhow(self) -> anyhow::Result<T>;
}

impl<T, E: std::fmt::Display> AnyhowExt<T> for Result<T, E> {
    fn anyhow(self) -> anyhow::Result<T> {
        self.map_err(|e| anyhow::anyhow!("{e}"))
    }
}

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
