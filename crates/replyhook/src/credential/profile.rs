// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolve who a token belongs to.

use std::sync::Arc;

use crate::credential::Profile;
use crate::error::{ErrorCode, HookError};
use crate::upstream::{GraphApi, PlatformProfile, RetryPolicy, UpstreamError};

/// Authenticated identity behind an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: String,
    pub profile: Profile,
}

pub struct ProfileFetcher {
    api: Arc<dyn GraphApi>,
    policy: RetryPolicy,
}

impl ProfileFetcher {
    pub fn new(api: Arc<dyn GraphApi>, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }

    /// Look up the identity for `token`, retrying transient failures.
    ///
    /// A response without an id or username is malformed and retried like a
    /// timeout. A rejected token fails at once with `INVALID_TOKEN`.
    pub async fn fetch(&self, token: &str) -> Result<Identity, HookError> {
        let result = self
            .policy
            .run(
                "fetch_profile",
                |_attempt| async move {
                    let raw = self.api.fetch_profile(token).await?;
                    identity_from(raw)
                },
                UpstreamError::is_transient,
            )
            .await;

        result.map_err(|e| {
            if e.is_invalid_token() {
                HookError::new(ErrorCode::InvalidToken, e.to_string())
            } else {
                HookError::from(e)
            }
        })
    }
}

fn identity_from(raw: PlatformProfile) -> Result<Identity, UpstreamError> {
    let account_id = non_empty(raw.id)
        .ok_or_else(|| UpstreamError::Malformed("profile response has no id".into()))?;
    let username = non_empty(raw.username)
        .ok_or_else(|| UpstreamError::Malformed("profile response has no username".into()))?;
    Ok(Identity {
        account_id,
        profile: Profile {
            username,
            display_name: non_empty(raw.name),
            avatar_url: non_empty(raw.profile_picture_url),
        },
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::test_support::FakeGraph;

    fn fetcher(fake: &Arc<FakeGraph>) -> ProfileFetcher {
        ProfileFetcher::new(Arc::clone(fake) as Arc<dyn GraphApi>, RetryPolicy::profile())
    }

    #[tokio::test]
    async fn maps_profile_fields() -> anyhow::Result<()> {
        let fake = FakeGraph::new();
        fake.set_profile("17841400000", "brand");
        let identity = fetcher(&fake).fetch("tok").await?;
        assert_eq!(identity.account_id, "17841400000");
        assert_eq!(identity.profile.username, "brand");
        assert_eq!(identity.profile.display_name.as_deref(), Some("Brand Account"));
        assert_eq!(identity.profile.avatar_url, None);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn three_transient_failures_then_success() -> anyhow::Result<()> {
        let fake = FakeGraph::new();
        fake.push_profile_result(Err(UpstreamError::Timeout));
        fake.push_profile_result(Ok(PlatformProfile::default()));
        fake.push_profile_result(Err(UpstreamError::Unreachable("connection reset".into())));

        let started = Instant::now();
        let identity = fetcher(&fake).fetch("tok").await?;

        assert_eq!(identity.profile.username, "brand");
        assert_eq!(fake.profile_fetches(), 4);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2 + 4 + 8), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(15), "elapsed {elapsed:?}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn delays_follow_schedule_in_order() {
        let fake = FakeGraph::new();
        for _ in 0..4 {
            fake.push_profile_result(Err(UpstreamError::Timeout));
        }
        let fetcher = fetcher(&fake);
        let started = Instant::now();

        let task = tokio::spawn(async move { fetcher.fetch("tok").await });

        // Attempts land at t=0, 2, 6, 14.
        for (at, expected) in [(1, 1), (3, 2), (7, 3), (15, 4)] {
            tokio::time::sleep_until(started + Duration::from_secs(at)).await;
            assert_eq!(fake.profile_fetches(), expected, "attempts at t={at}s");
        }

        let result = task.await;
        assert!(matches!(
            result,
            Ok(Err(HookError { code: ErrorCode::UpstreamTimeout, .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_token_fails_without_retry() {
        let fake = FakeGraph::new();
        fake.push_profile_result(Err(UpstreamError::Rejected {
            status: 400,
            message: "Invalid OAuth access token".into(),
        }));
        let started = Instant::now();

        let err = fetcher(&fake).fetch("bad").await.err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::InvalidToken));
        assert_eq!(fake.profile_fetches(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_is_not_retried() {
        let fake = FakeGraph::new();
        fake.push_profile_result(Err(UpstreamError::Rejected {
            status: 500,
            message: "An unexpected error has occurred".into(),
        }));

        let err = fetcher(&fake).fetch("tok").await.err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::UpstreamRejected));
        assert_eq!(fake.profile_fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_username_exhausts_as_malformed() {
        let fake = FakeGraph::new();
        for _ in 0..4 {
            fake.push_profile_result(Ok(PlatformProfile {
                id: Some("1".into()),
                username: Some("  ".into()),
                ..PlatformProfile::default()
            }));
        }

        let err = fetcher(&fake).fetch("tok").await.err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::MalformedResponse));
        assert_eq!(fake.profile_fetches(), 4);
    }
}
