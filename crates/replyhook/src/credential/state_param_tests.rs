// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn state_is_url_safe_and_unique() -> anyhow::Result<()> {
    let s1 = generate_state();
    let s2 = generate_state();
    assert_ne!(s1, s2);
    assert_eq!(s1.len(), 43);
    assert!(s1.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    Ok(())
}

#[test]
fn auth_url_carries_required_params() -> anyhow::Result<()> {
    let scopes = vec!["instagram_basic".to_owned(), "instagram_manage_comments".to_owned()];
    let url = build_auth_url(
        "https://www.facebook.com/v18.0/dialog/oauth",
        "app-123",
        "https://hooks.example.com/auth/callback",
        &scopes,
        "state-xyz",
    );
    assert!(url.starts_with("https://www.facebook.com/v18.0/dialog/oauth?client_id=app-123&"));
    assert!(url.contains("redirect_uri=https%3A%2F%2Fhooks.example.com%2Fauth%2Fcallback"));
    assert!(url.contains("scope=instagram_basic%2Cinstagram_manage_comments"));
    assert!(url.contains("response_type=code"));
    assert!(url.ends_with("state=state-xyz"));
    Ok(())
}

#[test]
fn append_query_respects_existing_query() {
    assert_eq!(append_query("/dashboard", &[("account_id", "17")]), "/dashboard?account_id=17");
    assert_eq!(append_query("/app?tab=x", &[("a", "b")]), "/app?tab=x&a=b");
    assert_eq!(append_query("/error", &[("message", "code used")]), "/error?message=code+used");
    assert_eq!(append_query("/plain", &[]), "/plain");
}

#[tokio::test]
async fn pending_state_is_single_use() {
    let pending = PendingStates::default();
    let state = pending.issue().await;
    assert!(pending.consume(&state).await);
    assert!(!pending.consume(&state).await);
    assert!(!pending.consume("never-issued").await);
}

#[tokio::test(start_paused = true)]
async fn pending_state_expires_after_ttl() {
    let pending = PendingStates::new(Duration::from_secs(60));
    let fresh = pending.issue().await;
    let stale = pending.issue().await;

    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(pending.consume(&fresh).await);

    tokio::time::advance(Duration::from_secs(31)).await;
    assert!(!pending.consume(&stale).await);
}

#[tokio::test(start_paused = true)]
async fn issue_prunes_abandoned_states() {
    let pending = PendingStates::new(Duration::from_secs(60));
    for _ in 0..5 {
        pending.issue().await;
    }
    assert_eq!(pending.len().await, 5);

    tokio::time::advance(Duration::from_secs(61)).await;
    let state = pending.issue().await;
    assert_eq!(pending.len().await, 1);
    assert!(pending.consume(&state).await);
}
