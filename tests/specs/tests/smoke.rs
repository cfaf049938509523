// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `replyhook` binary.

use std::time::Duration;

use replyhook_specs::{ReplyhookProcess, VERIFY_TOKEN};

const TIMEOUT: Duration = Duration::from_secs(10);

// -- Startup ------------------------------------------------------------------

#[tokio::test]
async fn missing_credentials_fail_fast() -> anyhow::Result<()> {
    for var in [
        "REPLYHOOK_APP_ID",
        "REPLYHOOK_APP_SECRET",
        "REPLYHOOK_REDIRECT_URI",
        "REPLYHOOK_VERIFY_TOKEN",
    ] {
        let mut proc = ReplyhookProcess::build().without(var).spawn()?;
        let status = proc.wait_exit(TIMEOUT).await?;
        assert!(!status.success(), "{var} missing should fail, got {status}");
    }
    Ok(())
}

#[tokio::test]
async fn blank_app_secret_exits_with_usage_error() -> anyhow::Result<()> {
    let mut proc = ReplyhookProcess::build().env("REPLYHOOK_APP_SECRET", " ").spawn()?;
    let status = proc.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(2));
    Ok(())
}

#[tokio::test]
async fn sigterm_shuts_down_cleanly() -> anyhow::Result<()> {
    let mut proc = ReplyhookProcess::start()?;
    proc.wait_healthy(TIMEOUT).await?;

    proc.terminate()?;
    let status = proc.wait_exit(TIMEOUT).await?;
    assert!(status.success(), "expected clean exit, got {status}");
    Ok(())
}

// -- HTTP ---------------------------------------------------------------------

#[tokio::test]
async fn health_reports_empty_state() -> anyhow::Result<()> {
    let proc = ReplyhookProcess::start()?;
    proc.wait_healthy(TIMEOUT).await?;

    let resp: serde_json::Value =
        reqwest::get(format!("{}/health", proc.base_url())).await?.json().await?;
    assert_eq!(resp["status"], "running");
    assert_eq!(resp["accounts"], 0);
    assert_eq!(resp["rules"], 0);
    Ok(())
}

#[tokio::test]
async fn webhook_verification_over_tcp() -> anyhow::Result<()> {
    let proc = ReplyhookProcess::start()?;
    proc.wait_healthy(TIMEOUT).await?;
    let client = reqwest::Client::new();

    let ok = client
        .get(format!(
            "{}/webhook?hub.mode=subscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=XYZ",
            proc.base_url()
        ))
        .send()
        .await?;
    assert_eq!(ok.status().as_u16(), 200);
    assert_eq!(ok.text().await?, "XYZ");

    let denied = client
        .get(format!(
            "{}/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=XYZ",
            proc.base_url()
        ))
        .send()
        .await?;
    assert_eq!(denied.status().as_u16(), 403);
    Ok(())
}

#[tokio::test]
async fn webhook_delivery_is_acknowledged() -> anyhow::Result<()> {
    let proc = ReplyhookProcess::start()?;
    proc.wait_healthy(TIMEOUT).await?;
    let client = reqwest::Client::new();

    for body in [
        r#"{"object":"instagram","entry":[{"changes":[{"field":"comments","value":{"media_id":"M1","text":"price?","username":"bob"}}]}]}"#,
        "not json at all",
    ] {
        let resp = client
            .post(format!("{}/webhook", proc.base_url()))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await?;
        assert_eq!(resp.status().as_u16(), 200);
    }
    Ok(())
}

#[tokio::test]
async fn unknown_account_is_not_found() -> anyhow::Result<()> {
    let proc = ReplyhookProcess::start()?;
    proc.wait_healthy(TIMEOUT).await?;

    let resp = reqwest::get(format!("{}/account-info?account_id=nobody", proc.base_url())).await?;
    assert_eq!(resp.status().as_u16(), 404);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    Ok(())
}
