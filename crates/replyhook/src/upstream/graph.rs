// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Graph API contract and its reqwest-backed client.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::HookConfig;
use crate::upstream::UpstreamError;

pub type UpstreamFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UpstreamError>> + Send + 'a>>;

/// Token payload returned by both the code exchange and the long-lived exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Seconds until expiry; absent for tokens that do not expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// Identity fields as the platform returns them. Nothing is guaranteed present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

/// A media object, reduced to what the ownership check needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub id: String,
    pub owner_id: Option<String>,
}

/// Who receives an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    /// Private reply to the author of a comment.
    CommentId(String),
    Username(String),
}

impl Recipient {
    fn to_json(&self) -> serde_json::Value {
        match self {
            Self::CommentId(id) => serde_json::json!({ "comment_id": id }),
            Self::Username(name) => serde_json::json!({ "username": name }),
        }
    }
}

/// Calls this service makes against the platform.
///
/// Object-safe so state can hold `Arc<dyn GraphApi>` and tests can script it.
pub trait GraphApi: Send + Sync {
    /// Trade an authorization code for a short-lived token.
    fn exchange_code<'a>(&'a self, code: &'a str) -> UpstreamFuture<'a, TokenGrant>;

    /// Trade a token for a long-lived one. Also serves as the refresh call.
    fn exchange_long_lived<'a>(&'a self, token: &'a str) -> UpstreamFuture<'a, TokenGrant>;

    fn fetch_profile<'a>(&'a self, token: &'a str) -> UpstreamFuture<'a, PlatformProfile>;

    fn fetch_media<'a>(&'a self, token: &'a str, media_id: &'a str)
        -> UpstreamFuture<'a, MediaInfo>;

    /// Send a direct message on behalf of `account_id`. Returns the message id if reported.
    fn send_message<'a>(
        &'a self,
        token: &'a str,
        account_id: &'a str,
        recipient: &'a Recipient,
        text: &'a str,
    ) -> UpstreamFuture<'a, Option<String>>;

    /// Subscribe the app to webhook fields for `account_id`.
    fn subscribe_webhooks<'a>(
        &'a self,
        token: &'a str,
        account_id: &'a str,
        fields: &'a [String],
    ) -> UpstreamFuture<'a, bool>;
}

/// HTTP client for the platform's Graph API.
pub struct GraphClient {
    base_url: String,
    app_id: String,
    app_secret: String,
    redirect_uri: String,
    timeout: Duration,
    client: Client,
}

impl GraphClient {
    pub fn new(config: &HookConfig) -> Self {
        let client = Client::builder().timeout(config.upstream_timeout()).build().unwrap_or_default();
        Self {
            base_url: config.graph_url.trim_end_matches('/').to_owned(),
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            timeout: config.upstream_timeout(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a JSON success body.
    async fn call<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, UpstreamError> {
        let resp = req
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&e))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                message: platform_error_message(&text),
            });
        }
        let bytes = resp.bytes().await.map_err(|e| UpstreamError::from_reqwest(&e))?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}

impl GraphApi for GraphClient {
    fn exchange_code<'a>(&'a self, code: &'a str) -> UpstreamFuture<'a, TokenGrant> {
        Box::pin(async move {
            let req = self.client.get(self.url("/oauth/access_token")).query(&[
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code", code),
            ]);
            self.call(req).await
        })
    }

    fn exchange_long_lived<'a>(&'a self, token: &'a str) -> UpstreamFuture<'a, TokenGrant> {
        Box::pin(async move {
            let req = self.client.get(self.url("/oauth/access_token")).query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("fb_exchange_token", token),
            ]);
            self.call(req).await
        })
    }

    fn fetch_profile<'a>(&'a self, token: &'a str) -> UpstreamFuture<'a, PlatformProfile> {
        Box::pin(async move {
            let req = self
                .client
                .get(self.url("/me"))
                .query(&[("fields", "id,username,name,profile_picture_url")])
                .bearer_auth(token);
            self.call(req).await
        })
    }

    fn fetch_media<'a>(
        &'a self,
        token: &'a str,
        media_id: &'a str,
    ) -> UpstreamFuture<'a, MediaInfo> {
        #[derive(Deserialize)]
        struct Owner {
            id: String,
        }
        #[derive(Deserialize)]
        struct RawMedia {
            id: String,
            #[serde(default)]
            owner: Option<Owner>,
        }

        Box::pin(async move {
            let req = self
                .client
                .get(self.url(&format!("/{media_id}")))
                .query(&[("fields", "id,owner")])
                .bearer_auth(token);
            let raw: RawMedia = self.call(req).await?;
            Ok(MediaInfo { id: raw.id, owner_id: raw.owner.map(|o| o.id) })
        })
    }

    fn send_message<'a>(
        &'a self,
        token: &'a str,
        account_id: &'a str,
        recipient: &'a Recipient,
        text: &'a str,
    ) -> UpstreamFuture<'a, Option<String>> {
        #[derive(Deserialize)]
        struct SendResponse {
            #[serde(default)]
            message_id: Option<String>,
        }

        Box::pin(async move {
            let body = serde_json::json!({
                "recipient": recipient.to_json(),
                "message": { "text": text },
            });
            let req = self
                .client
                .post(self.url(&format!("/{account_id}/messages")))
                .bearer_auth(token)
                .json(&body);
            let resp: SendResponse = self.call(req).await?;
            Ok(resp.message_id)
        })
    }

    fn subscribe_webhooks<'a>(
        &'a self,
        token: &'a str,
        account_id: &'a str,
        fields: &'a [String],
    ) -> UpstreamFuture<'a, bool> {
        #[derive(Deserialize)]
        struct SubscribeResponse {
            #[serde(default)]
            success: bool,
        }

        Box::pin(async move {
            let req = self
                .client
                .post(self.url(&format!("/{account_id}/subscribed_apps")))
                .bearer_auth(token)
                .json(&serde_json::json!({ "subscribed_fields": fields }));
            let resp: SubscribeResponse = self.call(req).await?;
            Ok(resp.success)
        })
    }
}

/// Pull `error.message` out of a platform error body, falling back to the raw text.
fn platform_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_owned))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_error_message_prefers_error_field() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190}}"#;
        assert_eq!(platform_error_message(body), "Invalid OAuth access token.");
    }

    #[test]
    fn platform_error_message_falls_back_to_body() {
        assert_eq!(platform_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn recipient_json_shapes() {
        assert_eq!(Recipient::CommentId("c1".into()).to_json(), serde_json::json!({"comment_id": "c1"}));
        assert_eq!(Recipient::Username("bob".into()).to_json(), serde_json::json!({"username": "bob"}));
    }

    #[test]
    fn token_grant_without_expiry() -> anyhow::Result<()> {
        let grant: TokenGrant = serde_json::from_str(r#"{"access_token":"abc","token_type":"bearer"}"#)?;
        assert_eq!(grant.access_token, "abc");
        assert!(grant.expires_in.is_none());
        Ok(())
    }
}
