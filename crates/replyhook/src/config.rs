// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

/// Comment-triggered auto-responder for a social platform account.
#[derive(Debug, Clone, Parser)]
#[command(name = "replyhook", version, about)]
pub struct HookConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "REPLYHOOK_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 5000, env = "REPLYHOOK_PORT")]
    pub port: u16,

    /// Platform app (client) id.
    #[arg(long, env = "REPLYHOOK_APP_ID")]
    pub app_id: String,

    /// Platform app secret.
    #[arg(long, env = "REPLYHOOK_APP_SECRET", hide_env_values = true)]
    pub app_secret: String,

    /// OAuth redirect URI registered with the platform.
    #[arg(long, env = "REPLYHOOK_REDIRECT_URI")]
    pub redirect_uri: String,

    /// Shared secret for the webhook subscription handshake.
    #[arg(long, env = "REPLYHOOK_VERIFY_TOKEN", hide_env_values = true)]
    pub verify_token: String,

    /// Graph API base URL (version included).
    #[arg(long, default_value = "https://graph.facebook.com/v18.0", env = "REPLYHOOK_GRAPH_URL")]
    pub graph_url: String,

    /// OAuth consent dialog URL.
    #[arg(
        long,
        default_value = "https://www.facebook.com/v18.0/dialog/oauth",
        env = "REPLYHOOK_AUTH_URL"
    )]
    pub auth_url: String,

    /// Comma-separated OAuth scopes requested at login.
    #[arg(
        long,
        default_value = "instagram_basic,instagram_manage_comments,instagram_manage_messages,instagram_manage_insights",
        env = "REPLYHOOK_SCOPES"
    )]
    pub scopes: String,

    /// Comma-separated webhook fields subscribed after login.
    #[arg(long, default_value = "comments,messages,mentions", env = "REPLYHOOK_WEBHOOK_FIELDS")]
    pub webhook_fields: String,

    /// Timeout for every upstream call in milliseconds.
    #[arg(long, default_value_t = 15000, env = "REPLYHOOK_UPSTREAM_TIMEOUT_MS")]
    pub upstream_timeout_ms: u64,

    /// Refresh credentials this many seconds before they expire.
    #[arg(long, default_value_t = 300, env = "REPLYHOOK_REFRESH_BUFFER_SECS")]
    pub refresh_buffer_secs: u64,

    /// Where a successful login lands (account id appended as a query).
    #[arg(long, default_value = "/dashboard", env = "REPLYHOOK_DASHBOARD_URL")]
    pub dashboard_url: String,

    /// Where a failed login lands (message appended as a query).
    #[arg(long, default_value = "/error", env = "REPLYHOOK_ERROR_URL")]
    pub error_url: String,

    /// Log format (json or text).
    #[arg(long, default_value = "json", env = "REPLYHOOK_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "REPLYHOOK_LOG_LEVEL")]
    pub log_level: String,
}

impl HookConfig {
    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("app id", &self.app_id),
            ("app secret", &self.app_secret),
            ("redirect uri", &self.redirect_uri),
            ("verify token", &self.verify_token),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{name} must not be empty");
            }
        }
        if !(self.redirect_uri.starts_with("http://") || self.redirect_uri.starts_with("https://"))
        {
            anyhow::bail!("redirect uri must be an absolute http(s) URL");
        }
        if self.upstream_timeout_ms == 0 {
            anyhow::bail!("upstream timeout must be greater than zero");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn refresh_buffer(&self) -> Duration {
        Duration::from_secs(self.refresh_buffer_secs)
    }

    pub fn scope_list(&self) -> Vec<String> {
        split_csv(&self.scopes)
    }

    pub fn webhook_field_list(&self) -> Vec<String> {
        split_csv(&self.webhook_fields)
    }

    /// Config with fixed credentials for tests.
    pub fn test() -> Self {
        Self::parse_from([
            "replyhook",
            "--app-id",
            "app-123",
            "--app-secret",
            "secret-456",
            "--redirect-uri",
            "https://hooks.example.com/auth/callback",
            "--verify-token",
            "T1",
            "--log-format",
            "text",
        ])
    }
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned).collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
