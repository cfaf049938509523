// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Automation rules: which media an account watches and how it answers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::notifier::render_template;

/// Reply rule for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub account_id: String,
    #[serde(rename = "media_id")]
    pub target_media_id: String,
    pub keyword: String,
    /// May contain `{username}`, replaced with the commenter's username.
    #[serde(rename = "response")]
    pub response_template: String,
}

impl AutomationRule {
    pub fn new(
        account_id: impl Into<String>,
        target_media_id: impl Into<String>,
        keyword: impl Into<String>,
        response_template: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            target_media_id: target_media_id.into(),
            keyword: keyword.into(),
            response_template: response_template.into(),
        }
    }

    /// Case-insensitive substring match of the keyword in `text`.
    pub fn matches(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.keyword.to_lowercase())
    }

    pub fn render(&self, username: &str) -> String {
        render_template(&self.response_template, username)
    }
}

/// One rule per account; a later `set` replaces the earlier rule wholesale.
#[derive(Default)]
pub struct RuleRegistry {
    rules: RwLock<HashMap<String, AutomationRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `rule` for `account_id`. Media ownership must be checked by the caller.
    pub async fn set(&self, account_id: &str, mut rule: AutomationRule) {
        rule.account_id = account_id.to_owned();
        tracing::info!(
            account_id,
            media_id = %rule.target_media_id,
            keyword = %rule.keyword,
            "rule configured"
        );
        self.rules.write().await.insert(account_id.to_owned(), rule);
    }

    pub async fn get(&self, account_id: &str) -> Option<AutomationRule> {
        self.rules.read().await.get(account_id).cloned()
    }

    /// Rules watching `media_id`, ordered by account id.
    pub async fn find_by_media(&self, media_id: &str) -> Vec<AutomationRule> {
        let mut found: Vec<_> = self
            .rules
            .read()
            .await
            .values()
            .filter(|r| r.target_media_id == media_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.account_id.cmp(&b.account_id));
        found
    }

    pub async fn len(&self) -> usize {
        self.rules.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rules.read().await.is_empty()
    }
}
