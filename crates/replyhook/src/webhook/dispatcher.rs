// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route parsed comment events to matching rules and notify.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::notifier::Notifier;
use crate::rules::RuleRegistry;
use crate::upstream::Recipient;
use crate::webhook::payload::{parse_delivery, CommentEvent, ParsedChange};

/// Per-delivery tally. Each (comment, rule) pair counts once in
/// `dispatched`, `dropped` or `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub dispatched: usize,
    pub dropped: usize,
    pub failed: usize,
    /// Changes for fields other than comments.
    pub ignored: usize,
    /// Changes that could not be parsed.
    pub invalid: usize,
}

pub struct WebhookDispatcher {
    rules: Arc<RuleRegistry>,
    notifier: Arc<Notifier>,
}

impl WebhookDispatcher {
    pub fn new(rules: Arc<RuleRegistry>, notifier: Arc<Notifier>) -> Self {
        Self { rules, notifier }
    }

    /// Process one delivery. Never fails: every problem is logged and
    /// counted, and later changes still run.
    pub async fn dispatch(&self, body: &Value) -> DispatchReport {
        let mut report = DispatchReport::default();
        for change in parse_delivery(body) {
            match change {
                ParsedChange::Comment(event) => self.route(&event, &mut report).await,
                ParsedChange::Ignored { field } => {
                    tracing::debug!(field = %field, "change ignored");
                    report.ignored += 1;
                }
                ParsedChange::Invalid { reason } => {
                    tracing::warn!(reason = %reason, "malformed webhook change");
                    report.invalid += 1;
                }
            }
        }
        tracing::info!(
            dispatched = report.dispatched,
            dropped = report.dropped,
            failed = report.failed,
            ignored = report.ignored,
            invalid = report.invalid,
            "webhook delivery processed"
        );
        report
    }

    async fn route(&self, event: &CommentEvent, report: &mut DispatchReport) {
        let rules = self.rules.find_by_media(&event.media_id).await;
        if rules.is_empty() {
            tracing::debug!(media_id = %event.media_id, "no rule for media");
        }

        for rule in rules {
            let account_id = rule.account_id.as_str();
            if event.author_id.as_deref() == Some(account_id) {
                tracing::debug!(account_id, "own comment, skipping");
                report.dropped += 1;
                continue;
            }
            if !rule.matches(&event.text) {
                report.dropped += 1;
                continue;
            }

            let text = rule.render(&event.author_username);
            let recipient = match &event.comment_id {
                Some(id) => Recipient::CommentId(id.clone()),
                None => Recipient::Username(event.author_username.clone()),
            };
            match self.notifier.send(account_id, &recipient, &text).await {
                Ok(_) => report.dispatched += 1,
                Err(e) => {
                    tracing::warn!(
                        account_id,
                        media_id = %event.media_id,
                        comment_id = ?event.comment_id,
                        err = %e,
                        "auto-reply failed"
                    );
                    report.failed += 1;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
