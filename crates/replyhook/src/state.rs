// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::HookConfig;
use crate::credential::ledger::CodeLedger;
use crate::credential::oauth::OAuthExchanger;
use crate::credential::profile::ProfileFetcher;
use crate::credential::state_param::PendingStates;
use crate::credential::store::TokenStore;
use crate::notifier::Notifier;
use crate::rules::RuleRegistry;
use crate::upstream::{GraphApi, RetryPolicy};
use crate::webhook::WebhookDispatcher;

/// Shared service state, handed to every handler.
pub struct AppState {
    pub config: HookConfig,
    pub api: Arc<dyn GraphApi>,
    pub store: Arc<TokenStore>,
    pub ledger: Arc<CodeLedger>,
    pub rules: Arc<RuleRegistry>,
    /// OAuth `state` values issued by `/auth/start`.
    pub pending_states: PendingStates,
    pub exchanger: OAuthExchanger,
    pub notifier: Arc<Notifier>,
    pub dispatcher: Arc<WebhookDispatcher>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: HookConfig, api: Arc<dyn GraphApi>, shutdown: CancellationToken) -> Self {
        let store = Arc::new(TokenStore::new(Arc::clone(&api), config.refresh_buffer()));
        let ledger = Arc::new(CodeLedger::new());
        let rules = Arc::new(RuleRegistry::new());
        let fetcher = Arc::new(ProfileFetcher::new(Arc::clone(&api), RetryPolicy::profile()));
        let exchanger = OAuthExchanger::new(
            Arc::clone(&api),
            Arc::clone(&ledger),
            fetcher,
            Arc::clone(&store),
            config.webhook_field_list(),
        );
        let notifier = Arc::new(Notifier::new(Arc::clone(&api), Arc::clone(&store)));
        let dispatcher =
            Arc::new(WebhookDispatcher::new(Arc::clone(&rules), Arc::clone(&notifier)));

        Self {
            config,
            api,
            store,
            ledger,
            rules,
            pending_states: PendingStates::default(),
            exchanger,
            notifier,
            dispatcher,
            shutdown,
        }
    }
}
