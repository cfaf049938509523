// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound platform webhooks: subscription handshake and comment delivery.

pub mod dispatcher;
pub mod payload;

pub use dispatcher::{DispatchReport, WebhookDispatcher};
pub use payload::{parse_delivery, CommentEvent, ParsedChange};

/// Answer a subscription handshake.
///
/// Returns the challenge to echo iff `mode` is `subscribe` and `token`
/// matches the configured verify token. Stateless per request.
pub fn verify(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected: &str,
) -> Option<String> {
    if mode != Some("subscribe") {
        return None;
    }
    let token = token?;
    if !constant_time_eq(token, expected) {
        return None;
    }
    Some(challenge.unwrap_or_default().to_owned())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}
