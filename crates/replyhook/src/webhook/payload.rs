// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lenient parsing of webhook deliveries.
//!
//! A delivery is `{object, entry: [{id?, changes: [{field, value}]}]}`. Each
//! change is parsed on its own so one bad change never hides its siblings.
//! Two comment shapes are accepted:
//!
//! ```json
//! {"media_id": "M1", "id": "c1", "text": "hi", "username": "bob"}
//! {"media": {"id": "M1"}, "id": "c1", "text": "hi", "from": {"id": "9", "username": "bob"}}
//! ```

use serde_json::Value;

/// A new comment on a media object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEvent {
    pub media_id: String,
    pub comment_id: Option<String>,
    pub text: String,
    pub author_username: String,
    pub author_id: Option<String>,
}

/// Outcome of parsing one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedChange {
    Comment(CommentEvent),
    /// A well-formed change for a field this service does not act on.
    Ignored { field: String },
    Invalid { reason: String },
}

/// Flatten a delivery into its changes, in delivery order.
pub fn parse_delivery(body: &Value) -> Vec<ParsedChange> {
    let Some(entries) = body.get("entry").and_then(Value::as_array) else {
        return vec![ParsedChange::Invalid { reason: "delivery has no entry array".into() }];
    };

    let mut out = Vec::new();
    for entry in entries {
        match entry.get("changes").and_then(Value::as_array) {
            Some(changes) => out.extend(changes.iter().map(parse_change)),
            None => out.push(ParsedChange::Invalid { reason: "entry has no changes array".into() }),
        }
    }
    out
}

fn parse_change(change: &Value) -> ParsedChange {
    let Some(field) = change.get("field").and_then(Value::as_str) else {
        return ParsedChange::Invalid { reason: "change has no field".into() };
    };
    if field != "comments" {
        return ParsedChange::Ignored { field: field.to_owned() };
    }
    let Some(value) = change.get("value").filter(|v| v.is_object()) else {
        return ParsedChange::Invalid { reason: "comment change has no value".into() };
    };
    match parse_comment(value) {
        Ok(event) => ParsedChange::Comment(event),
        Err(reason) => ParsedChange::Invalid { reason },
    }
}

fn parse_comment(value: &Value) -> Result<CommentEvent, String> {
    let media_id = string_at(value, &["media_id"])
        .or_else(|| string_at(value, &["media", "id"]))
        .ok_or("comment has no media id")?;
    let text = string_at(value, &["text"])
        .or_else(|| string_at(value, &["message"]))
        .ok_or("comment has no text")?;
    let author_username = string_at(value, &["username"])
        .or_else(|| string_at(value, &["from", "username"]))
        .ok_or("comment has no author username")?;
    let comment_id = string_at(value, &["id"]).or_else(|| string_at(value, &["comment_id"]));
    let author_id = string_at(value, &["from", "id"]);

    Ok(CommentEvent { media_id, comment_id, text, author_username, author_id })
}

// Ids sometimes arrive as JSON numbers.
fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    let mut cur = value;
    for key in path {
        cur = cur.get(key)?;
    }
    match cur {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
