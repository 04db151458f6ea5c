// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Projected message / message-recipient rows and thread bookkeeping.

use crate::{Importance, MessageId, ThreadId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A durable inter-agent message. `body` is owned by this row but the
/// inbox projection never surfaces it -- only [`readMessage`] does (see
/// `sw-engine`'s message-bus handlers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from_agent: String,
    pub to_agents: Vec<String>,
    pub subject: String,
    pub body: String,
    pub thread_id: ThreadId,
    pub importance: Importance,
    pub ack_required: bool,
    pub created_at_epoch_ms: i64,
    /// Set by `readMessage`'s classifier the first time any recipient reads
    /// the message; `None` until then.
    pub classification: Option<String>,
}

/// Per-recipient read/ack tracking for a [`Message`]. Each recipient is
/// tracked independently: one row per `(message_id, agent_name)` pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageRecipient {
    pub message_id: MessageId,
    pub agent_name: String,
    pub read_at_epoch_ms: Option<i64>,
    pub acked_at_epoch_ms: Option<i64>,
}

/// A header-only view of a [`Message`], returned by `inbox`. Never carries
/// `body` -- this is the context-preservation contract the spec requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxEntry {
    pub id: MessageId,
    pub from_agent: String,
    pub subject: String,
    pub thread_id: ThreadId,
    pub importance: Importance,
    pub ack_required: bool,
    pub created_at_epoch_ms: i64,
    pub read_at_epoch_ms: Option<i64>,
}

/// Aggregate activity computed over a thread on demand by
/// `emitThreadActivity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadActivity {
    pub thread_id: ThreadId,
    pub message_count: u32,
    pub participant_count: u32,
    pub last_message_agent: String,
}

/// Classify a message subject the way `readMessage` does: `progress`,
/// `blocked`, `question`, `status`, or `general`.
pub fn classify_subject(subject: &str) -> &'static str {
    let lower = subject.to_ascii_lowercase();
    if lower.contains("progress") {
        "progress"
    } else if lower.contains("blocked") {
        "blocked"
    } else if subject.trim_end().ends_with('?') {
        "question"
    } else if lower.contains("status") {
        "status"
    } else {
        "general"
    }
}

/// `is_broadcast = recipient_count >= 3`.
pub fn is_broadcast(recipient_count: usize) -> bool {
    recipient_count >= 3
}

/// Hard cap `inbox`'s requested limit at 5, regardless of what the caller
/// asked for.
pub fn clamp_inbox_limit(requested: usize) -> usize {
    requested.min(5)
}

pub type RecipientsByMessage = HashMap<MessageId, Vec<MessageRecipient>>;
