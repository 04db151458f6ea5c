// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable inter-agent messages: threads, importance, ack-required, and a
//! context-safe inbox that never returns bodies. The overdue-ack sweep
//! mirrors the pack's `ack_ttl.rs` split between a durable row and a
//! periodic background scan.

use sw_core::{
    classify_subject, clamp_inbox_limit, is_broadcast, Clock, Event, Importance, InboxEntry,
    MessageId, ThreadActivity, ThreadId,
};
use tracing::warn;

use crate::error::CoordinatorError;

use super::Coordinator;

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;

impl<C: Clock> Coordinator<C> {
    pub async fn send(
        &self,
        from_agent: &str,
        to_agents: &[String],
        subject: &str,
        body: &str,
        thread_id: Option<ThreadId>,
        importance: Importance,
        ack_required: bool,
    ) -> Result<MessageId, CoordinatorError> {
        if to_agents.is_empty() {
            return Err(CoordinatorError::Validation("message requires at least one recipient".into()));
        }
        let now = self.now_epoch_ms();
        let id = MessageId::new(self.next_id());
        let thread_id = thread_id.unwrap_or_else(|| ThreadId::new(self.next_id()));

        let is_new_thread = self.with_state(|s| !s.threads.contains_key(&thread_id));

        self.append(Event::MessageSent {
            id: id.clone(),
            from_agent: from_agent.to_string(),
            to_agents: to_agents.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
            thread_id: thread_id.clone(),
            importance,
            ack_required,
            created_at_epoch_ms: now,
        })?;

        if is_new_thread {
            self.append(Event::ThreadCreated {
                thread_id: thread_id.clone(),
                creator: from_agent.to_string(),
                initial_subject: subject.to_string(),
                first_message_id: id.clone(),
            })?;
        }

        let _ = is_broadcast(to_agents.len());
        Ok(id)
    }

    /// Header-only view; never carries `body`. `limit` is hard-capped at 5
    /// regardless of the caller's request.
    pub fn inbox(&self, agent: &str, limit: usize, urgent_only: bool) -> Vec<InboxEntry> {
        let limit = clamp_inbox_limit(limit);
        self.with_state(|s| {
            let mut entries = s.inbox_for_agent(agent, false, usize::MAX);
            if urgent_only {
                entries.retain(|e| e.importance == sw_core::Importance::Urgent);
            }
            entries.truncate(limit);
            entries
        })
    }

    pub async fn read_message(
        &self,
        message_id: &MessageId,
        agent_name: &str,
    ) -> Result<String, CoordinatorError> {
        let (subject, recipient_count) = self
            .with_state(|s| {
                s.messages.get(message_id).map(|m| {
                    let count = s
                        .message_recipients
                        .get(message_id)
                        .map(|r| r.len())
                        .unwrap_or(0);
                    (m.subject.clone(), count)
                })
            })
            .ok_or_else(|| CoordinatorError::MessageNotFound(message_id.to_string()))?;

        let classification = classify_subject(&subject).to_string();
        let now = self.now_epoch_ms();
        self.append(Event::MessageRead {
            message_id: message_id.clone(),
            agent_name: agent_name.to_string(),
            read_at_epoch_ms: now,
            classification,
            is_broadcast: is_broadcast(recipient_count),
        })?;

        let body = self
            .with_state(|s| s.messages.get(message_id).map(|m| m.body.clone()))
            .ok_or_else(|| CoordinatorError::MessageNotFound(message_id.to_string()))?;
        Ok(body)
    }

    pub async fn ack(&self, message_id: &MessageId, agent_name: &str) -> Result<(), CoordinatorError> {
        let exists = self.with_state(|s| s.messages.contains_key(message_id));
        if !exists {
            return Err(CoordinatorError::MessageNotFound(message_id.to_string()));
        }
        let now = self.now_epoch_ms();
        self.append(Event::MessageAcked {
            message_id: message_id.clone(),
            agent_name: agent_name.to_string(),
            acked_at_epoch_ms: now,
        })?;
        Ok(())
    }

    pub async fn emit_thread_activity(
        &self,
        thread_id: &ThreadId,
    ) -> Result<ThreadActivity, CoordinatorError> {
        let activity = self
            .with_state(|s| s.thread_activity(thread_id))
            .ok_or_else(|| CoordinatorError::Validation(format!("unknown thread {thread_id}")))?;

        self.append(Event::ThreadActivity {
            thread_id: thread_id.clone(),
            message_count: activity.message_count,
            participant_count: activity.participant_count,
            last_message_agent: activity.last_message_agent.clone(),
        })?;
        Ok(activity)
    }

    /// Lazy TTL reclamation for `ack_required` messages: logs every
    /// recipient still unacked past `ttl_ms`. Advisory only -- it does not
    /// mutate the recipient row, matching the spec's read-side filtering
    /// for reservations (Design Notes (b)) applied the same way here.
    pub fn sweep_overdue_acks(&self, ttl_ms: i64) {
        let now = self.now_epoch_ms();
        let overdue: Vec<(MessageId, String)> = self.with_state(|s| {
            s.overdue_acks(now, ttl_ms)
                .into_iter()
                .map(|(msg, recipient)| (msg.id.clone(), recipient.agent_name.clone()))
                .collect()
        });
        for (message_id, agent_name) in overdue {
            warn!(%message_id, %agent_name, "message ack overdue");
        }
    }
}
