// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op knowledge store adapter.

use super::{KnowledgeAdapter, KnowledgeError, Match};
use async_trait::async_trait;

/// Knowledge adapter that discards everything stored and never finds a match.
///
/// Used when no external semantic memory store has been wired up yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpKnowledgeAdapter;

impl NoOpKnowledgeAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl KnowledgeAdapter for NoOpKnowledgeAdapter {
    async fn store(&self, _text: &str) -> Result<(), KnowledgeError> {
        Ok(())
    }

    async fn find(&self, _query: &str, _limit: usize) -> Result<Vec<Match>, KnowledgeError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
