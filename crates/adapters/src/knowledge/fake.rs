// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake knowledge store adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{KnowledgeAdapter, KnowledgeError, Match};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

struct FakeKnowledgeState {
    entries: Vec<String>,
}

/// Fake knowledge adapter for testing: stores text in memory and scores
/// `find` matches by substring containment, most recent first.
#[derive(Clone)]
pub struct FakeKnowledgeAdapter {
    inner: Arc<Mutex<FakeKnowledgeState>>,
}

impl Default for FakeKnowledgeAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeKnowledgeState {
                entries: Vec::new(),
            })),
        }
    }
}

impl FakeKnowledgeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Vec<String> {
        self.inner.lock().entries.clone()
    }
}

#[async_trait]
impl KnowledgeAdapter for FakeKnowledgeAdapter {
    async fn store(&self, text: &str) -> Result<(), KnowledgeError> {
        self.inner.lock().entries.push(text.to_string());
        Ok(())
    }

    async fn find(&self, query: &str, limit: usize) -> Result<Vec<Match>, KnowledgeError> {
        let state = self.inner.lock();
        let matches = state
            .entries
            .iter()
            .rev()
            .filter(|entry| entry.contains(query))
            .take(limit)
            .map(|entry| (entry.clone(), 1.0))
            .collect();
        Ok(matches)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
