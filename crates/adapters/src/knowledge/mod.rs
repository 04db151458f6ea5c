// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Knowledge store adapters.
//!
//! The semantic memory / vector-search store is an external collaborator
//! referenced only by interface contract (`store(text)` / `find(query)`).
//! This module fixes that contract so the coordinator can accept findings
//! and answer lookups without depending on any particular embedding or
//! vector-index implementation.

mod noop;

pub use noop::NoOpKnowledgeAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeKnowledgeAdapter;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from knowledge store operations
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("store failed: {0}")]
    StoreFailed(String),
    #[error("lookup failed: {0}")]
    LookupFailed(String),
}

/// A single match returned by `find`: the stored text and a relevance score.
pub type Match = (String, f32);

/// Adapter over an opaque semantic memory store.
#[async_trait]
pub trait KnowledgeAdapter: Clone + Send + Sync + 'static {
    /// Record a piece of text in the store.
    async fn store(&self, text: &str) -> Result<(), KnowledgeError>;

    /// Find the `limit` most relevant stored entries for `query`.
    async fn find(&self, query: &str, limit: usize) -> Result<Vec<Match>, KnowledgeError>;
}
