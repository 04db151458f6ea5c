// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn noop_store_returns_ok() {
    let adapter = NoOpKnowledgeAdapter::new();
    assert!(adapter.store("some finding").await.is_ok());
}

#[tokio::test]
async fn noop_find_returns_empty() {
    let adapter = NoOpKnowledgeAdapter::default();
    let matches = adapter.find("query", 5).await.unwrap();
    assert!(matches.is_empty());
}
