// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Verification adapters.
//!
//! `verify(files)` is an external collaborator referenced only by interface
//! contract: a worker's typecheck + per-file test discovery step runs
//! outside this process (the worker's own toolchain knows how to typecheck
//! and enumerate tests for its language). This module only fixes the shape
//! of that contract so a coordinator can be built against it without
//! depending on any particular language toolchain.

mod noop;

pub use noop::NoOpVerificationAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeVerificationAdapter, VerifyCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from verification operations
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("typecheck failed: {0}")]
    TypecheckFailed(String),
    #[error("test discovery failed: {0}")]
    DiscoveryFailed(String),
}

/// Typecheck outcome for a set of changed files.
#[derive(Debug, Clone, Default)]
pub struct TypecheckReport {
    pub ok: bool,
    /// Human-readable diagnostics, one per error/warning.
    pub diagnostics: Vec<String>,
}

/// Adapter for verifying a worker's changes before they reach the review
/// gate: does the code typecheck, and which tests touch the changed files.
#[async_trait]
pub trait VerificationAdapter: Clone + Send + Sync + 'static {
    /// Typecheck the given changed files.
    async fn typecheck(&self, files: &[&Path]) -> Result<TypecheckReport, VerificationError>;

    /// Discover tests relevant to a single changed file.
    async fn discover_tests(&self, file: &Path) -> Result<Vec<String>, VerificationError>;
}
