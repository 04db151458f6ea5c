// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake verification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{TypecheckReport, VerificationAdapter, VerificationError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded verification call
#[derive(Debug, Clone)]
pub enum VerifyCall {
    Typecheck(Vec<PathBuf>),
    DiscoverTests(PathBuf),
}

struct FakeVerificationState {
    calls: Vec<VerifyCall>,
    report: TypecheckReport,
    tests: Vec<String>,
}

/// Fake verification adapter for testing: returns a configured report and
/// test list, recording every call made against it.
#[derive(Clone)]
pub struct FakeVerificationAdapter {
    inner: Arc<Mutex<FakeVerificationState>>,
}

impl Default for FakeVerificationAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeVerificationState {
                calls: Vec::new(),
                report: TypecheckReport {
                    ok: true,
                    diagnostics: Vec::new(),
                },
                tests: Vec::new(),
            })),
        }
    }
}

impl FakeVerificationAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the typecheck report returned by subsequent calls.
    pub fn set_report(&self, report: TypecheckReport) {
        self.inner.lock().report = report;
    }

    /// Configure the test list returned by subsequent `discover_tests` calls.
    pub fn set_tests(&self, tests: Vec<String>) {
        self.inner.lock().tests = tests;
    }

    pub fn calls(&self) -> Vec<VerifyCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl VerificationAdapter for FakeVerificationAdapter {
    async fn typecheck(&self, files: &[&Path]) -> Result<TypecheckReport, VerificationError> {
        let mut state = self.inner.lock();
        state
            .calls
            .push(VerifyCall::Typecheck(files.iter().map(|p| p.to_path_buf()).collect()));
        Ok(state.report.clone())
    }

    async fn discover_tests(&self, file: &Path) -> Result<Vec<String>, VerificationError> {
        let mut state = self.inner.lock();
        state.calls.push(VerifyCall::DiscoverTests(file.to_path_buf()));
        Ok(state.tests.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
