// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O

pub mod agent;
mod env;
pub mod knowledge;
pub mod notify;
pub mod session;
pub mod subprocess;
pub mod traced;
pub mod verification;

pub use agent::{
    extract_process_name, AgentAdapter, AgentAdapterError, AgentHandle, AgentReconnectConfig,
    AgentSpawnConfig, ClaudeAgentAdapter,
};
pub use knowledge::{KnowledgeAdapter, KnowledgeError, Match, NoOpKnowledgeAdapter};
pub use notify::{DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter};
pub use session::{NoOpSessionAdapter, SessionAdapter, TmuxAdapter};
pub use traced::{TracedAgent, TracedSession};
pub use verification::{NoOpVerificationAdapter, TypecheckReport, VerificationAdapter, VerificationError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use agent::{AgentCall, FakeAgentAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use knowledge::FakeKnowledgeAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use session::{FakeSession, FakeSessionAdapter, SessionCall};
#[cfg(any(test, feature = "test-support"))]
pub use verification::{FakeVerificationAdapter, VerifyCall};
