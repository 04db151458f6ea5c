// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-agent coordination daemon library.
//!
//! This module exposes the IPC protocol types for use by CLI clients, plus
//! the daemon's lifecycle, registry, and transport modules.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod http;
pub mod lifecycle;
pub mod listener;
pub mod protocol;
pub mod registry;

pub use protocol::{
    Query, Request, Response, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};
pub use registry::Registry;
