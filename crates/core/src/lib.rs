// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-core: data model and event vocabulary for the coordination substrate.

pub mod agent;
pub mod cell;
pub mod clock;
pub mod coordinator;
pub mod cursor;
pub mod deferred;
pub mod error;
pub mod event;
pub mod id;
pub mod ids;
pub mod message;
pub mod namespace;
pub mod reservation;
pub mod review;
pub mod time_fmt;
pub mod worker;

pub use agent::Agent;
pub use cell::{Cell, CellDependency, MAX_PRIORITY, MAX_TITLE_LEN};
pub use clock::{Clock, FakeClock, SystemClock};
pub use coordinator::CoordinatorContext;
pub use cursor::Cursor;
pub use deferred::{AwaitOutcome, Deferred};
pub use error::{ClassifiedError, ErrorEnvelope, ErrorKind};
pub use event::{
    CellStatus, CellType, ConflictResolution, CoordinatorDecisionKind, DependencyRelationship,
    Event, Importance, ReviewVerdict,
};
pub use id::{IdGen, SequentialIdGen, ShortId, UuidIdGen};
pub use ids::{CellId, DeferredId, EventId, MessageId, ReservationId, ThreadId, WorkerId};
pub use message::{
    classify_subject, clamp_inbox_limit, is_broadcast, InboxEntry, Message, MessageRecipient,
    ThreadActivity,
};
pub use namespace::{resolve_namespace, scoped_name, split_scoped_name, Namespace};
pub use reservation::{glob_match, patterns_overlap, Reservation, ReservationConflict};
pub use review::{ReviewStatus, MAX_ATTEMPTS};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
pub use worker::{RetryContext, SubtaskPrompt, WorkerPhase, WorkerRecord};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
