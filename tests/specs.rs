// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box CLI/daemon suite covering the coordination invariants and
//! scenarios: reservations, review retry, deferred futures, regression
//! detection, messaging, and replay-after-crash.

mod prelude;

#[path = "specs/invariants/messaging.rs"]
mod invariants_messaging;

#[path = "specs/invariants/replay.rs"]
mod invariants_replay;

#[path = "specs/scenarios/reservations.rs"]
mod scenarios_reservations;

#[path = "specs/scenarios/review_gate.rs"]
mod scenarios_review_gate;

#[path = "specs/scenarios/deferred.rs"]
mod scenarios_deferred;

#[path = "specs/scenarios/regression.rs"]
mod scenarios_regression;
