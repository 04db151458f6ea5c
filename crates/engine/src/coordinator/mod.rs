// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator: one `Wal` + `MaterializedState` pair per project, guarded
//! by a single `parking_lot::Mutex` so append and projection update commit
//! together (mirrors the teacher's `Runtime::lock_state`).

mod agents;
mod analytics;
mod cells;
mod deferred;
mod guardrail;
mod messages;
mod reservations;
mod worker;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use reservations::{ReserveOptions, ReserveOutcome};
pub use worker::CompletionOutcome;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use sw_core::{Clock, Event, IdGen, SystemClock, UuidIdGen};
use sw_storage::{Checkpointer, MaterializedState, Wal};
use tokio::sync::broadcast;

use crate::error::CoordinatorError;

/// Number of appended events between automatic background checkpoints.
const CHECKPOINT_EVERY: u64 = 500;

/// Backlog retained by the live-fan-out broadcast channel; a subscriber
/// more than this many events behind the writer sees `Lagged` and must
/// fall back to replaying the WAL by sequence.
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// One sequenced event as delivered to live-fan-out subscribers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SequencedEvent {
    pub seq: u64,
    pub event: Event,
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
    events_since_checkpoint: u64,
}

/// One coordinator instance per project. Owns the storage pair and exposes
/// the coordination-substrate operations (agents, messages, reservations,
/// cells, deferred, worker lifecycle, guardrail) as inherent methods spread
/// across this module's siblings.
pub struct Coordinator<C: Clock = SystemClock> {
    project_key: String,
    state_dir: PathBuf,
    clock: C,
    id_gen: Arc<dyn IdGen>,
    checkpointer: Checkpointer,
    inner: Mutex<Inner>,
    events_tx: broadcast::Sender<SequencedEvent>,
}

impl Coordinator<SystemClock> {
    /// Open (or create) the coordinator storage for `project_key` under
    /// `state_dir`, using the real system clock.
    pub fn open(state_dir: &Path, project_key: impl Into<String>) -> Result<Self, CoordinatorError> {
        Self::open_with_clock(state_dir, project_key, SystemClock::new())
    }
}

impl<C: Clock> Coordinator<C> {
    pub fn open_with_clock(
        state_dir: &Path,
        project_key: impl Into<String>,
        clock: C,
    ) -> Result<Self, CoordinatorError> {
        let project_key = project_key.into();
        let project_dir = state_dir.join(&project_key);
        std::fs::create_dir_all(&project_dir).map_err(sw_storage::WalError::Io)?;

        let snapshot_path = project_dir.join("snapshot.zst");
        let wal_path = project_dir.join("wal.jsonl");

        let snapshot = sw_storage::load_snapshot(&snapshot_path)?;
        let (mut state, processed_seq) = match snapshot {
            Some(snap) => (snap.state, snap.seq),
            None => (MaterializedState::new(), 0),
        };

        let mut wal = Wal::open(&wal_path, processed_seq)?;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }

        let checkpointer = Checkpointer::new(snapshot_path);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            project_key,
            state_dir: project_dir,
            clock,
            id_gen: Arc::new(UuidIdGen),
            checkpointer,
            inner: Mutex::new(Inner {
                wal,
                state,
                events_since_checkpoint: 0,
            }),
            events_tx,
        })
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now_epoch_ms(&self) -> i64 {
        // The epoch timestamp carried on every event; distinct from the
        // monotonic Clock used for timers/TTL backoff.
        chrono::Utc::now().timestamp_millis()
    }

    pub(crate) fn next_id(&self) -> String {
        self.id_gen.next()
    }

    /// Append `event` to the WAL and fold it into the projection under one
    /// lock, exactly the way the teacher commits an insert-event and a
    /// projection update together. Returns the assigned sequence.
    pub(crate) fn append(&self, event: Event) -> Result<u64, CoordinatorError> {
        let mut inner = self.inner.lock();
        let seq = inner.wal.append(&event)?;
        inner.state.apply_event(&event);
        inner.wal.mark_processed(seq);
        if inner.wal.needs_flush() {
            inner.wal.flush()?;
        }
        inner.events_since_checkpoint += 1;
        if inner.events_since_checkpoint >= CHECKPOINT_EVERY {
            inner.wal.flush()?;
            let handle = self.checkpointer.start(seq, &inner.state);
            inner.events_since_checkpoint = 0;
            // Checkpointing runs off-thread; we don't block the writer on
            // it, but we do need the handle to outlive this call, so detach
            // it by waiting in the background via a dedicated thread join
            // is unnecessary here -- dropping the handle still lets the
            // background thread finish, it just means we don't observe
            // errors. Acceptable for a best-effort periodic checkpoint.
            drop(handle);
        }
        // No subscribers is the common case (no live-fan-out client
        // connected); a send error there is expected, not a failure.
        let _ = self.events_tx.send(SequencedEvent { seq, event });
        Ok(seq)
    }

    /// Subscribe to the live append stream for the Live Fan-out Server.
    /// A lagging subscriber should fetch its backlog from `entries_after`
    /// instead of trusting the channel to replay history.
    pub fn subscribe(&self) -> broadcast::Receiver<SequencedEvent> {
        self.events_tx.subscribe()
    }

    /// Events appended after `offset`, for a subscriber's backlog catch-up.
    pub fn entries_after(&self, offset: u64) -> Result<Vec<SequencedEvent>, CoordinatorError> {
        let inner = self.inner.lock();
        Ok(inner
            .wal
            .entries_after(offset)?
            .into_iter()
            .map(|entry| SequencedEvent { seq: entry.seq, event: entry.event })
            .collect())
    }

    /// Read-only access to the projection under the same lock used for
    /// writes; callers must not hold this across an `.await`.
    pub fn with_state<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> R {
        let inner = self.inner.lock();
        f(&inner.state)
    }

    /// Force a synchronous checkpoint (used at graceful shutdown).
    pub fn checkpoint_now(&self) -> Result<(), CoordinatorError> {
        let mut inner = self.inner.lock();
        let seq = inner.wal.processed_seq();
        inner.wal.flush()?;
        self.checkpointer.checkpoint_sync(seq, &inner.state)?;
        inner.events_since_checkpoint = 0;
        Ok(())
    }
}
