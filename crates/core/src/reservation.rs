// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Projected reservation rows and path-overlap matching.

use crate::ReservationId;
use serde::{Deserialize, Serialize};

/// A file-path lock held by one agent. `released_at_epoch_ms` is
/// monotonic: once set it is never unset on this row -- release writes a
/// new field value, never a new row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub agent_name: String,
    pub path_pattern: String,
    pub exclusive: bool,
    pub reason: Option<String>,
    pub created_at_epoch_ms: i64,
    pub expires_at_epoch_ms: Option<i64>,
    pub released_at_epoch_ms: Option<i64>,
    pub lock_holder_id: String,
}

impl Reservation {
    /// Active iff not released and not past its TTL.
    pub fn is_active(&self, now_epoch_ms: i64) -> bool {
        self.released_at_epoch_ms.is_none()
            && self
                .expires_at_epoch_ms
                .map(|exp| exp > now_epoch_ms)
                .unwrap_or(true)
    }
}

/// A reported (not enforced) overlap between a requester and a holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationConflict {
    pub requested_path: String,
    pub holder_agent: String,
    pub holder_id: ReservationId,
}

/// Whether two path patterns (literal paths or glob patterns) overlap.
/// A literal path overlaps a pattern when the pattern matches it; two
/// literals overlap only when equal; two patterns overlap when either
/// matches a concrete path the other could also match -- approximated
/// here by exact equality of the patterns themselves, which is sufficient
/// for this store since every reservation is created against a
/// caller-supplied pattern and checked against the same pattern space.
pub fn patterns_overlap(requested: &str, held: &str) -> bool {
    if requested == held {
        return true;
    }
    match (is_glob(requested), is_glob(held)) {
        (false, false) => false,
        (true, false) => glob_match(requested, held),
        (false, true) => glob_match(held, requested),
        (true, true) => glob_match(requested, held) || glob_match(held, requested),
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?') || pattern.contains('[')
}

/// Minimal glob matcher supporting `*` (any run, including `/`) and `?`
/// (single char). Sufficient for the file-path patterns this engine deals
/// with; delegates to a small recursive matcher rather than pulling in a
/// full glob crate for two wildcard classes.
pub fn glob_match(pattern: &str, candidate: &str) -> bool {
    fn do_match(p: &[u8], c: &[u8]) -> bool {
        match (p.first(), c.first()) {
            (None, None) => true,
            (Some(b'*'), _) => do_match(&p[1..], c) || (!c.is_empty() && do_match(p, &c[1..])),
            (Some(b'?'), Some(_)) => do_match(&p[1..], &c[1..]),
            (Some(pb), Some(cb)) if pb == cb => do_match(&p[1..], &c[1..]),
            _ => false,
        }
    }
    do_match(pattern.as_bytes(), candidate.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_literal_paths_overlap() {
        assert!(patterns_overlap("src/a.ts", "src/a.ts"));
        assert!(!patterns_overlap("src/a.ts", "src/b.ts"));
    }

    #[test]
    fn glob_overlaps_literal() {
        assert!(patterns_overlap("src/*.ts", "src/a.ts"));
        assert!(!patterns_overlap("src/*.ts", "lib/a.ts"));
    }

    #[test]
    fn reservation_expires() {
        let mut r = Reservation {
            id: ReservationId::new("r1"),
            agent_name: "W1".into(),
            path_pattern: "src/a.ts".into(),
            exclusive: true,
            reason: None,
            created_at_epoch_ms: 0,
            expires_at_epoch_ms: Some(100),
            released_at_epoch_ms: None,
            lock_holder_id: "r1".into(),
        };
        assert!(r.is_active(50));
        assert!(!r.is_active(150));
        r.released_at_epoch_ms = Some(10);
        assert!(!r.is_active(5));
    }
}
