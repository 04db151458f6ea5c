// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sw_core::{Clock, FakeClock};

#[test]
fn scheduler_timer_lifecycle() {
    let clock = FakeClock::new();
    let mut scheduler = Scheduler::new();

    scheduler.set_timer("test".to_string(), Duration::from_secs(10), clock.now());
    assert!(scheduler.has_timers());
    assert!(scheduler.next_deadline().is_some());

    clock.advance(Duration::from_secs(5));
    let fired = scheduler.fired_timers(clock.now());
    assert!(fired.is_empty());
    assert!(scheduler.has_timers());

    clock.advance(Duration::from_secs(10));
    let fired = scheduler.fired_timers(clock.now());
    assert_eq!(fired, vec!["test".to_string()]);
    assert!(!scheduler.has_timers());
}

#[test]
fn scheduler_cancel_timer() {
    let clock = FakeClock::new();
    let mut scheduler = Scheduler::new();

    scheduler.set_timer("test".to_string(), Duration::from_secs(10), clock.now());
    scheduler.cancel_timer("test");

    clock.advance(Duration::from_secs(15));
    let fired = scheduler.fired_timers(clock.now());
    assert!(fired.is_empty());
}

#[test]
fn scheduler_multiple_timers_fire_independently() {
    let clock = FakeClock::new();
    let mut scheduler = Scheduler::new();

    scheduler.set_timer("fast".to_string(), Duration::from_secs(5), clock.now());
    scheduler.set_timer("slow".to_string(), Duration::from_secs(20), clock.now());

    clock.advance(Duration::from_secs(6));
    let fired = scheduler.fired_timers(clock.now());
    assert_eq!(fired, vec!["fast".to_string()]);
    assert!(scheduler.has_timers(), "slow timer should still be pending");

    clock.advance(Duration::from_secs(15));
    let fired = scheduler.fired_timers(clock.now());
    assert_eq!(fired, vec!["slow".to_string()]);
    assert!(!scheduler.has_timers());
}

#[test]
fn scheduler_next_deadline_returns_earliest() {
    let clock = FakeClock::new();
    let mut scheduler = Scheduler::new();

    scheduler.set_timer("later".to_string(), Duration::from_secs(30), clock.now());
    scheduler.set_timer("sooner".to_string(), Duration::from_secs(10), clock.now());

    let deadline = scheduler.next_deadline().unwrap();
    let expected = clock.now() + Duration::from_secs(10);
    assert_eq!(deadline, expected);
}

#[test]
fn scheduler_overwrite_timer_resets_deadline() {
    let clock = FakeClock::new();
    let mut scheduler = Scheduler::new();

    scheduler.set_timer("t".to_string(), Duration::from_secs(10), clock.now());

    clock.advance(Duration::from_secs(2));
    scheduler.set_timer("t".to_string(), Duration::from_secs(20), clock.now());

    clock.advance(Duration::from_secs(9));
    let fired = scheduler.fired_timers(clock.now());
    assert!(fired.is_empty(), "old timer deadline should be overwritten");

    clock.advance(Duration::from_secs(12));
    let fired = scheduler.fired_timers(clock.now());
    assert_eq!(fired, vec!["t".to_string()]);
}

#[test]
fn scheduler_empty_has_no_deadline() {
    let scheduler = Scheduler::new();
    assert!(!scheduler.has_timers());
    assert!(scheduler.next_deadline().is_none());
}

#[test]
fn scheduler_fired_timers_removes_only_expired() {
    let clock = FakeClock::new();
    let mut scheduler = Scheduler::new();

    scheduler.set_timer("a".to_string(), Duration::from_secs(5), clock.now());
    scheduler.set_timer("b".to_string(), Duration::from_secs(10), clock.now());
    scheduler.set_timer("c".to_string(), Duration::from_secs(15), clock.now());

    clock.advance(Duration::from_secs(11));
    let mut fired = scheduler.fired_timers(clock.now());
    fired.sort();
    assert_eq!(fired, vec!["a".to_string(), "b".to_string()]);
    assert!(scheduler.has_timers(), "timer c should still be pending");

    clock.advance(Duration::from_secs(5));
    let fired = scheduler.fired_timers(clock.now());
    assert_eq!(fired, vec!["c".to_string()]);
}
