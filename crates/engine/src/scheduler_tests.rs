// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use swl_core::{Clock, FakeClock};

#[test]
fn sweeps_fire_in_deadline_order() {
    let clock = FakeClock::new();
    let mut scheduler = SweepScheduler::new();
    let now = clock.now();

    scheduler.arm("late", now + Duration::from_secs(10));
    scheduler.arm("early", now + Duration::from_secs(5));

    assert!(scheduler.take_due(now).is_empty());
    assert_eq!(scheduler.next_deadline(), Some(now + Duration::from_secs(5)));

    clock.advance(Duration::from_secs(7));
    assert_eq!(scheduler.take_due(clock.now()), vec!["early"]);

    clock.advance(Duration::from_secs(5));
    assert_eq!(scheduler.take_due(clock.now()), vec!["late"]);
    assert!(scheduler.is_empty());
}

#[test]
fn cancelled_sweep_never_fires() {
    let clock = FakeClock::new();
    let mut scheduler = SweepScheduler::new();
    scheduler.arm("db", clock.now() + Duration::from_secs(5));

    assert!(scheduler.cancel("db"));
    assert!(!scheduler.cancel("db"));

    clock.advance(Duration::from_secs(10));
    assert!(scheduler.take_due(clock.now()).is_empty());
    assert_eq!(scheduler.next_deadline(), None);
}

#[test]
fn rearming_replaces_previous_deadline() {
    let clock = FakeClock::new();
    let mut scheduler = SweepScheduler::new();
    let now = clock.now();

    scheduler.arm("db", now + Duration::from_secs(5));
    scheduler.cancel("db");
    scheduler.arm("db", now + Duration::from_secs(8));

    assert_eq!(scheduler.next_deadline(), Some(now + Duration::from_secs(8)));
    assert_eq!(scheduler.len(), 1);

    clock.advance(Duration::from_secs(6));
    assert!(scheduler.take_due(clock.now()).is_empty());
    assert!(scheduler.is_armed("db"));

    clock.advance(Duration::from_secs(2));
    assert_eq!(scheduler.take_due(clock.now()), vec!["db"]);
    assert!(!scheduler.is_armed("db"));
}
