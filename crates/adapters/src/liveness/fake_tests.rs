// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_reports_scripted_alive_set() {
    let fake = FakeLiveness::with_alive(["a", "b"]);
    fake.kill("a");
    fake.revive("c");

    let alive = fake.alive_context_groups().await.unwrap();

    assert_eq!(alive, HashSet::from(["b".to_string(), "c".to_string()]));
    assert_eq!(fake.queries(), 1);
}

#[tokio::test]
async fn fake_fails_once_when_scripted() {
    let fake = FakeLiveness::with_alive(["a"]);
    fake.fail_next("offline");

    assert!(matches!(
        fake.alive_context_groups().await,
        Err(LivenessError::QueryFailed(msg)) if msg == "offline"
    ));
    assert!(fake.alive_context_groups().await.is_ok());
    assert_eq!(fake.queries(), 2);
}
