// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::BTreeSet;
use swl_core::LockType;

fn record() -> LockRecord {
    LockRecord {
        lock_type: LockType::Exclusive,
        holders: BTreeSet::from(["c1%swl%a".to_string()]),
    }
}

#[tokio::test]
async fn memory_store_records_calls() {
    let store = MemoryStore::new();

    store.put("db", &record()).await.unwrap();
    store.delete("db").await.unwrap();

    assert!(store.is_empty());
    assert_eq!(
        store.calls(),
        vec![
            StoreCall::Put {
                name: "db".to_string(),
                record: record(),
            },
            StoreCall::Delete {
                name: "db".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn seeded_records_are_loaded() {
    let store = MemoryStore::new();
    store.insert("db", record());

    let all = store.load_all().await.unwrap();

    assert_eq!(all, vec![("db".to_string(), record())]);
    assert_eq!(store.calls(), vec![StoreCall::LoadAll]);
}

#[tokio::test]
async fn scripted_failure_leaves_records_untouched() {
    let store = MemoryStore::new();
    store.fail_next("disk full");

    let result = store.put("db", &record()).await;

    assert!(matches!(result, Err(StoreError::Unavailable(msg)) if msg == "disk full"));
    assert!(!store.contains("db"));
    store.put("db", &record()).await.unwrap();
    assert_eq!(store.get("db"), Some(record()));
}
