// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::manager::ManagerConfig;
use std::time::Duration;
use swl_adapters::FakeLiveness;
use swl_core::{LockType, Outcome, SystemClock, TicketState};
use swl_storage::MemoryStore;

const SWEEP: Duration = Duration::from_secs(5);

fn spawn_service(
    liveness: &FakeLiveness,
    store: &MemoryStore,
) -> (LockService, JoinHandle<()>) {
    let manager = LockManager::new(
        liveness.clone(),
        store.clone(),
        SystemClock,
        ManagerConfig {
            sweep_interval: SWEEP,
        },
    );
    LockService::spawn(manager, 16)
}

#[tokio::test(start_paused = true)]
async fn grants_free_lock_and_persists_it() {
    let liveness = FakeLiveness::with_alive(["X1"]);
    let store = MemoryStore::new();
    let (service, _task) = spawn_service(&liveness, &store);

    let ticket = service
        .submit(LockRequest::exclusive("a", "X1", "ctx"))
        .await
        .unwrap();

    assert_eq!(ticket.wait().await, Some(Outcome::Granted));
    assert!(store.contains("a"));
}

#[tokio::test(start_paused = true)]
async fn queued_request_is_granted_after_release() {
    let liveness = FakeLiveness::with_alive(["X1", "X2"]);
    let store = MemoryStore::new();
    let (service, _task) = spawn_service(&liveness, &store);

    service
        .submit(LockRequest::exclusive("a", "X1", "ctx"))
        .await
        .unwrap();
    let mut waiting = service
        .submit(LockRequest::shared("a", "X2", "ctx"))
        .await
        .unwrap();
    assert_eq!(waiting.poll_state(), TicketState::Pending);

    let released = service
        .submit(LockRequest::release("a", "X1", "ctx"))
        .await
        .unwrap();

    assert_eq!(released.wait().await, Some(Outcome::Released));
    assert_eq!(waiting.wait().await, Some(Outcome::Granted));

    let snapshot = service.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].lock_type, LockType::Shared);
}

#[tokio::test(start_paused = true)]
async fn sweep_reclaims_lock_after_interval() {
    let liveness = FakeLiveness::with_alive(["X1", "X2"]);
    let store = MemoryStore::new();
    let (service, _task) = spawn_service(&liveness, &store);

    service
        .submit(LockRequest::exclusive("c", "X1", "ctx"))
        .await
        .unwrap();
    let waiting = service
        .submit(LockRequest::exclusive("c", "X2", "ctx"))
        .await
        .unwrap();

    let started = tokio::time::Instant::now();
    liveness.kill("X1");

    assert_eq!(waiting.wait().await, Some(Outcome::Granted));
    assert!(started.elapsed() >= SWEEP);

    let snapshot = service.snapshot().await.unwrap();
    assert_eq!(snapshot[0].holders.len(), 1);
    assert_eq!(snapshot[0].holders[0].context_group(), "X2");
}

#[tokio::test(start_paused = true)]
async fn uncontended_lock_is_not_swept() {
    let liveness = FakeLiveness::with_alive(["X1"]);
    let store = MemoryStore::new();
    let (service, _task) = spawn_service(&liveness, &store);

    service
        .submit(LockRequest::exclusive("a", "X1", "ctx"))
        .await
        .unwrap();
    let queries = liveness.queries();

    tokio::time::sleep(SWEEP * 3).await;

    assert_eq!(liveness.queries(), queries);
    assert!(store.contains("a"));
}

#[tokio::test(start_paused = true)]
async fn invalid_request_is_rejected() {
    let liveness = FakeLiveness::with_alive(["X1"]);
    let store = MemoryStore::new();
    let (service, _task) = spawn_service(&liveness, &store);

    let result = service.submit(LockRequest::exclusive("", "X1", "ctx")).await;

    assert!(matches!(result, Err(LockError::InvalidRequest(_))));
    assert!(service.snapshot().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn evaluation_failure_still_returns_ticket() {
    let liveness = FakeLiveness::with_alive(["X1"]);
    let store = MemoryStore::new();
    let (service, _task) = spawn_service(&liveness, &store);

    // Let bootstrap consume a healthy load first
    service
        .submit(LockRequest::release("warmup", "X1", "ctx"))
        .await
        .unwrap();
    store.fail_next("disk full");

    let ticket = service
        .submit(LockRequest::exclusive("a", "X1", "ctx"))
        .await
        .unwrap();

    assert_eq!(ticket.wait().await, Some(Outcome::Granted));
    assert!(!store.contains("a"));
}

#[tokio::test(start_paused = true)]
async fn shutdown_drops_pending_tickets() {
    let liveness = FakeLiveness::with_alive(["X1", "X2"]);
    let store = MemoryStore::new();
    let (service, task) = spawn_service(&liveness, &store);

    service
        .submit(LockRequest::exclusive("a", "X1", "ctx"))
        .await
        .unwrap();
    let waiting = service
        .submit(LockRequest::exclusive("a", "X2", "ctx"))
        .await
        .unwrap();

    service.shutdown().await.unwrap();
    task.await.unwrap();

    assert_eq!(waiting.wait().await, None);
    assert!(matches!(
        service.submit(LockRequest::release("a", "X1", "ctx")).await,
        Err(LockError::ServiceStopped)
    ));
}

#[tokio::test(start_paused = true)]
async fn concurrent_exclusive_requests_are_serialized() {
    let groups: Vec<String> = (0..8).map(|i| format!("X{i}")).collect();
    let liveness = FakeLiveness::with_alive(groups.clone());
    let store = MemoryStore::new();
    let (service, _task) = spawn_service(&liveness, &store);

    let mut handles = Vec::new();
    for group in groups {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let ticket = service
                .submit(LockRequest::exclusive("shared-name", group.as_str(), "ctx"))
                .await
                .unwrap();
            let outcome = ticket.wait().await;
            let snapshot = service.snapshot().await.unwrap();
            assert_eq!(snapshot[0].holders.len(), 1);
            assert_eq!(snapshot[0].holders[0].context_group(), group);
            service
                .submit(LockRequest::release("shared-name", group.as_str(), "ctx"))
                .await
                .unwrap();
            outcome
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Some(Outcome::Granted));
    }
    assert!(service.snapshot().await.unwrap().is_empty());
    assert!(!store.contains("shared-name"));
}
