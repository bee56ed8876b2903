// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn attached_group_is_alive() {
    let registry = ContextRegistry::new();
    let _attachment = registry.attach("client-1");

    let alive = registry.alive_context_groups().await.unwrap();

    assert!(alive.contains("client-1"));
    assert!(registry.is_alive("client-1"));
}

#[tokio::test]
async fn dropping_attachment_kills_group() {
    let registry = ContextRegistry::new();
    let attachment = registry.attach("client-1");
    drop(attachment);

    let alive = registry.alive_context_groups().await.unwrap();

    assert!(alive.is_empty());
    assert!(registry.is_empty());
}

#[test]
fn group_survives_until_last_attachment_drops() {
    let registry = ContextRegistry::new();
    let first = registry.attach("client-1");
    let second = registry.attach("client-1");
    assert_eq!(registry.len(), 1);

    drop(first);
    assert!(registry.is_alive("client-1"));

    drop(second);
    assert!(!registry.is_alive("client-1"));
}

#[test]
fn clones_share_state() {
    let registry = ContextRegistry::new();
    let other = registry.clone();
    let attachment = other.attach("client-2");

    assert!(registry.is_alive("client-2"));
    assert_eq!(attachment.context_group(), "client-2");
}
