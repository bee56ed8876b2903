// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn encode_joins_with_separator() {
    let key = HolderKey::new("client-1", "ctx-a");
    assert_eq!(key.encode(), "client-1%swl%ctx-a");
}

#[parameterized(
    simple = { "client-1%swl%ctx-a", "client-1", "ctx-a" },
    empty_sub_context = { "client-1%swl%", "client-1", "" },
    empty_context_group = { "%swl%ctx-a", "", "ctx-a" },
    separator_in_sub_context = { "client-1%swl%ctx%swl%b", "client-1", "ctx%swl%b" },
    percent_in_group = { "client%1%swl%ctx", "client%1", "ctx" },
)]
fn decode_splits_on_first_separator(encoded: &str, group: &str, sub: &str) {
    let key: HolderKey = encoded.parse().unwrap();
    assert_eq!(key.context_group(), group);
    assert_eq!(key.sub_context(), sub);
}

#[test]
fn decode_without_separator_fails() {
    let result = "client-1:ctx-a".parse::<HolderKey>();
    assert_eq!(
        result,
        Err(HolderKeyError::MissingSeparator("client-1:ctx-a".to_string()))
    );
}

#[test]
fn serializes_as_encoded_string() {
    let key = HolderKey::new("client-1", "ctx-a");
    let json = serde_json::to_string(&key).unwrap();
    assert_eq!(json, "\"client-1%swl%ctx-a\"");

    let back: HolderKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, key);
}

#[test]
fn deserialize_rejects_malformed_key() {
    let result = serde_json::from_str::<HolderKey>("\"no-separator\"");
    assert!(result.is_err());
}
