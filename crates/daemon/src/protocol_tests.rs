// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol unit tests

use super::*;
use swl_core::HolderKey;

#[test]
fn encode_decode_roundtrip_request() {
    let request = Request::Lock {
        id: 7,
        name: "db".to_string(),
        kind: RequestKind::Exclusive,
        sub_context: "tab-1".to_string(),
    };

    let encoded = encode(&request).expect("encode failed");
    let decoded: Request = decode(&encoded).expect("decode failed");

    assert_eq!(request, decoded);
}

#[test]
fn encode_decode_roundtrip_response() {
    let response = Response::Status {
        locks: vec![LockSummary {
            name: "db".to_string(),
            lock_type: LockType::Shared,
            holders: vec!["X1%swl%a".to_string(), "X2%swl%b".to_string()],
            waiting: 2,
        }],
        contexts: 3,
        sweep_interval_ms: 5000,
    };

    let encoded = encode(&response).expect("encode failed");
    let decoded: Response = decode(&encoded).expect("decode failed");

    assert_eq!(response, decoded);
}

#[test]
fn lock_request_wire_format() {
    let request: Request = decode(
        br#"{"msg":"lock","id":1,"name":"db","type":"shared","sub_context":"s"}"#,
    )
    .expect("decode failed");

    assert_eq!(
        request,
        Request::Lock {
            id: 1,
            name: "db".to_string(),
            kind: RequestKind::Shared,
            sub_context: "s".to_string(),
        }
    );
}

#[yare::parameterized(
    missing = { r#"{"msg":"lock","id":1,"name":"db"}"# },
    null    = { r#"{"msg":"lock","id":1,"name":"db","type":null}"# },
    empty   = { r#"{"msg":"lock","id":1,"name":"db","type":""}"# },
)]
fn lock_request_without_type_is_release(json: &str) {
    let request: Request = decode(json.as_bytes()).expect("decode failed");

    match request {
        Request::Lock {
            kind, sub_context, ..
        } => {
            assert_eq!(kind, RequestKind::Release);
            assert_eq!(sub_context, "");
        }
        other => panic!("Expected Lock request, got {:?}", other),
    }
}

#[test]
fn unknown_lock_type_is_rejected() {
    let result: Result<Request, _> =
        decode(br#"{"msg":"lock","id":1,"name":"db","type":"upgrade"}"#);

    assert!(matches!(result, Err(ProtocolError::Json(_))));
}

#[test]
fn hello_context_group_is_optional() {
    let request: Request = decode(br#"{"msg":"hello"}"#).expect("decode failed");
    assert_eq!(request, Request::Hello { context_group: None });

    let encoded = encode(&Request::Hello { context_group: None }).expect("encode failed");
    assert_eq!(encoded, br#"{"msg":"hello"}"#);
}

#[test]
fn done_response_carries_outcome() {
    let encoded = encode(&Response::Done {
        id: 4,
        outcome: Outcome::Abandoned,
    })
    .expect("encode failed");

    let json = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert_eq!(json, r#"{"msg":"done","id":4,"outcome":"abandoned"}"#);
}

#[yare::parameterized(
    with_id    = { Some(9) },
    without_id = { None },
)]
fn error_response_roundtrip(id: Option<u64>) {
    let response = Response::Error {
        id,
        message: "lock name must not be empty".to_string(),
    };

    let encoded = encode(&response).expect("encode failed");
    let decoded: Response = decode(&encoded).expect("decode failed");

    assert_eq!(response, decoded);
}

#[test]
fn error_response_keeps_message_field() {
    let encoded = encode(&Response::Error {
        id: Some(2),
        message: "boom".to_string(),
    })
    .expect("encode failed");

    let json = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert_eq!(json, r#"{"msg":"error","id":2,"message":"boom"}"#);
}

#[yare::parameterized(
    lock        = { br#"{"msg":"lock","id":3,"name":"db","type":"upgrade"}"#.as_slice(), Some(3) },
    no_id       = { br#"{"msg":"lock","name":"db"}"#.as_slice(), None },
    string_id   = { br#"{"msg":"lock","id":"3"}"#.as_slice(), None },
    not_json    = { b"not json".as_slice(), None },
)]
fn request_id_reads_id_from_undecodable_body(body: &[u8], expected: Option<u64>) {
    assert_eq!(request_id(body), expected);
}

#[test]
fn summary_encodes_holder_keys() {
    let summary = LockSummary::from(LockSnapshot {
        name: "db".to_string(),
        lock_type: LockType::Exclusive,
        holders: vec![HolderKey::new("X1", "tab")],
        waiting: 1,
    });

    assert_eq!(summary.holders, vec!["X1%swl%tab".to_string()]);
    assert_eq!(summary.waiting, 1);
}

#[test]
fn encode_returns_json_without_length_prefix() {
    let response = Response::Pong;
    let encoded = encode(&response).expect("encode failed");

    // encode() returns raw JSON, no length prefix
    let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert!(
        json_str.starts_with('{'),
        "should be JSON object: {}",
        json_str
    );
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original)
        .await
        .expect("write failed");

    // write_message adds 4-byte length prefix
    assert_eq!(buffer.len(), 4 + original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");

    assert_eq!(read_back, original);
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data)
        .await
        .expect("write failed");

    // First 4 bytes are the length prefix
    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;

    // Length should match the data size
    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[tokio::test]
async fn read_message_on_empty_stream_is_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::new());

    let result = read_message(&mut cursor).await;

    assert!(matches!(result, Err(ProtocolError::ConnectionClosed)));
}

#[tokio::test]
async fn oversized_prefix_is_rejected() {
    let mut buffer = ((MAX_MESSAGE_SIZE + 1) as u32).to_be_bytes().to_vec();
    buffer.extend_from_slice(b"{}");
    let mut cursor = std::io::Cursor::new(buffer);

    let result = read_message(&mut cursor).await;

    assert!(matches!(result, Err(ProtocolError::MessageTooLarge(_))));
}

#[tokio::test]
async fn request_response_over_duplex() {
    let (mut client, mut server) = tokio::io::duplex(1024);

    write_request(&mut client, &Request::Ping, DEFAULT_TIMEOUT)
        .await
        .expect("write failed");
    let request = read_request(&mut server, DEFAULT_TIMEOUT)
        .await
        .expect("read failed");
    assert_eq!(request, Request::Ping);

    write_response(&mut server, &Response::Pong, DEFAULT_TIMEOUT)
        .await
        .expect("write failed");
    let response = read_response(&mut client, DEFAULT_TIMEOUT)
        .await
        .expect("read failed");
    assert_eq!(response, Response::Pong);
}

#[tokio::test(start_paused = true)]
async fn read_request_times_out() {
    let (_client, mut server) = tokio::io::duplex(64);

    let result = read_request(&mut server, DEFAULT_TIMEOUT).await;

    assert!(matches!(result, Err(ProtocolError::Timeout)));
}
