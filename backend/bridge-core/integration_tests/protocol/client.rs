use crate::protocol::helpers::{
    RemoteScript, client_for, closed_port, start_remote, start_watching_remote,
};

use bridge_core::error::{FailureKind, ProtocolError};
use bridge_core::protocol::AssetDataRequest;

use std::time::{Duration, Instant};

use serde_json::json;

const GENEROUS_TIMEOUT: Duration = Duration::from_secs(5);
const SHORT_TIMEOUT: Duration = Duration::from_millis(300);

/// **VALUE**: Verifies the canonical round trip: send code, remote replies and closes.
///
/// **WHY THIS MATTERS**: This is the path every `send-code` call takes. If it breaks, nothing
/// can be executed inside Blender.
///
/// **BUG THIS CATCHES**: Would catch a client that never half-closes (the remote would wait
/// forever for the end of the request) or that mangles the envelope on the wire.
#[tokio::test]
async fn given_remote_replies_and_closes_when_send_code_then_success_with_value() {
    // GIVEN: A remote that answers {"status":"ok"} and closes
    let remote = start_remote(RemoteScript::ReplyAndClose(br#"{"status":"ok"}"#.to_vec())).await;
    let client = client_for(remote.port, GENEROUS_TIMEOUT);

    // WHEN: Sending code
    let value = client.send_code("print(1)").await.expect("Should succeed");

    // THEN: The reply is returned and the remote saw a code envelope
    assert_eq!(value, json!({"status": "ok"}));
    let envelope = remote.received_envelope().await;
    assert_eq!(envelope["type"], "code");
    assert_eq!(envelope["code"], "print(1)");
    assert!(envelope["timestamp"].is_string());
}

/// **VALUE**: Verifies a reply on a connection that stays open settles without waiting.
///
/// **WHY THIS MATTERS**: The add-on may keep the socket open after replying. The exchange
/// must not block until the timeout in that case.
#[tokio::test]
async fn given_remote_replies_and_holds_when_fetch_scene_then_success_before_timeout() {
    // GIVEN: A remote that replies with a newline-terminated document and never closes
    let reply = b"{\"scene_name\": \"Scene\", \"objects\": []}\n".to_vec();
    let remote = start_remote(RemoteScript::ReplyAndHold(reply)).await;
    let client = client_for(remote.port, GENEROUS_TIMEOUT);

    // WHEN
    let started = Instant::now();
    let value = client.fetch_scene().await.expect("Should succeed");

    // THEN: Settled well inside the timeout window
    assert_eq!(value["scene_name"], "Scene");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(remote.received_envelope().await["type"], "fetch-scene");
}

/// **VALUE**: Verifies a reply split across two writes settles only with both halves.
///
/// **BUG THIS CATCHES**: Would catch decoding only the latest chunk, or giving up on the first
/// parse failure.
#[tokio::test]
async fn given_reply_in_two_chunks_when_download_asset_then_success_after_both() {
    // GIVEN: A remote that writes the reply in two parts 100ms apart
    let gap = Duration::from_millis(100);
    let remote = start_remote(RemoteScript::Chunks {
        parts: vec![
            br#"{"status": "success", "message": "Asset 'rock_01' "#.to_vec(),
            br#"imported successfully"}"#.to_vec(),
        ],
        gap,
    })
    .await;
    let client = client_for(remote.port, GENEROUS_TIMEOUT);

    // WHEN
    let started = Instant::now();
    let value = client
        .download_asset("rock_01", "https://example/rock_01.blend")
        .await
        .expect("Should succeed");

    // THEN: The full message arrived, so the second chunk was awaited
    assert_eq!(value["message"], "Asset 'rock_01' imported successfully");
    assert!(started.elapsed() >= gap);

    let envelope = remote.received_envelope().await;
    assert_eq!(envelope["type"], "download-asset");
    assert_eq!(envelope["asset_name"], "rock_01");
    assert_eq!(envelope["blend_url"], "https://example/rock_01.blend");
}

/// **VALUE**: Verifies an immediate close with no data is `NoResponse`.
#[tokio::test]
async fn given_remote_closes_without_data_when_send_code_then_no_response() {
    let remote = start_remote(RemoteScript::CloseSilently).await;
    let client = client_for(remote.port, GENEROUS_TIMEOUT);

    let err = client.send_code("print(1)").await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::NoResponse);
}

/// **VALUE**: Verifies non-JSON followed by close is `MalformedResponse` carrying the bytes.
///
/// **WHY THIS MATTERS**: The raw text is the only clue when the add-on crashes mid-reply.
#[tokio::test]
async fn given_remote_sends_garbage_and_closes_when_send_code_then_malformed_with_raw() {
    let remote =
        start_remote(RemoteScript::ReplyAndClose(b"Internal error: bpy not ready".to_vec())).await;
    let client = client_for(remote.port, GENEROUS_TIMEOUT);

    let err = client.send_code("print(1)").await.unwrap_err();

    match err {
        ProtocolError::MalformedResponse { raw, .. } => {
            assert_eq!(raw, "Internal error: bpy not ready")
        }
        other => panic!("Expected MalformedResponse, got {other:?}"),
    }
}

/// **VALUE**: Verifies silence is a `Timeout` and that it fires on schedule.
///
/// **BUG THIS CATCHES**: Would catch a missing deadline (test would hang) or a timeout
/// reported as a transport error.
#[tokio::test]
async fn given_remote_never_replies_when_send_code_then_timeout() {
    let remote = start_remote(RemoteScript::Hang).await;
    let client = client_for(remote.port, SHORT_TIMEOUT);

    let started = Instant::now();
    let err = client.send_code("import time; time.sleep(60)").await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Timeout);
    assert!(started.elapsed() >= SHORT_TIMEOUT);
    assert!(started.elapsed() < GENEROUS_TIMEOUT);
    assert!(err.to_string().contains("300ms"));
}

/// **VALUE**: Verifies the socket is closed once an exchange times out.
///
/// **WHY THIS MATTERS**: A caller that retries against a stuck Blender would otherwise pile
/// up one open connection per attempt on both sides.
///
/// **BUG THIS CATCHES**: Would catch the stream being kept alive after settlement, e.g. a
/// teardown that only runs on the success path.
#[tokio::test]
async fn given_remote_never_replies_when_timeout_settles_then_connection_is_closed() {
    // GIVEN: A remote that never replies but watches its socket
    let remote = start_watching_remote().await;
    let client = client_for(remote.port, SHORT_TIMEOUT);

    // WHEN: The exchange times out
    let err = client.send_code("import time; time.sleep(60)").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Timeout);

    // THEN: The remote sees the connection go away well before it would give up
    let closed_after = tokio::time::timeout(GENEROUS_TIMEOUT, remote.closed_after)
        .await
        .expect("Remote should notice the close before the test timeout")
        .expect("Remote task panicked");
    assert!(
        closed_after.is_some(),
        "Client kept the connection open after timing out"
    );
}

/// **VALUE**: Verifies a refused connection is a `Transport` failure, not a timeout.
#[tokio::test]
async fn given_nothing_listening_when_send_code_then_transport_error() {
    let port = closed_port().await;
    let client = client_for(port, GENEROUS_TIMEOUT);

    let err = client.send_code("print(1)").await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Transport);
    assert!(std::error::Error::source(&err).is_some(), "Should keep the io::Error");
}

/// **VALUE**: Verifies validation failures happen before any connection is attempted.
#[tokio::test]
async fn given_blank_code_when_send_code_then_validation_error_without_connecting() {
    let port = closed_port().await;
    let client = client_for(port, GENEROUS_TIMEOUT);

    let err = client.send_code("  ").await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Validation);
}

/// **VALUE**: Verifies `asset-data` pushes go through the generic path with includes defaulted.
#[tokio::test]
async fn given_asset_data_request_when_pushed_then_remote_receives_full_envelope() {
    let remote = start_remote(RemoteScript::ReplyAndClose(
        br#"{"status": "success", "details": {"imported_objects": ["rock_01"]}}"#.to_vec(),
    ))
    .await;
    let client = client_for(remote.port, GENEROUS_TIMEOUT);

    let value = client
        .push_asset_data(AssetDataRequest {
            asset_name: "rock_01".to_string(),
            asset_type: "models".to_string(),
            resolution: "1k".to_string(),
            format: "blend".to_string(),
            blend_url: "https://dl.polyhaven.org/rock_01_1k.blend".to_string(),
            includes: None,
        })
        .await
        .expect("Should succeed");

    assert_eq!(value["details"]["imported_objects"][0], "rock_01");
    let envelope = remote.received_envelope().await;
    assert_eq!(envelope["type"], "asset-data");
    assert_eq!(envelope["includes"], json!({}));
    assert_eq!(envelope["resolution"], "1k");
}

/// **VALUE**: Verifies concurrent exchanges use separate connections and do not interfere.
///
/// **BUG THIS CATCHES**: Would catch any shared buffer or socket between calls on one client.
#[tokio::test]
async fn given_two_remotes_when_exchanges_run_concurrently_then_each_gets_its_own_reply() {
    let slow = start_remote(RemoteScript::Chunks {
        parts: vec![br#"{"who": "#.to_vec(), br#""slow"}"#.to_vec()],
        gap: Duration::from_millis(150),
    })
    .await;
    let fast = start_remote(RemoteScript::ReplyAndClose(br#"{"who": "fast"}"#.to_vec())).await;
    let slow_client = client_for(slow.port, GENEROUS_TIMEOUT);
    let fast_client = client_for(fast.port, GENEROUS_TIMEOUT);

    let (slow_result, fast_result) =
        tokio::join!(slow_client.fetch_scene(), fast_client.fetch_scene());

    assert_eq!(slow_result.unwrap()["who"], "slow");
    assert_eq!(fast_result.unwrap()["who"], "fast");
}

/// **VALUE**: Verifies each call opens a fresh connection (no reuse).
///
/// **BUG THIS CATCHES**: Would catch a pooled/cached connection: the fake remote accepts only
/// once, so a second call on the same port must fail to connect.
#[tokio::test]
async fn given_single_accept_remote_when_called_twice_then_second_call_needs_new_connection() {
    let remote = start_remote(RemoteScript::ReplyAndClose(br#"{"n": 1}"#.to_vec())).await;
    let client = client_for(remote.port, SHORT_TIMEOUT);

    let first = client.fetch_scene().await;
    let _ = remote.request.await;
    let second = client.fetch_scene().await;

    assert_eq!(first.unwrap()["n"], 1);
    let err = second.unwrap_err();
    assert!(matches!(
        err.kind(),
        FailureKind::Transport | FailureKind::Timeout
    ));
}
