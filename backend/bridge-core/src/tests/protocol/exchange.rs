// Unit tests for the exchange state machine. Socket behaviour is covered in
// integration_tests/protocol.

use crate::error::{FailureKind, ProtocolError};
use crate::protocol::exchange::{ExchangeEvent, ExchangePhase, PendingExchange};

use std::io::{Error as IoError, ErrorKind};
use std::time::Duration;

use serde_json::json;

const TIMEOUT: Duration = Duration::from_millis(5_000);

fn connected_exchange() -> PendingExchange {
    let mut exchange = PendingExchange::new(TIMEOUT);
    assert!(exchange.apply(ExchangeEvent::Connected).is_none());
    assert!(exchange.apply(ExchangeEvent::Sent).is_none());
    exchange
}

fn every_event() -> Vec<ExchangeEvent> {
    vec![
        ExchangeEvent::Connected,
        ExchangeEvent::Sent,
        ExchangeEvent::Data(br#"{"late": true}"#.to_vec()),
        ExchangeEvent::Closed,
        ExchangeEvent::Failed(IoError::new(ErrorKind::ConnectionReset, "reset")),
        ExchangeEvent::TimedOut,
    ]
}

/// **VALUE**: Verifies the lifecycle phases advance Connecting → Sending → AwaitingResponse.
#[test]
fn given_new_exchange_when_connected_and_sent_then_awaits_response() {
    let mut exchange = PendingExchange::new(TIMEOUT);
    assert_eq!(exchange.phase(), ExchangePhase::Connecting);

    exchange.apply(ExchangeEvent::Connected);
    assert_eq!(exchange.phase(), ExchangePhase::Sending);

    exchange.apply(ExchangeEvent::Sent);
    assert_eq!(exchange.phase(), ExchangePhase::AwaitingResponse);
    assert!(!exchange.is_settled());
}

/// **VALUE**: Verifies that a complete document in one chunk settles immediately.
///
/// **WHY THIS MATTERS**: Some add-on versions reply and keep the socket open. Waiting for
/// close would turn every such reply into a timeout.
#[test]
fn given_complete_document_when_data_arrives_then_settles_success_without_close() {
    let mut exchange = connected_exchange();

    let settlement = exchange.apply(ExchangeEvent::Data(br#"{"status":"ok"}"#.to_vec()));

    let value = settlement.expect("Should settle").expect("Should succeed");
    assert_eq!(value, json!({"status": "ok"}));
    assert!(exchange.is_settled());
}

/// **VALUE**: Verifies that a document split across chunks settles only after the last chunk.
///
/// **BUG THIS CATCHES**: Would catch decoding each chunk on its own instead of the whole buffer.
#[test]
fn given_document_split_in_two_when_first_chunk_arrives_then_waits_for_second() {
    let mut exchange = connected_exchange();

    let first = exchange.apply(ExchangeEvent::Data(br#"{"scene_name": "Sce"#.to_vec()));
    assert!(first.is_none(), "Prefix must not settle");
    assert_eq!(exchange.buffered(), br#"{"scene_name": "Sce"#);

    let second = exchange.apply(ExchangeEvent::Data(br#"ne", "objects": []}"#.to_vec()));
    let value = second.expect("Should settle").expect("Should succeed");
    assert_eq!(value, json!({"scene_name": "Scene", "objects": []}));
}

/// **VALUE**: Verifies that whitespace followed by close is malformed, not "no response".
///
/// **BUG THIS CATCHES**: Would catch bytes that did arrive being reported as
/// "connection closed before any data arrived".
#[test]
fn given_only_whitespace_when_closed_then_malformed_with_raw_bytes() {
    let mut exchange = connected_exchange();
    assert!(exchange.apply(ExchangeEvent::Data(b"\n".to_vec())).is_none());

    let settlement = exchange.apply(ExchangeEvent::Closed).expect("Should settle");

    match settlement.unwrap_err() {
        ProtocolError::MalformedResponse { raw, .. } => assert_eq!(raw, "\n"),
        other => panic!("Expected MalformedResponse, got {other:?}"),
    }
}

#[test]
fn given_close_with_empty_buffer_when_closed_then_no_response() {
    let mut exchange = connected_exchange();

    let settlement = exchange.apply(ExchangeEvent::Closed).expect("Should settle");

    let err = settlement.unwrap_err();
    assert_eq!(err.kind(), FailureKind::NoResponse);
    assert!(err.to_string().contains("No Response Error"));
}

/// **VALUE**: Verifies that non-JSON at close is reported with the raw bytes.
///
/// **WHY THIS MATTERS**: When Blender prints a traceback instead of JSON, the raw text is the
/// only diagnostic the user gets.
#[test]
fn given_non_json_then_close_when_closed_then_malformed_with_raw_text() {
    let mut exchange = connected_exchange();
    assert!(exchange.apply(ExchangeEvent::Data(b"not json".to_vec())).is_none());

    let settlement = exchange.apply(ExchangeEvent::Closed).expect("Should settle");

    match settlement.unwrap_err() {
        ProtocolError::MalformedResponse { raw, .. } => assert_eq!(raw, "not json"),
        other => panic!("Expected MalformedResponse, got {other:?}"),
    }
}

/// **VALUE**: Verifies that a truncated document at close is malformed, not a success.
#[test]
fn given_truncated_document_when_closed_then_malformed() {
    let mut exchange = connected_exchange();
    exchange.apply(ExchangeEvent::Data(br#"{"status": "ok""#.to_vec()));

    let err = exchange.apply(ExchangeEvent::Closed).unwrap().unwrap_err();

    assert_eq!(err.kind(), FailureKind::MalformedResponse);
}

/// **VALUE**: Verifies transport errors settle immediately, in any phase.
#[test]
fn given_io_error_when_connecting_then_transport_failure() {
    let mut exchange = PendingExchange::new(TIMEOUT);

    let settlement = exchange.apply(ExchangeEvent::Failed(IoError::new(
        ErrorKind::ConnectionRefused,
        "connection refused",
    )));

    let err = settlement.expect("Should settle").unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
    assert!(err.to_string().contains("connection refused"));
}

/// **VALUE**: Verifies that a timeout is its own recognisable failure carrying the window.
///
/// **BUG THIS CATCHES**: Would catch timeouts being folded into transport errors.
#[test]
fn given_pending_exchange_when_timed_out_then_timeout_failure_with_duration() {
    let mut exchange = connected_exchange();
    exchange.apply(ExchangeEvent::Data(b"{\"partial\":".to_vec()));

    let err = exchange.apply(ExchangeEvent::TimedOut).unwrap().unwrap_err();

    assert_eq!(err.kind(), FailureKind::Timeout);
    match err {
        ProtocolError::Timeout { timeout_ms, .. } => assert_eq!(timeout_ms, 5_000),
        other => panic!("Expected Timeout, got {other:?}"),
    }
}

/// **VALUE**: Verifies at-most-once settlement: after the first outcome, every event is a no-op.
///
/// **WHY THIS MATTERS**: Data, close, error and the timer can all fire for the same exchange.
/// A second settlement would deliver two results to one caller.
///
/// **BUG THIS CATCHES**: Would catch a missing settled-guard in `apply`.
#[test]
fn given_each_first_outcome_when_other_events_fire_then_none_settle_again() {
    let first_events = every_event();

    for first in first_events {
        let mut exchange = PendingExchange::new(TIMEOUT);
        let mut settlements = 0;

        for event in std::iter::once(first).chain(every_event()) {
            if exchange.apply(event).is_some() {
                settlements += 1;
            }
        }
        // Every sequence contains a settling event, and only the first one counts.
        assert_eq!(settlements, 1);
        assert_eq!(exchange.phase(), ExchangePhase::Settled);
    }
}

/// **VALUE**: Verifies that data arriving after settlement is not appended.
#[test]
fn given_settled_exchange_when_more_data_arrives_then_buffer_unchanged() {
    let mut exchange = connected_exchange();
    exchange.apply(ExchangeEvent::Data(br#"{"a":1}"#.to_vec()));

    assert!(exchange.apply(ExchangeEvent::Data(b"trailing".to_vec())).is_none());
    assert_eq!(exchange.buffered(), br#"{"a":1}"#);
}
