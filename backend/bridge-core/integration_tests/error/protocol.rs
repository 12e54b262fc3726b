use bridge_core::error::{CoreError, FailureKind, ProtocolError};
use common::ErrorLocation;

use std::error::Error;
use std::io::{Error as IoError, ErrorKind};
use std::panic::Location;

/// **VALUE**: Verifies that each failure kind renders a distinct, recognisable prefix.
///
/// **WHY THIS MATTERS**: Tool output shows these strings to the user. A timeout must never
/// read like a refused connection, or users debug the wrong thing.
///
/// **BUG THIS CATCHES**: Would catch two variants sharing a prefix or losing the location.
#[test]
fn given_each_protocol_error_when_formatted_then_prefix_and_location_present() {
    // GIVEN: One error of each terminal kind
    let location = ErrorLocation::from(Location::caller());
    let errors = [
        (
            ProtocolError::Transport {
                message: "connection refused".to_string(),
                location,
                source: IoError::new(ErrorKind::ConnectionRefused, "connection refused"),
            },
            "Transport Error",
        ),
        (
            ProtocolError::Timeout {
                timeout_ms: 5_000,
                location,
            },
            "Timeout Error",
        ),
        (
            ProtocolError::MalformedResponse {
                raw: "oops".to_string(),
                location,
            },
            "Malformed Response Error",
        ),
        (
            ProtocolError::NoResponse {
                message: "closed".to_string(),
                location,
            },
            "No Response Error",
        ),
    ];

    for (error, prefix) in errors {
        // WHEN
        let text = error.to_string();

        // THEN
        assert!(text.starts_with(prefix), "{text}");
        assert!(text.contains("protocol.rs"), "{text}");
        assert_eq!(error.location(), location);
    }
}

/// **VALUE**: Verifies io errors convert to `Transport` and keep their source.
#[test]
fn given_io_error_when_converted_then_transport_with_source() {
    let err = ProtocolError::from(IoError::new(ErrorKind::ConnectionReset, "reset by peer"));

    assert_eq!(err.kind(), FailureKind::Transport);
    assert!(err.source().is_some());
    assert!(err.to_string().contains("reset by peer"));
}

/// **VALUE**: Verifies `CoreError` is transparent over protocol errors.
#[test]
fn given_protocol_error_when_wrapped_in_core_error_then_display_unchanged() {
    let inner = ProtocolError::Timeout {
        timeout_ms: 250,
        location: ErrorLocation::from(Location::caller()),
    };
    let expected = inner.to_string();

    let core: CoreError = inner.into();

    assert_eq!(core.to_string(), expected);
}
