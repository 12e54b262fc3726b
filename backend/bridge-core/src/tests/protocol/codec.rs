// Unit tests for the message codec.

use crate::protocol::codec::{DecodeError, Finality, encode, try_decode};
use crate::protocol::envelope::{AssetDataRequest, Envelope};

use serde_json::{Map, Value, json};

/// **VALUE**: Verifies that every envelope kind survives encode → decode unchanged.
///
/// **WHY THIS MATTERS**: The Blender add-on decodes exactly these bytes. If serialization
/// drops or renames a field, the add-on silently falls back to defaults (e.g. empty code).
///
/// **BUG THIS CATCHES**: Would catch a broken `#[serde(flatten)]`/tag setup that produces
/// nested `{"command": {...}}` objects or loses the timestamp.
#[test]
fn given_built_envelopes_when_encoded_and_decoded_then_values_match() {
    // GIVEN: One envelope of every kind
    let mut includes = Map::new();
    includes.insert(
        "textures/rock_diff_1k.jpg".to_string(),
        json!({"url": "https://dl.example/rock_diff_1k.jpg", "size": 1024}),
    );
    let envelopes = vec![
        Envelope::code("import bpy\nprint(bpy.app.version)").unwrap(),
        Envelope::fetch_scene(),
        Envelope::download_asset("rock_01", "https://example/rock_01.blend").unwrap(),
        Envelope::asset_data(AssetDataRequest {
            asset_name: "rock_01".to_string(),
            asset_type: "models".to_string(),
            resolution: "1k".to_string(),
            format: "blend".to_string(),
            blend_url: "https://dl.example/rock_01_1k.blend".to_string(),
            includes: Some(includes),
        })
        .unwrap(),
    ];

    for envelope in envelopes {
        // WHEN: Encoding then decoding the exact bytes
        let bytes = encode(&envelope).unwrap();
        let decoded = try_decode(&bytes, Finality::Partial).unwrap();

        // THEN: The decoded value equals the envelope's JSON form
        assert_eq!(decoded, serde_json::to_value(&envelope).unwrap());
        assert_eq!(decoded["type"], envelope.type_name());
        assert_eq!(decoded["timestamp"], envelope.timestamp());
    }
}

/// **VALUE**: Verifies that encoding is deterministic for a given envelope.
#[test]
fn given_same_envelope_when_encoded_twice_then_bytes_are_identical() {
    let envelope = Envelope::download_asset("rock_01", "https://example/rock_01.blend").unwrap();

    assert_eq!(encode(&envelope).unwrap(), encode(&envelope).unwrap());
}

/// **VALUE**: Verifies that a prefix of a document is "keep reading", not an error.
///
/// **WHY THIS MATTERS**: TCP may deliver the reply in several chunks. Treating a prefix as
/// malformed would fail every large scene listing.
///
/// **BUG THIS CATCHES**: Would catch if partial decoding reports `Malformed`.
#[test]
fn given_prefix_of_document_when_decoded_partially_then_incomplete() {
    // GIVEN: The first half of a JSON document
    let buffer = br#"{"status": "ok", "res"#;

    // WHEN / THEN
    assert_eq!(
        try_decode(buffer, Finality::Partial),
        Err(DecodeError::Incomplete)
    );
}

/// **VALUE**: Verifies that garbage is only reported as malformed once the buffer is final.
///
/// **BUG THIS CATCHES**: Would catch if the raw text is lost or if finality is ignored.
#[test]
fn given_non_json_when_decoded_then_incomplete_until_final() {
    // GIVEN: Bytes that will never parse
    let buffer = b"Traceback (most recent call last)";

    // WHEN: Decoding as partial, then as final
    let partial = try_decode(buffer, Finality::Partial);
    let final_result = try_decode(buffer, Finality::Final);

    // THEN: Partial is incomplete; final is malformed with the raw text
    assert_eq!(partial, Err(DecodeError::Incomplete));
    assert_eq!(
        final_result,
        Err(DecodeError::Malformed {
            raw: "Traceback (most recent call last)".to_string()
        })
    );
}

/// **VALUE**: Verifies that only an empty final buffer is incomplete.
///
/// **WHY THIS MATTERS**: The exchange maps a final `Incomplete` to "no response". A remote
/// that wrote anything at all, even a bare newline, did respond, and those bytes are the
/// only diagnostic the caller gets.
///
/// **BUG THIS CATCHES**: Would catch whitespace being swallowed at close and reported as
/// "no data arrived".
#[test]
fn given_empty_or_whitespace_buffer_when_decoded_final_then_only_empty_is_incomplete() {
    assert_eq!(try_decode(b"", Finality::Final), Err(DecodeError::Incomplete));
    assert_eq!(
        try_decode(b"\n", Finality::Final),
        Err(DecodeError::Malformed {
            raw: "\n".to_string()
        })
    );
}

#[test]
fn given_whitespace_buffer_when_decoded_partial_then_incomplete() {
    assert_eq!(
        try_decode(b" \r\n\t", Finality::Partial),
        Err(DecodeError::Incomplete)
    );
}

/// **VALUE**: Verifies that the add-on's trailing newline is accepted.
///
/// **BUG THIS CATCHES**: Would catch a strict decoder that rejects trailing whitespace and
/// so only ever succeeds at close time.
#[test]
fn given_newline_terminated_reply_when_decoded_then_parses() {
    let decoded = try_decode(b"{\"status\": \"executed\", \"result\": \"1\\n\"}\n", Finality::Partial);

    assert_eq!(
        decoded,
        Ok(json!({"status": "executed", "result": "1\n"}))
    );
}

/// **VALUE**: Verifies that the response value is opaque: arrays and scalars decode too.
#[test]
fn given_non_object_documents_when_decoded_then_returned_verbatim() {
    assert_eq!(try_decode(b"[1,2,3]", Finality::Partial), Ok(json!([1, 2, 3])));
    assert_eq!(try_decode(b"42", Finality::Final), Ok(json!(42)));
    assert_eq!(try_decode(b"null", Finality::Final), Ok(Value::Null));
}

/// **VALUE**: Verifies that invalid UTF-8 in a final buffer is still reported, lossily.
#[test]
fn given_invalid_utf8_when_decoded_final_then_malformed_with_replacement_chars() {
    let result = try_decode(&[0xff, 0xfe, b'x'], Finality::Final);

    match result {
        Err(DecodeError::Malformed { raw }) => {
            assert!(raw.contains('\u{fffd}'));
            assert!(raw.ends_with('x'));
        }
        other => panic!("Expected Malformed, got {other:?}"),
    }
}
