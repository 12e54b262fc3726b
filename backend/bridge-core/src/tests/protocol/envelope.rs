// Unit tests for the command vocabulary builders.

use crate::error::FailureKind;
use crate::protocol::envelope::{
    AssetDataRequest, Command, Envelope, TYPE_ASSET_DATA, TYPE_CODE, TYPE_DOWNLOAD_ASSET,
    TYPE_FETCH_SCENE,
};

use std::time::SystemTime;

use serde_json::{Map, Value, json};

fn asset_request() -> AssetDataRequest {
    AssetDataRequest {
        asset_name: "brown_planks_03".to_string(),
        asset_type: "textures".to_string(),
        resolution: "1K".to_string(),
        format: "jpg".to_string(),
        blend_url: "https://dl.polyhaven.org/brown_planks_03_1k.blend".to_string(),
        includes: None,
    }
}

/// **VALUE**: Verifies the `download-asset` envelope shape end to end.
///
/// **WHY THIS MATTERS**: The add-on keys on `type`, `asset_name` and `blend_url`; a renamed
/// field means the asset is silently never downloaded.
#[test]
fn given_asset_name_and_url_when_download_asset_built_then_fields_and_timestamp_present() {
    // GIVEN / WHEN
    let envelope =
        Envelope::download_asset("rock_01", "https://example/rock_01.blend").unwrap();
    let value = serde_json::to_value(&envelope).unwrap();

    // THEN
    assert_eq!(value["type"], "download-asset");
    assert_eq!(value["asset_name"], "rock_01");
    assert_eq!(value["blend_url"], "https://example/rock_01.blend");
    assert!(value["timestamp"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(value.as_object().unwrap().len(), 4, "No extra fields");
}

/// **VALUE**: Verifies the `code` envelope carries the script verbatim.
///
/// **BUG THIS CATCHES**: Would catch trimming or escaping of user code (indentation matters in Python).
#[test]
fn given_python_source_when_code_built_then_code_is_verbatim() {
    let source = "import bpy\n\nfor o in bpy.data.objects:\n    print(o.name)\n";

    let envelope = Envelope::code(source).unwrap();
    let value = serde_json::to_value(&envelope).unwrap();

    assert_eq!(value["type"], TYPE_CODE);
    assert_eq!(value["code"], source);
    assert_eq!(envelope.command(), &Command::Code { code: source.to_string() });
}

/// **VALUE**: Verifies `fetch-scene` has only `type` and `timestamp`.
#[test]
fn given_nothing_when_fetch_scene_built_then_only_type_and_timestamp() {
    let value = serde_json::to_value(Envelope::fetch_scene()).unwrap();

    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 2);
    assert_eq!(value["type"], TYPE_FETCH_SCENE);
    assert!(value.get("timestamp").is_some());
}

/// **VALUE**: Verifies the timestamp is RFC 3339 and taken at build time.
///
/// **BUG THIS CATCHES**: Would catch a constant or non-ISO timestamp.
#[test]
fn given_envelope_when_built_then_timestamp_is_current_rfc3339() {
    let before = SystemTime::now();
    let envelope = Envelope::fetch_scene();
    let after = SystemTime::now();

    let stamped = humantime::parse_rfc3339(envelope.timestamp()).unwrap();
    let before_ms = humantime::parse_rfc3339(&humantime::format_rfc3339_millis(before).to_string())
        .unwrap();
    assert!(stamped >= before_ms, "Timestamp should not predate the build");
    assert!(stamped <= after, "Timestamp should not be in the future");
    assert!(envelope.timestamp().ends_with('Z'), "Should be UTC");
}

/// **VALUE**: Verifies blank code is rejected before any connection is made.
///
/// **WHY THIS MATTERS**: The add-on answers blank code with an error anyway; failing fast
/// avoids a round trip and gives a clearer message.
#[test]
fn given_blank_code_when_code_built_then_validation_error() {
    for blank in ["", "   ", "\n\t"] {
        let err = Envelope::code(blank).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert!(err.to_string().contains("code must not be blank"));
    }
}

/// **VALUE**: Verifies required download fields fail fast instead of defaulting.
#[test]
fn given_missing_fields_when_download_asset_built_then_validation_error() {
    let missing_name = Envelope::download_asset("", "https://example/x.blend").unwrap_err();
    let missing_url = Envelope::download_asset("rock_01", " ").unwrap_err();
    let relative_url = Envelope::download_asset("rock_01", "rock_01.blend").unwrap_err();

    assert!(missing_name.to_string().contains("asset_name"));
    assert!(missing_url.to_string().contains("blend_url"));
    assert!(relative_url.to_string().contains("not an absolute URL"));
    for err in [missing_name, missing_url, relative_url] {
        assert_eq!(err.kind(), FailureKind::Validation);
    }
}

/// **VALUE**: Verifies that an absent `includes` is sent as an explicit empty mapping.
///
/// **WHY THIS MATTERS**: The add-on iterates `includes`; a missing or null field must never
/// reach it inconsistently.
#[test]
fn given_no_includes_when_asset_data_built_then_includes_is_empty_object() {
    let envelope = Envelope::asset_data(asset_request()).unwrap();
    let value = serde_json::to_value(&envelope).unwrap();

    assert_eq!(value["type"], TYPE_ASSET_DATA);
    assert_eq!(value["includes"], json!({}));
    assert_eq!(value["asset_type"], "textures");
    assert_eq!(value["resolution"], "1K");
    assert_eq!(value["format"], "jpg");
}

/// **VALUE**: Verifies that nested includes are passed through untouched.
#[test]
fn given_nested_includes_when_asset_data_built_then_preserved() {
    let mut includes = Map::new();
    includes.insert(
        "textures/planks_diff_1k.jpg".to_string(),
        json!({"url": "https://dl.example/planks_diff_1k.jpg", "md5": "abc", "size": 10}),
    );
    let request = AssetDataRequest {
        includes: Some(includes.clone()),
        ..asset_request()
    };

    let value = serde_json::to_value(Envelope::asset_data(request).unwrap()).unwrap();

    assert_eq!(value["includes"], Value::Object(includes));
}

/// **VALUE**: Verifies every required `asset-data` field is checked.
#[test]
fn given_each_blank_field_when_asset_data_built_then_names_that_field() {
    let cases: Vec<(&str, AssetDataRequest)> = vec![
        ("asset_name", AssetDataRequest { asset_name: String::new(), ..asset_request() }),
        ("asset_type", AssetDataRequest { asset_type: String::new(), ..asset_request() }),
        ("resolution", AssetDataRequest { resolution: String::new(), ..asset_request() }),
        ("format", AssetDataRequest { format: String::new(), ..asset_request() }),
        ("blend_url", AssetDataRequest { blend_url: String::new(), ..asset_request() }),
    ];

    for (field, request) in cases {
        let err = Envelope::asset_data(request).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert!(
            err.to_string().contains(field),
            "Error should name {field}: {err}"
        );
    }
}

#[test]
fn given_each_command_when_type_name_requested_then_matches_wire_tag() {
    let envelopes = [
        Envelope::code("print(1)").unwrap(),
        Envelope::fetch_scene(),
        Envelope::download_asset("a", "https://example/a.blend").unwrap(),
        Envelope::asset_data(asset_request()).unwrap(),
    ];

    for envelope in envelopes {
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["type"], envelope.type_name());
        assert_eq!(envelope.command().type_name(), envelope.type_name());
    }
    assert_eq!(Envelope::fetch_scene().type_name(), TYPE_FETCH_SCENE);
    assert_eq!(
        Envelope::download_asset("a", "https://example/a.blend")
            .unwrap()
            .type_name(),
        TYPE_DOWNLOAD_ASSET
    );
}
