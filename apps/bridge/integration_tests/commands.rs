// Integration tests for subcommands end to end: CLI command -> exchange -> tool text.
// The Blender side is a one-shot TCP listener, the catalog is wiremock.

use blender_bridge::cli::Command;
use blender_bridge::commands::run;

use bridge_core::config::BridgeConfig;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Accepts one connection, reads the request to EOF, replies and closes.
async fn one_shot_remote(reply: Value) -> (u16, JoinHandle<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        socket.read_to_end(&mut request).await.unwrap();
        socket
            .write_all(reply.to_string().as_bytes())
            .await
            .unwrap();
        socket.shutdown().await.ok();
        serde_json::from_slice(&request).unwrap()
    });

    (port, handle)
}

fn config_for(port: u16, catalog_url: &str) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.connection.host = String::from("127.0.0.1");
    config.connection.port = port;
    config.connection.timeout_ms = 2_000;
    config.catalog.base_url = catalog_url.to_string();
    config
}

/// **VALUE**: `send-code` delivers the code and renders an executed reply.
///
/// **WHY THIS MATTERS**: This is the main path a tool call takes.
///
/// **BUG THIS CATCHES**: Would catch the CLI bypassing the core client, sending the
/// wrong envelope type, or losing the output while rendering.
#[tokio::test]
async fn given_listening_remote_when_send_code_runs_then_output_rendered() {
    // GIVEN: A remote that reports successful execution
    let (port, request) =
        one_shot_remote(json!({"status": "executed", "result": "Cube\n"})).await;
    let config = config_for(port, "https://api.polyhaven.com");

    // WHEN: Running send-code
    let command = Command::SendCode {
        code: Some(String::from("print(bpy.context.object.name)")),
        file: None,
    };
    let text = run(&command, &config).await.unwrap();

    // THEN: The tool text carries the output
    assert!(!text.is_error, "got: {}", text.text);
    assert!(text.text.contains("Output:\nCube"));

    // AND: The remote saw a code envelope
    let envelope = request.await.unwrap();
    assert_eq!(envelope["type"], "code");
    assert_eq!(envelope["code"], "print(bpy.context.object.name)");
    assert!(envelope["timestamp"].is_string());
}

/// **VALUE**: A refused connection is an error tool text, not a CLI failure.
///
/// **BUG THIS CATCHES**: Would catch exchange failures escaping as `Err`, which the
/// binary reports as a setup problem with a different exit code.
#[tokio::test]
async fn given_nothing_listening_when_scene_runs_then_error_tool_text() {
    // GIVEN: A port with no listener
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = config_for(port, "https://api.polyhaven.com");

    // WHEN: Fetching the scene
    let text = run(&Command::Scene, &config).await.unwrap();

    // THEN: It is an error naming the connection problem
    assert!(text.is_error);
    assert!(text.text.contains("could not reach Blender"), "got: {}", text.text);
}

/// **VALUE**: `import` resolves through the catalog and pushes an asset-data envelope.
///
/// **WHY THIS MATTERS**: It is the only command that spans both services.
///
/// **BUG THIS CATCHES**: Would catch the resolved URL or include map not making it
/// into the envelope, or the hdri default resolution being wrong.
#[tokio::test]
async fn given_catalog_manifest_when_import_runs_then_asset_data_pushed() {
    // GIVEN: A catalog serving a model manifest
    let catalog = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/rock_01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blend": {
                "1k": {
                    "blend": {
                        "url": "https://dl.polyhaven.org/rock_01_1k.blend",
                        "include": {
                            "textures/rock_01_diff_1k.jpg": {"url": "https://dl.polyhaven.org/diff.jpg"}
                        }
                    }
                }
            }
        })))
        .mount(&catalog)
        .await;

    // AND: A remote that acknowledges the import
    let (port, request) =
        one_shot_remote(json!({"status": "success", "message": "Imported rock_01"})).await;
    let config = config_for(port, &catalog.uri());

    // WHEN: Importing the model with default resolution
    let command = Command::Import {
        asset_id: String::from("rock_01"),
        asset_type: String::from("models"),
        resolution: None,
        format: None,
    };
    let text = run(&command, &config).await.unwrap();

    // THEN: The acknowledgement is rendered
    assert!(!text.is_error, "got: {}", text.text);
    assert!(text.text.starts_with("Imported rock_01"));

    // AND: The envelope carries the resolved download
    let envelope = request.await.unwrap();
    assert_eq!(envelope["type"], "asset-data");
    assert_eq!(envelope["asset_name"], "rock_01");
    assert_eq!(envelope["asset_type"], "models");
    assert_eq!(envelope["resolution"], "1k");
    assert_eq!(envelope["format"], "blend");
    assert_eq!(envelope["blend_url"], "https://dl.polyhaven.org/rock_01_1k.blend");
    assert!(envelope["includes"]["textures/rock_01_diff_1k.jpg"].is_object());
}

#[tokio::test]
async fn given_manifest_without_requested_resolution_when_import_runs_then_error_and_no_exchange() {
    // GIVEN: A manifest with only 1k
    let catalog = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/sky_01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hdri": {"1k": {"hdr": {"url": "https://dl.polyhaven.org/sky_01_1k.hdr"}}}
        })))
        .mount(&catalog)
        .await;
    // Port 9 (discard) is never contacted when resolution fails.
    let config = config_for(9, &catalog.uri());

    // WHEN: Asking for 8k
    let command = Command::Import {
        asset_id: String::from("sky_01"),
        asset_type: String::from("hdris"),
        resolution: Some(String::from("8k")),
        format: None,
    };
    let text = run(&command, &config).await.unwrap();

    // THEN: The missing file is reported
    assert!(text.is_error);
    assert!(text.text.starts_with("Asset import failed:"));
    assert!(text.text.contains("hdri/8k/hdr"), "got: {}", text.text);
}

#[tokio::test]
async fn given_catalog_types_when_asset_types_runs_then_listing_rendered() {
    let catalog = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["hdris", "textures", "models"])))
        .mount(&catalog)
        .await;
    let config = config_for(9, &catalog.uri());

    let text = run(&Command::AssetTypes, &config).await.unwrap();

    assert!(!text.is_error);
    assert!(text.text.starts_with("Asset types:\n"));
    assert!(text.text.contains("\"models\""));
}
