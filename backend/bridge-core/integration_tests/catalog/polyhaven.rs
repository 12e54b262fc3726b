use bridge_core::catalog::{DownloadRequest, PolyHavenClient};
use bridge_core::error::CatalogError;

use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> PolyHavenClient {
    PolyHavenClient::new(&server.uri()).expect("Mock server URI should parse")
}

/// **VALUE**: Verifies `/types` is fetched and decoded, with a user agent set.
///
/// **WHY THIS MATTERS**: The catalog rejects anonymous clients; missing the header turns every
/// listing into an HTTP error.
#[tokio::test]
async fn given_catalog_when_asset_types_requested_then_returns_list() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/types"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["hdris", "textures", "models"])))
        .expect(1)
        .mount(&server)
        .await;

    // WHEN
    let types = client_for(&server).await.asset_types().await.unwrap();

    // THEN
    assert_eq!(types, vec!["hdris", "textures", "models"]);
}

#[tokio::test]
async fn given_asset_type_when_categories_requested_then_returns_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/categories/textures"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"all": 600, "wood": 80, "brick": 40})),
        )
        .mount(&server)
        .await;

    let categories = client_for(&server).await.categories("textures").await.unwrap();

    assert_eq!(categories.get("wood"), Some(&80));
    assert_eq!(categories.len(), 3);
}

/// **VALUE**: Verifies the listing query carries the type and, when given, the category filter.
#[tokio::test]
async fn given_category_filter_when_assets_requested_then_query_has_t_and_c() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets"))
        .and(query_param("t", "models"))
        .and(query_param("c", "rocks,nature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rock_01": {"name": "Rock 01", "categories": ["rocks"]},
            "boulder_01": {"name": "Boulder 01", "categories": ["rocks", "nature"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let assets = client_for(&server)
        .await
        .assets("models", Some("rocks,nature"))
        .await
        .unwrap();

    assert_eq!(assets.len(), 2);
    assert_eq!(assets["rock_01"]["name"], "Rock 01");
}

/// **VALUE**: Verifies a base URL with a path prefix keeps the prefix.
///
/// **BUG THIS CATCHES**: Would catch `Url::join` dropping the last path segment of the base.
#[tokio::test]
async fn given_base_url_with_path_when_requesting_then_prefix_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["hdris"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = PolyHavenClient::new(&format!("{}/api/v1", server.uri())).unwrap();

    assert_eq!(client.asset_types().await.unwrap(), vec!["hdris"]);
}

/// **VALUE**: Verifies non-2xx responses keep the status code.
#[tokio::test]
async fn given_unknown_asset_when_files_requested_then_server_error_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/no_such_asset"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .files("no_such_asset")
        .await
        .unwrap_err();

    match err {
        CatalogError::Server {
            status, message, ..
        } => {
            assert!(status.is_not_found());
            assert_eq!(message, "Not found");
        }
        other => panic!("Expected Server error, got {other:?}"),
    }
}

#[tokio::test]
async fn given_non_json_body_when_types_requested_then_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/types"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).await.asset_types().await.unwrap_err();

    // reqwest reports body decode failures as its own error type.
    assert!(matches!(err, CatalogError::Http { .. }));
}

/// **VALUE**: Verifies fetching a manifest and resolving it in one call.
#[tokio::test]
async fn given_model_manifest_when_resolved_then_blend_url_and_includes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/rock_01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blend": {
                "1k": {"blend": {
                    "url": "https://dl.polyhaven.org/rock_01_1k.blend",
                    "include": {"textures/rock_01_diff_1k.jpg": {"url": "https://dl.polyhaven.org/rock_01_diff_1k.jpg"}}
                }}
            },
            "gltf": {}
        })))
        .mount(&server)
        .await;

    let resolved = client_for(&server)
        .await
        .resolve(&DownloadRequest {
            asset_id: "rock_01".to_string(),
            asset_type: "models".to_string(),
            resolution: None,
            format: None,
        })
        .await
        .unwrap();

    assert_eq!(resolved.url, "https://dl.polyhaven.org/rock_01_1k.blend");
    assert_eq!(resolved.format, "blend");
    assert_eq!(resolved.includes.unwrap().len(), 1);
}

#[test]
fn given_invalid_base_url_when_client_created_then_url_parse_error() {
    let err = PolyHavenClient::new("not a url").unwrap_err();

    assert!(matches!(err, CatalogError::UrlParse { .. }));
}
