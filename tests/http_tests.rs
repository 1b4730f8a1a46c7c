use algolia_mcp::client::{AlgoliaBackend, ApiRequest, Host};
use algolia_mcp::config::{Credentials, TransportOptions};
use algolia_mcp::http::HttpBackend;
use algolia_mcp::tools::ToolError;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(TransportOptions::new().with_timeout(Duration::from_secs(5)))
        .unwrap()
        .with_base_url(&server.uri())
        .unwrap()
}

#[tokio::test]
async fn test_sends_credentials_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/metrics/daily"))
        .and(query_param("application", "APPID1"))
        .and(query_param("name", "operations_search"))
        .and(header("x-algolia-application-id", "APPID1"))
        .and(header("x-algolia-api-key", "read-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dates": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::new("APPID1", "read-key");
    let request = ApiRequest::get(Host::Usage, "/2/metrics/daily")
        .query("application", "APPID1")
        .query("name", "operations_search")
        .auth(credentials.read().unwrap());

    let response = backend_for(&server).send(request).await.unwrap();
    assert_eq!(response, json!({ "dates": [] }));
}

#[tokio::test]
async fn test_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/indexes/products/query"))
        .and(body_json(json!({ "query": "phone", "hitsPerPage": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nbHits": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ApiRequest::post(Host::Search("APPID1".into()), "/1/indexes")
        .segment("products")
        .segment("query")
        .json(json!({ "query": "phone", "hitsPerPage": 0 }));

    let response = backend_for(&server).send(request).await.unwrap();
    assert_eq!(response["nbHits"], 42);
}

#[tokio::test]
async fn test_encodes_path_segments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/indexes/my%20index/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hitsPerPage": 20 })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ApiRequest::get(Host::Search("APPID1".into()), "/1/indexes")
        .segment("my index")
        .segment("settings");

    backend_for(&server).send(request).await.unwrap();
}

#[tokio::test]
async fn test_error_status_carries_remote_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/indexes/missing/settings"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "message": "Index does not exist", "status": 404 })),
        )
        .mount(&server)
        .await;

    let request = ApiRequest::get(Host::Search("APPID1".into()), "/1/indexes/missing/settings");
    let err = backend_for(&server).send(request).await.unwrap_err();

    match err {
        ToolError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Index does not exist");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/1/collections/abc"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let request = ApiRequest::delete(Host::Experiences, "/1/collections").segment("abc");
    let response = backend_for(&server).send(request).await.unwrap();
    assert_eq!(response, Value::Null);
}

#[tokio::test]
async fn test_malformed_body_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .send(ApiRequest::get(Host::Status, "/1/status"))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Parse(_)));
}

#[tokio::test]
async fn test_extra_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/incidents"))
        .and(header("x-algolia-agent", "algolia-mcp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(
        TransportOptions::new().with_header("x-algolia-agent", "algolia-mcp"),
    )
    .unwrap()
    .with_base_url(&server.uri())
    .unwrap();

    backend
        .send(ApiRequest::get(Host::Status, "/1/incidents"))
        .await
        .unwrap();
}
