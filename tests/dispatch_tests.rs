mod common;

use algolia_mcp::config::Credentials;
use algolia_mcp::dispatch::{Dispatcher, InvocationContext, InvocationRequest};
use algolia_mcp::providers::{build_registry, NoParams};
use algolia_mcp::registry::Registry;
use algolia_mcp::result::ErrorKind;
use algolia_mcp::tools::{ToolDescriptor, ToolError};
use algolia_mcp::tool;
use common::{config_with, credentials, HangingBackend, MockBackend};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn dispatcher_for(toolsets: &[&str], credentials: Credentials, backend: MockBackend) -> Dispatcher {
    let config = config_with(toolsets, credentials);
    let registry = build_registry(&config).unwrap();
    Dispatcher::new(registry, config.credentials, Arc::new(backend))
}

fn daily_metrics_args() -> Value {
    json!({
        "applications": "APPID1",
        "startDate": "2024-01-01",
        "metricNames": "operations_search",
    })
}

#[tokio::test]
async fn test_usage_daily_metrics_passes_response_through() {
    let remote = json!({
        "applicationID": "APPID1",
        "dates": [{ "date": "2024-01-01", "operations_search": 1234 }],
    });
    let backend = MockBackend::new(vec![Ok(remote.clone())]);
    let dispatcher = dispatcher_for(&["usage"], credentials(), backend.clone());

    let output = dispatcher
        .call("usage_get_daily_metrics", daily_metrics_args())
        .await
        .unwrap();

    assert_eq!(output.label, "Daily Metrics");
    assert_eq!(output.payload, remote);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.path(), "/2/metrics/daily");
    assert_eq!(request.query_value("application"), Some("APPID1"));
    assert_eq!(request.query_value("startDate"), Some("2024-01-01"));
    assert_eq!(request.query_value("name"), Some("operations_search"));
    assert_eq!(request.query_value("endDate"), None);

    let auth = request.auth.as_ref().unwrap();
    assert_eq!(auth.app_id, "APPID1");
    assert_eq!(auth.api_key, "read-key");
}

#[tokio::test]
async fn test_missing_credentials_fail_before_any_request() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["usage"], Credentials::default(), backend.clone());

    let err = dispatcher
        .call("usage_get_daily_metrics", daily_metrics_args())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::HandlerError);
    assert!(err.message.contains("ALGOLIA_APP_ID"));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_tool_is_not_found() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["usage"], credentials(), backend.clone());

    let err = dispatcher.call("does_not_exist", json!({})).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::ToolNotFound);
    assert!(err.message.contains("does_not_exist"));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_every_registered_tool_is_found() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["monitoring", "usage"], credentials(), backend);

    for name in dispatcher.registry().names() {
        if let Err(err) = dispatcher.call(name, json!({})).await {
            assert_ne!(err.kind, ErrorKind::ToolNotFound, "{} was not found", name);
        }
    }
}

#[tokio::test]
async fn test_missing_required_field_names_it() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["usage"], credentials(), backend.clone());

    let err = dispatcher
        .call(
            "usage_get_daily_metrics",
            json!({ "applications": "APPID1", "metricNames": "operations_search" }),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidArguments);
    assert_eq!(err.field.as_deref(), Some("startDate"));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_and_mistyped_fields_are_rejected() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["usage"], credentials(), backend.clone());

    let mut args = daily_metrics_args();
    args["bogus"] = json!(true);
    let err = dispatcher
        .call("usage_get_daily_metrics", args)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArguments);
    assert_eq!(err.field.as_deref(), Some("bogus"));

    let mut args = daily_metrics_args();
    args["applications"] = json!(42);
    let err = dispatcher
        .call("usage_get_daily_metrics", args)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArguments);
    assert_eq!(err.field.as_deref(), Some("applications"));

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_nested_argument_errors_name_the_path() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["ingestion"], credentials(), backend.clone());

    let err = dispatcher
        .call(
            "update_transformation",
            json!({
                "transformation_id": "tr-1",
                "code": "async function transform(record) { return record; }",
                "name": "identity",
                "authentication_ids": ["auth-1", 3],
            }),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidArguments);
    assert_eq!(err.field.as_deref(), Some("authentication_ids.1"));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_abtest_id_accepts_whole_floats() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["abtesting"], credentials(), backend.clone());

    dispatcher
        .call("abtesting_get_abtest", json!({ "id": 42.0 }))
        .await
        .unwrap();
    dispatcher
        .call("abtesting_get_abtest", json!({ "id": 7 }))
        .await
        .unwrap();

    let requests = backend.requests();
    assert_eq!(requests[0].path(), "/2/abtests/42");
    assert_eq!(requests[1].path(), "/2/abtests/7");

    let err = dispatcher
        .call("abtesting_get_abtest", json!({ "id": 4.5 }))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArguments);
    assert_eq!(err.field.as_deref(), Some("id"));
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_null_optional_field_counts_as_absent() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["usage"], credentials(), backend.clone());

    let mut args = daily_metrics_args();
    args["endDate"] = Value::Null;
    dispatcher
        .call("usage_get_daily_metrics", args)
        .await
        .unwrap();

    assert_eq!(backend.requests()[0].query_value("endDate"), None);
}

#[tokio::test]
async fn test_enum_values_are_enforced() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["monitoring"], credentials(), backend.clone());

    let err = dispatcher
        .call(
            "monitoring_get_metrics",
            json!({ "metric": "disk_usage", "period": "day" }),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArguments);
    assert_eq!(err.field.as_deref(), Some("metric"));

    dispatcher
        .call(
            "monitoring_get_metrics",
            json!({ "metric": "*", "period": "day" }),
        )
        .await
        .unwrap();
    assert_eq!(
        backend.requests()[0].path(),
        "/1/infrastructure/*/period/day"
    );
}

#[tokio::test]
async fn test_remote_error_becomes_handler_error() {
    let backend = MockBackend::new(vec![Err(ToolError::Api {
        status: 403,
        message: "Invalid Application-ID or API key".to_string(),
    })]);
    let dispatcher = dispatcher_for(&["usage"], credentials(), backend);

    let err = dispatcher
        .call("usage_get_daily_metrics", daily_metrics_args())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::HandlerError);
    assert!(err.message.contains("Invalid Application-ID or API key"));
    assert!(err.message.contains("403"));
}

#[tokio::test]
async fn test_handler_checks_report_the_field() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["search_write", "abtesting"], credentials(), backend.clone());

    let err = dispatcher
        .call(
            "insert_object",
            json!({ "object": "{\"title\":\"no id\"}", "indexName": "products" }),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArguments);
    assert_eq!(err.field.as_deref(), Some("object"));
    assert!(err.message.contains("objectID"));

    let err = dispatcher
        .call(
            "abtesting_create_abtest",
            json!({
                "name": "three ways",
                "endAt": "2030-01-01T00:00:00Z",
                "variants": "[{\"index\":\"a\"},{\"index\":\"b\"},{\"index\":\"c\"}]",
            }),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArguments);
    assert_eq!(err.field.as_deref(), Some("variants"));

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_index_name_falls_back_to_default() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(
        &["search_read"],
        credentials().with_index_name("products"),
        backend.clone(),
    );

    dispatcher.call("get_settings", json!({})).await.unwrap();
    dispatcher
        .call("get_settings", json!({ "indexName": "articles" }))
        .await
        .unwrap();

    let requests = backend.requests();
    assert_eq!(requests[0].path(), "/1/indexes/products/settings");
    assert_eq!(requests[1].path(), "/1/indexes/articles/settings");
}

#[tokio::test]
async fn test_index_name_required_without_default() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["search_read"], credentials(), backend.clone());

    let err = dispatcher
        .call("run_query", json!({ "query": "phone" }))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidArguments);
    assert_eq!(err.field.as_deref(), Some("indexName"));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_run_query_builds_search_body() {
    let backend = MockBackend::new(vec![Ok(json!({ "hits": [], "nbHits": 0 }))]);
    let dispatcher = dispatcher_for(&["search"], credentials(), backend.clone());

    let output = dispatcher
        .call(
            "run_query",
            json!({
                "query": "phone",
                "indexName": "products",
                "hitsPerPage": 5,
                "facets": "brand, category",
            }),
        )
        .await
        .unwrap();
    assert_eq!(output.label, "query results");

    let request = &backend.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path(), "/1/indexes/products/query");
    assert_eq!(
        request.body,
        Some(json!({
            "query": "phone",
            "hitsPerPage": 5,
            "facets": ["brand", "category"],
        }))
    );
}

#[tokio::test]
async fn test_move_index_sends_move_operation() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(
        &["search_write"],
        credentials().with_index_name("staging"),
        backend.clone(),
    );

    dispatcher
        .call("move_index", json!({ "indexName": "production" }))
        .await
        .unwrap();

    let request = &backend.requests()[0];
    assert_eq!(request.path(), "/1/indexes/staging/operation");
    assert_eq!(
        request.body,
        Some(json!({ "operation": "move", "destination": "production" }))
    );
    assert_eq!(request.auth.as_ref().unwrap().api_key, "write-key");
}

pub struct Explode;

#[tool(name = "explode", description = "Always panics", label = "never")]
impl Explode {
    async fn call(&self, _ctx: &InvocationContext, _params: NoParams) -> Result<Value, ToolError> {
        panic!("boom")
    }
}

pub struct Fail;

#[tool(name = "fail", description = "Always fails", label = "never")]
impl Fail {
    async fn call(&self, _ctx: &InvocationContext, _params: NoParams) -> Result<Value, ToolError> {
        Err(ToolError::Error("upstream exploded".to_string()))
    }
}

fn local_dispatcher() -> Dispatcher {
    let mut builder = Registry::builder();
    builder
        .register_toolset(
            "local",
            vec![
                ToolDescriptor::from_tool(Explode).unwrap(),
                ToolDescriptor::from_tool(Fail).unwrap(),
            ],
        )
        .unwrap();
    Dispatcher::new(builder.build(), Credentials::default(), Arc::new(MockBackend::default()))
}

#[tokio::test]
async fn test_handler_error_carries_message() {
    let dispatcher = local_dispatcher();

    let err = dispatcher.call("fail", json!({})).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::HandlerError);
    assert!(err.message.contains("upstream exploded"));
}

#[tokio::test]
async fn test_panicking_handler_is_contained() {
    let dispatcher = local_dispatcher();

    let err = dispatcher.call("explode", json!({})).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::HandlerError);
    assert!(err.message.contains("boom"));

    // The dispatcher keeps serving after a panic.
    let err = dispatcher.call("fail", json!({})).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::HandlerError);
}

#[tokio::test]
async fn test_cancellation_aborts_pending_call() {
    let config = config_with(&["monitoring"], credentials());
    let registry = build_registry(&config).unwrap();
    let dispatcher = Dispatcher::new(registry, config.credentials, Arc::new(HangingBackend));

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        dispatcher.invoke(
            InvocationRequest::new("monitoring_get_clusters_status", json!({})),
            token,
        ),
    )
    .await
    .expect("cancelled call should return promptly");

    let err = result.unwrap_err();
    assert_eq!(err.kind, ErrorKind::HandlerError);
    assert!(err.message.contains("cancelled"));
}

#[tokio::test]
async fn test_concurrent_invocations_are_independent() {
    let backend = MockBackend::default();
    let dispatcher = dispatcher_for(&["monitoring"], credentials(), backend.clone());

    let calls = ["c1-de", "c2-de", "c3-de"].map(|cluster| {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            dispatcher
                .call("monitoring_get_latency", json!({ "clusters": cluster }))
                .await
        })
    });

    for call in calls {
        let output = call.await.unwrap().unwrap();
        assert_eq!(output.label, "Latency");
    }

    let mut paths: Vec<String> = backend.requests().iter().map(|r| r.path()).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec!["/1/latency/c1-de", "/1/latency/c2-de", "/1/latency/c3-de"]
    );
}
