mod common;

use algolia_mcp::dispatch::Dispatcher;
use algolia_mcp::mcp::AlgoliaMcpServer;
use algolia_mcp::providers::build_registry;
use common::{config_with, credentials, MockBackend};
use rmcp::model::{CallToolRequestParam, CallToolResult, RawContent};
use rmcp::ServiceExt;
use serde_json::{json, Value};
use std::sync::Arc;

fn server_with(backend: MockBackend) -> AlgoliaMcpServer {
    let config = config_with(&["usage", "monitoring"], credentials());
    let registry = build_registry(&config).unwrap();
    AlgoliaMcpServer::new(Dispatcher::new(registry, config.credentials, Arc::new(backend)))
}

fn body_of(result: &CallToolResult) -> Value {
    match &result.content[0].raw {
        RawContent::Text(text) => serde_json::from_str(&text.text).unwrap(),
        other => panic!("expected text content, got {:?}", other),
    }
}

#[tokio::test]
async fn test_round_trip_over_duplex() {
    let backend = MockBackend::new(vec![Ok(json!({ "c1-de": 12 }))]);
    let server = server_with(backend.clone());

    let (client_transport, server_transport) = tokio::io::duplex(4096);
    tokio::spawn(async move {
        let service = server
            .serve(server_transport)
            .await
            .expect("Failed to start server");
        service.waiting().await.expect("Server error");
    });

    let client = ().serve(client_transport).await.unwrap();

    let info = client.peer_info().unwrap();
    assert_eq!(info.server_info.name, "algolia-mcp");

    let tools = client.list_tools(Default::default()).await.unwrap().tools;
    assert_eq!(tools.len(), 12);
    let daily = tools
        .iter()
        .find(|tool| tool.name == "usage_get_daily_metrics")
        .unwrap();
    assert!(daily.input_schema.contains_key("properties"));

    let result = client
        .call_tool(CallToolRequestParam {
            name: "monitoring_get_latency".into(),
            arguments: json!({ "clusters": "c1-de" }).as_object().cloned(),
        })
        .await
        .unwrap();
    assert_eq!(result.is_error, Some(false));
    assert_eq!(
        body_of(&result),
        json!({ "label": "Latency", "payload": { "c1-de": 12 } })
    );
    assert_eq!(backend.requests()[0].path(), "/1/latency/c1-de");

    let result = client
        .call_tool(CallToolRequestParam {
            name: "does_not_exist".into(),
            arguments: None,
        })
        .await
        .unwrap();
    assert_eq!(result.is_error, Some(true));
    assert_eq!(body_of(&result)["kind"], "ToolNotFound");

    let result = client
        .call_tool(CallToolRequestParam {
            name: "usage_get_daily_metrics".into(),
            arguments: json!({ "applications": "APPID1" }).as_object().cloned(),
        })
        .await
        .unwrap();
    assert_eq!(result.is_error, Some(true));
    let body = body_of(&result);
    assert_eq!(body["kind"], "InvalidArguments");
    assert!(body["field"].is_string());

    client.cancel().await.unwrap();
}
