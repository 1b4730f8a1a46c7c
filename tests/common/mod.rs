#![allow(dead_code)]

use algolia_mcp::client::{AlgoliaBackend, ApiRequest};
use algolia_mcp::config::{Config, Credentials, EnabledToolsets};
use algolia_mcp::tools::ToolError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Records every request and replays canned responses in order.
///
/// Once the canned responses run out it answers `{}`.
#[derive(Clone, Default)]
pub struct MockBackend {
    pub requests: Arc<Mutex<Vec<ApiRequest>>>,
    responses: Arc<Mutex<Vec<Result<Value, ToolError>>>>,
}

impl MockBackend {
    pub fn new(responses: Vec<Result<Value, ToolError>>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(responses)),
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlgoliaBackend for MockBackend {
    async fn send(&self, request: ApiRequest) -> Result<Value, ToolError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(json!({}))
        } else {
            responses.remove(0)
        }
    }
}

/// Never answers.
#[derive(Clone, Default)]
pub struct HangingBackend;

#[async_trait]
impl AlgoliaBackend for HangingBackend {
    async fn send(&self, _request: ApiRequest) -> Result<Value, ToolError> {
        std::future::pending().await
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("APPID1", "read-key").with_write_api_key("write-key")
}

pub fn config_with(toolsets: &[&str], credentials: Credentials) -> Config {
    Config {
        toolsets: EnabledToolsets::explicit(toolsets.iter().copied()),
        credentials,
        ..Default::default()
    }
}
