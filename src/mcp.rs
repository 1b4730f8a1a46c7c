//! MCP server surface: lists the registry and routes `tools/call` through the dispatcher.

use std::future::Future;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::dispatch::{Dispatcher, InvocationRequest};
use crate::http::HttpBackend;
use crate::providers::build_registry;
use crate::registry::RegistryError;
use crate::result::InvocationResult;
use crate::tools::ToolError;

const INSTRUCTIONS: &str = "Tools for the Algolia APIs. Every result is a JSON object with a \
    `label` naming what was returned and the raw API response under `payload`.";

/// Startup failures. Nothing here can happen once the server is serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("could not set up the HTTP backend: {0}")]
    Backend(#[from] ToolError),
}

#[derive(Clone)]
pub struct AlgoliaMcpServer {
    dispatcher: Dispatcher,
}

impl AlgoliaMcpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Build the registry, the HTTP backend and the dispatcher for `config`.
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        let registry = build_registry(config)?;

        let mut backend = HttpBackend::new(config.transport.clone())?;
        if let Some(base_url) = &config.base_url {
            info!("Routing Algolia requests through {}", base_url);
            backend = backend.with_base_url(base_url)?;
        }

        let dispatcher = Dispatcher::new(registry, config.credentials.clone(), Arc::new(backend));
        Ok(Self::new(dispatcher))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

/// Per-call failures are tool results flagged as errors, never protocol errors.
pub fn encode_result(result: InvocationResult) -> CallToolResult {
    match result.and_then(|output| output.to_json()) {
        Ok(body) => CallToolResult::success(vec![Content::text(body)]),
        Err(err) => CallToolResult::error(vec![Content::text(err.to_json().to_string())]),
    }
}

impl ServerHandler for AlgoliaMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(INSTRUCTIONS.into()),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            let tools = self
                .dispatcher
                .registry()
                .descriptors()
                .map(|descriptor| descriptor.to_mcp_tool())
                .collect();
            Ok(ListToolsResult::with_all_items(tools))
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);
            let invocation = InvocationRequest::new(request.name.to_string(), arguments);
            let result = self.dispatcher.invoke(invocation, context.ct).await;
            Ok(encode_result(result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{InvocationError, ToolOutput};
    use rmcp::model::RawContent;
    use serde_json::json;

    fn text_of(result: &CallToolResult) -> Value {
        match &result.content[0].raw {
            RawContent::Text(text) => serde_json::from_str(&text.text).unwrap(),
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_encode_success() {
        let result = encode_result(Ok(ToolOutput::new("Latency", json!({"c1-de": 12}))));
        assert_eq!(result.is_error, Some(false));
        assert_eq!(
            text_of(&result),
            json!({"label": "Latency", "payload": {"c1-de": 12}})
        );
    }

    #[test]
    fn test_encode_failure() {
        let result = encode_result(Err(InvocationError::tool_not_found("nope")));
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result)["kind"], "ToolNotFound");
    }
}
