//! The per-call execution path shared by every tool.
//!
//! [`Dispatcher::invoke`] looks the tool up, validates and normalizes the arguments
//! against its schema, runs the handler on its own task and maps the outcome to an
//! [`InvocationResult`]. Nothing here depends on which Algolia API a tool talks to.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{AlgoliaBackend, ApiRequest};
use crate::config::Credentials;
use crate::registry::Registry;
use crate::result::{InvocationError, InvocationResult, ToolOutput};
use crate::tools::ToolError;

/// Ambient state handed to a handler: credentials, the backend and the cancellation signal.
#[derive(Clone)]
pub struct InvocationContext {
    credentials: Arc<Credentials>,
    backend: Arc<dyn AlgoliaBackend>,
    cancellation: CancellationToken,
}

impl InvocationContext {
    pub fn new(
        credentials: Arc<Credentials>,
        backend: Arc<dyn AlgoliaBackend>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            credentials,
            backend,
            cancellation,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Send a request through the backend, giving up as soon as the call is cancelled.
    pub async fn send(&self, request: ApiRequest) -> Result<Value, ToolError> {
        if self.cancellation.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(ToolError::Cancelled),
            result = self.backend.send(request) => result,
        }
    }
}

/// A call as received from the transport: tool name and raw argument bag.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub name: String,
    pub arguments: Value,
}

impl InvocationRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Runs invocations against a frozen registry.
///
/// Cheap to clone; every clone shares the registry, credentials and backend.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    credentials: Arc<Credentials>,
    backend: Arc<dyn AlgoliaBackend>,
}

impl Dispatcher {
    pub fn new(registry: Registry, credentials: Credentials, backend: Arc<dyn AlgoliaBackend>) -> Self {
        Self {
            registry: Arc::new(registry),
            credentials: Arc::new(credentials),
            backend,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Invoke a tool without an external cancellation signal.
    pub async fn call(&self, name: &str, arguments: Value) -> InvocationResult {
        self.invoke(InvocationRequest::new(name, arguments), CancellationToken::new())
            .await
    }

    /// Run one invocation. Every failure comes back as an [`InvocationError`]; this
    /// never panics, even when the handler does.
    pub async fn invoke(
        &self,
        request: InvocationRequest,
        cancellation: CancellationToken,
    ) -> InvocationResult {
        let InvocationRequest { name, arguments } = request;
        info!("Tool call requested: {}", name);

        let Some(descriptor) = self.registry.lookup(&name) else {
            warn!("Tool {} not found", name);
            return Err(InvocationError::tool_not_found(&name));
        };

        debug!("Tool arguments: {}", arguments);
        let arguments = descriptor.schema().validate(arguments).map_err(|e| {
            warn!("Tool {} rejected arguments: {}", name, e);
            InvocationError::from(e)
        })?;

        let handler = descriptor.handler();
        let ctx = InvocationContext::new(
            self.credentials.clone(),
            self.backend.clone(),
            cancellation.clone(),
        );

        let mut task = tokio::spawn(async move { handler.handle(&ctx, arguments).await });

        let joined = tokio::select! {
            joined = &mut task => joined,
            _ = cancellation.cancelled() => {
                task.abort();
                warn!("Tool {} cancelled", name);
                return Err(InvocationError::handler(ToolError::Cancelled.to_string()));
            }
        };

        match joined {
            Ok(Ok(payload)) => {
                info!("Tool {} executed successfully", name);
                debug!("Tool result: {}", payload);
                Ok(ToolOutput::new(descriptor.label(), payload))
            }
            Ok(Err(e)) => {
                warn!("Tool {} execution failed: {}", name, e);
                Err(InvocationError::from(e))
            }
            Err(e) => {
                let message = join_error_message(e);
                warn!("Tool {} aborted: {}", name, message);
                Err(InvocationError::handler(message))
            }
        }
    }
}

fn join_error_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }

    let payload: Box<dyn Any + Send> = err.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("handler panicked: {}", detail)
}
