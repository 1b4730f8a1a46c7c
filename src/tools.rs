//! Tool system: typed parameters bound to async handlers.
//!
//! A tool is written once as a struct plus an `impl` block annotated with
//! [`tool`](crate::tool); the attribute generates the [`Tool`] implementation. The
//! registry never sees the concrete type: [`ToolDescriptor::from_tool`] erases it behind
//! a [`Handler`] and pairs it with the schema derived from the same parameter type.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::dispatch::InvocationContext;
use crate::registry::RegistryError;
use crate::schema::InputSchema;

/// Error type for tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Credentials needed by the tool are not configured.
    #[error("{0}")]
    MissingCredentials(String),

    /// Arguments passed schema validation but could not be decoded into the parameter type.
    #[error("Invalid arguments: {0}")]
    Arguments(serde_json::Error),

    /// A handler-level argument check failed (malformed embedded JSON, empty list, ...).
    #[error("Invalid argument `{field}`: {message}")]
    InvalidArgument { field: String, message: String },

    /// The Algolia API answered with a non-2xx status.
    #[error("Algolia API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The handler output could not be serialized.
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invocation cancelled")]
    Cancelled,

    #[error("Tool error: {0}")]
    Error(String),
}

impl ToolError {
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A named, typed remote operation.
///
/// Implemented by the `#[tool]` attribute; write the handler as an inherent
/// `async fn call(&self, ctx, params)` and let the macro fill this in.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    /// Parameter type decoded from the call arguments. Its schema is the tool's input schema.
    type Params: DeserializeOwned + JsonSchema + Send + 'static;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Short tag attached to successful results (e.g. "query results").
    fn label(&self) -> &'static str;

    /// API key ACL the tool needs, when it is gated on one.
    fn required_acl(&self) -> Option<&'static str> {
        None
    }

    async fn execute(&self, ctx: &InvocationContext, params: Self::Params)
        -> Result<Value, ToolError>;
}

/// Type-erased handler: takes validated JSON arguments, returns a JSON payload.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &InvocationContext, arguments: Value) -> Result<Value, ToolError>;
}

struct TypedHandler<T>(T);

#[async_trait]
impl<T: Tool> Handler for TypedHandler<T> {
    async fn handle(&self, ctx: &InvocationContext, arguments: Value) -> Result<Value, ToolError> {
        let params: T::Params = serde_json::from_value(arguments).map_err(ToolError::Arguments)?;
        self.0.execute(ctx, params).await
    }
}

/// The unit of registration: a name, its documentation and input schema, and the handler
/// that consumes arguments of exactly that schema.
///
/// Immutable once bound; clones share the schema and handler.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    label: String,
    required_acl: Option<String>,
    schema: InputSchema,
    handler: Arc<dyn Handler>,
}

impl ToolDescriptor {
    /// Pair a schema with a handler. Only the name is checked.
    ///
    /// The label defaults to the tool name.
    pub fn bind(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: InputSchema,
        handler: Arc<dyn Handler>,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        Ok(Self {
            label: name.clone(),
            name,
            description: description.into(),
            required_acl: None,
            schema,
            handler,
        })
    }

    /// Build a descriptor from a typed tool, deriving the schema from its parameter type.
    pub fn from_tool<T: Tool>(tool: T) -> Result<Self, RegistryError> {
        let schema =
            InputSchema::describe::<T::Params>().map_err(|source| RegistryError::MalformedSchema {
                tool: tool.name().to_string(),
                source,
            })?;

        let (name, description, label) = (tool.name(), tool.description(), tool.label());
        let required_acl = tool.required_acl();

        let mut descriptor =
            Self::bind(name, description, schema, Arc::new(TypedHandler(tool)))?.with_label(label);
        descriptor.required_acl = required_acl.map(str::to_string);
        Ok(descriptor)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_required_acl(mut self, acl: impl Into<String>) -> Self {
        self.required_acl = Some(acl.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn required_acl(&self) -> Option<&str> {
        self.required_acl.as_deref()
    }

    pub fn schema(&self) -> &InputSchema {
        &self.schema
    }

    pub(crate) fn handler(&self) -> Arc<dyn Handler> {
        self.handler.clone()
    }

    /// The MCP tool definition advertised in `tools/list`.
    pub fn to_mcp_tool(&self) -> rmcp::model::Tool {
        rmcp::model::Tool::new(self.name.clone(), self.description.clone(), self.schema.as_json())
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("required_acl", &self.required_acl)
            .finish_non_exhaustive()
    }
}
