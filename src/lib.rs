//! # algolia-mcp - Algolia tools over the Model Context Protocol
//!
//! Exposes the Algolia APIs (search, analytics, A/B testing, monitoring, ingestion,
//! collections, query suggestions, recommendations, usage) as MCP tools that an
//! LLM-driven client can call as structured functions.
//!
//! ## Architecture
//!
//! Every tool goes through the same path:
//!
//! 1. **Tools** bind a typed parameter struct to an async handler with the
//!    [`tool`] attribute. The input schema is derived from the parameter type.
//! 2. **Providers** group tools into toolsets that can be enabled or disabled at startup.
//! 3. The **Registry** holds the enabled tools, keyed by name, and is immutable once built.
//! 4. The **Dispatcher** looks a call up, validates and decodes its arguments, runs the
//!    handler on its own task and maps the outcome to an [`InvocationResult`].
//! 5. The MCP server ([`mcp::AlgoliaMcpServer`]) drives the dispatcher from `rmcp`.
//!
//! Handlers never talk to the network directly: they build an [`client::ApiRequest`]
//! and hand it to the [`client::AlgoliaBackend`] carried by the invocation context.
//!
//! ## Example
//! ```no_run
//! use algolia_mcp::config::Config;
//! use algolia_mcp::mcp::AlgoliaMcpServer;
//! use rmcp::ServiceExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let server = AlgoliaMcpServer::from_config(&config)?;
//!     let service = server.serve(rmcp::transport::stdio()).await?;
//!     service.waiting().await?;
//!     Ok(())
//! }
//! ```

// Lets the code generated by `#[tool]` name this crate the same way from inside and outside.
extern crate self as algolia_mcp;

pub mod client;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod mcp;
pub mod providers;
pub mod registry;
pub mod result;
pub mod schema;
pub mod tools;

pub use client::{AlgoliaBackend, ApiRequest, Host, Region};
pub use config::{Config, Credentials, EnabledToolsets};
pub use dispatch::{Dispatcher, InvocationContext, InvocationRequest};
pub use registry::{Registry, RegistryBuilder, RegistryError};
pub use result::{ErrorKind, InvocationError, InvocationResult, ToolOutput};
pub use tools::{Tool, ToolDescriptor, ToolError};

// Re-export rmcp for convenience
pub use rmcp;

// Re-export the proc macro attribute
pub use algolia_mcp_macros::tool;

#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
    pub use serde_json;
}
