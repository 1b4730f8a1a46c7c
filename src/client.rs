//! Backend abstraction: what a handler asks of the Algolia APIs.
//!
//! Handlers describe a call as an [`ApiRequest`] and pass it to an [`AlgoliaBackend`].
//! The production backend is [`crate::http::HttpBackend`]; tests substitute their own.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Method;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ApiKey;
use crate::tools::ToolError;

/// Data residency region of the regional Algolia APIs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            other => Err(format!("unknown region `{}` (expected `us` or `eu`)", other)),
        }
    }
}

/// Which Algolia API a request goes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Host {
    /// Search and Recommend API of one application.
    Search(String),
    Analytics,
    Usage,
    Status,
    Experiences,
    QuerySuggestions(Region),
    Ingestion(Region),
}

impl Host {
    pub fn base_url(&self) -> String {
        match self {
            Host::Search(app_id) => format!("https://{}.algolia.net", app_id),
            Host::Analytics => "https://analytics.algolia.com".to_string(),
            Host::Usage => "https://usage.algolia.com".to_string(),
            Host::Status => "https://status.algolia.com".to_string(),
            Host::Experiences => "https://experiences.algolia.com".to_string(),
            Host::QuerySuggestions(region) => {
                format!("https://query-suggestions.{}.algolia.com", region)
            }
            Host::Ingestion(region) => format!("https://data.{}.algolia.com", region),
        }
    }
}

/// Application ID and API key sent with a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Auth {
    pub app_id: String,
    pub api_key: String,
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl From<ApiKey<'_>> for Auth {
    fn from(key: ApiKey<'_>) -> Self {
        Self {
            app_id: key.app_id.to_string(),
            api_key: key.api_key.to_string(),
        }
    }
}

/// One call to an Algolia REST endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub host: Host,
    /// Path segments, unencoded. The backend percent-encodes each one.
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub auth: Option<Auth>,
}

impl ApiRequest {
    /// Start a request. `path` is a fixed route such as `/2/abtests`; dynamic parts
    /// are appended with [`segment`](Self::segment) so they get encoded.
    pub fn new(method: Method, host: Host, path: &str) -> Self {
        Self {
            method,
            host,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            body: None,
            auth: None,
        }
    }

    pub fn get(host: Host, path: &str) -> Self {
        Self::new(Method::GET, host, path)
    }

    pub fn post(host: Host, path: &str) -> Self {
        Self::new(Method::POST, host, path)
    }

    pub fn put(host: Host, path: &str) -> Self {
        Self::new(Method::PUT, host, path)
    }

    pub fn delete(host: Host, path: &str) -> Self {
        Self::new(Method::DELETE, host, path)
    }

    pub fn segment(mut self, segment: impl ToString) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter only when a value is present.
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn auth(mut self, key: ApiKey<'_>) -> Self {
        self.auth = Some(key.into());
        self
    }

    /// Unencoded path, e.g. `/2/abtests/42`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// First value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Sends [`ApiRequest`]s and returns the decoded JSON body.
///
/// Implementations return `Ok` for any 2xx status (an empty body decodes as `null`) and
/// [`ToolError::Api`] carrying the status and remote message otherwise.
#[async_trait]
pub trait AlgoliaBackend: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, ToolError>;
}
