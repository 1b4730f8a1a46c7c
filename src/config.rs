//! Process configuration: enabled toolsets, credentials and transport options.
//!
//! Everything is read once at startup. Handlers receive the resulting [`Credentials`]
//! through their invocation context and never look at the environment themselves.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::client::Region;
use crate::tools::ToolError;

/// Toolsets that are never enabled by default and must be listed explicitly.
pub const OPT_IN_TOOLSETS: &[&str] = &["search_read", "search_write", "ingestion"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Which toolsets to register.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnabledToolsets {
    /// Nothing configured: everything except [`OPT_IN_TOOLSETS`].
    #[default]
    Default,
    /// An explicit, lower-cased selection.
    Explicit(BTreeSet<String>),
}

impl EnabledToolsets {
    /// Parse a comma-separated list. A blank list means the default selection.
    pub fn parse(list: &str) -> Self {
        let names: BTreeSet<String> = list
            .split(',')
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() {
            EnabledToolsets::Default
        } else {
            EnabledToolsets::Explicit(names)
        }
    }

    pub fn explicit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        EnabledToolsets::Explicit(
            names
                .into_iter()
                .map(|name| name.as_ref().to_ascii_lowercase())
                .collect(),
        )
    }

    pub fn contains(&self, toolset: &str) -> bool {
        match self {
            EnabledToolsets::Default => !OPT_IN_TOOLSETS.contains(&toolset),
            EnabledToolsets::Explicit(names) => names.contains(toolset),
        }
    }

    /// True only when the toolset was named in an explicit selection.
    pub fn is_explicit(&self, toolset: &str) -> bool {
        matches!(self, EnabledToolsets::Explicit(names) if names.contains(toolset))
    }

    /// Explicitly selected names, if any.
    pub fn names(&self) -> Vec<&str> {
        match self {
            EnabledToolsets::Default => Vec::new(),
            EnabledToolsets::Explicit(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// An application ID paired with one of its API keys.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ApiKey<'a> {
    pub app_id: &'a str,
    pub api_key: &'a str,
}

impl fmt::Debug for ApiKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Algolia credentials resolved at startup, shared read-only by every invocation.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub write_api_key: Option<String>,
    /// Default index for index-scoped search tools.
    pub index_name: Option<String>,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn with_write_api_key(mut self, key: impl Into<String>) -> Self {
        self.write_api_key = Some(key.into());
        self
    }

    pub fn with_index_name(mut self, index: impl Into<String>) -> Self {
        self.index_name = Some(index.into());
        self
    }

    /// App ID and read key.
    pub fn read(&self) -> Result<ApiKey<'_>, ToolError> {
        match (self.app_id.as_deref(), self.api_key.as_deref()) {
            (Some(app_id), Some(api_key)) => Ok(ApiKey { app_id, api_key }),
            _ => Err(ToolError::MissingCredentials(
                "ALGOLIA_APP_ID and ALGOLIA_API_KEY environment variables are required".to_string(),
            )),
        }
    }

    /// App ID and write key.
    pub fn write(&self) -> Result<ApiKey<'_>, ToolError> {
        match (self.app_id.as_deref(), self.write_api_key.as_deref()) {
            (Some(app_id), Some(api_key)) => Ok(ApiKey { app_id, api_key }),
            _ => Err(ToolError::MissingCredentials(
                "ALGOLIA_APP_ID and ALGOLIA_WRITE_API_KEY environment variables are required"
                    .to_string(),
            )),
        }
    }

    pub fn has_write_access(&self) -> bool {
        self.write().is_ok()
    }

    /// The index a call targets: the explicit argument, else the configured default.
    pub fn index_or_default(&self, explicit: Option<String>) -> Result<String, ToolError> {
        explicit
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.index_name.clone())
            .ok_or_else(|| {
                ToolError::invalid_argument(
                    "indexName",
                    "indexName is required when ALGOLIA_INDEX_NAME is not set",
                )
            })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("api_key", &redact(&self.api_key))
            .field("write_api_key", &redact(&self.write_api_key))
            .field("index_name", &self.index_name)
            .finish()
    }
}

/// How outbound Algolia requests travel: client timeout, proxy and fixed extra headers.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Whole-request timeout; `None` keeps reqwest's default.
    pub timeout: Option<Duration>,
    pub proxy: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy = Some(proxy_url.into());
        self
    }

    /// Add a header sent with every Algolia request.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Everything the server needs to start.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub toolsets: EnabledToolsets,
    pub credentials: Credentials,
    /// ACLs granted to the API key. `None` disables ACL gating.
    pub acl: Option<BTreeSet<String>>,
    /// Region of the ingestion API.
    pub region: Region,
    pub transport: TransportOptions,
    /// Send every request to this base URL instead of the per-API hosts.
    pub base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let toolsets = get("MCP_ENABLED_TOOLS")
            .map(|list| EnabledToolsets::parse(&list))
            .unwrap_or_default();

        let credentials = Credentials {
            app_id: get("ALGOLIA_APP_ID"),
            api_key: get("ALGOLIA_API_KEY"),
            write_api_key: get("ALGOLIA_WRITE_API_KEY"),
            index_name: get("ALGOLIA_INDEX_NAME"),
        };

        let acl = get("ALGOLIA_ACL").map(|list| {
            list.split(',')
                .map(|acl| acl.trim().to_string())
                .filter(|acl| !acl.is_empty())
                .collect()
        });

        let region = match get("ALGOLIA_REGION") {
            Some(region) => region.parse().map_err(|message| ConfigError::Invalid {
                var: "ALGOLIA_REGION",
                message,
            })?,
            None => Region::default(),
        };

        let mut transport = TransportOptions::new();
        if let Some(secs) = get("ALGOLIA_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e| ConfigError::Invalid {
                var: "ALGOLIA_TIMEOUT_SECS",
                message: format!("{}", e),
            })?;
            transport = transport.with_timeout(Duration::from_secs(secs));
        }
        if let Some(proxy) = get("ALGOLIA_HTTP_PROXY") {
            transport = transport.with_proxy(proxy);
        }

        Ok(Self {
            toolsets,
            credentials,
            acl,
            region,
            transport,
            base_url: get("ALGOLIA_API_BASE_URL"),
        })
    }

    /// Whether a tool gated on `acl` may be registered.
    pub fn grants(&self, acl: &str) -> bool {
        match &self.acl {
            Some(granted) => granted.contains(acl),
            None => true,
        }
    }
}
