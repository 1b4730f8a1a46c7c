//! Toolset providers: the catalogue of Algolia tools, grouped the way they are enabled.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{Config, Credentials};
use crate::registry::{Registry, RegistryError};
use crate::tools::{ToolDescriptor, ToolError};

pub mod abtesting;
pub mod analytics;
pub mod collections;
pub mod ingestion;
pub mod monitoring;
pub mod query_suggestions;
pub mod recommend;
pub mod search;
pub mod usage;

/// A named group of tools that is enabled or disabled as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toolset {
    Abtesting,
    Analytics,
    Collections,
    Ingestion,
    Monitoring,
    QuerySuggestions,
    Recommend,
    /// Read and write search tools together.
    Search,
    SearchRead,
    SearchWrite,
    Usage,
}

impl Toolset {
    pub const ALL: [Toolset; 11] = [
        Toolset::Abtesting,
        Toolset::Analytics,
        Toolset::Collections,
        Toolset::Ingestion,
        Toolset::Monitoring,
        Toolset::QuerySuggestions,
        Toolset::Recommend,
        Toolset::Search,
        Toolset::SearchRead,
        Toolset::SearchWrite,
        Toolset::Usage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Toolset::Abtesting => "abtesting",
            Toolset::Analytics => "analytics",
            Toolset::Collections => "collections",
            Toolset::Ingestion => "ingestion",
            Toolset::Monitoring => "monitoring",
            Toolset::QuerySuggestions => "querysuggestions",
            Toolset::Recommend => "recommend",
            Toolset::Search => "search",
            Toolset::SearchRead => "search_read",
            Toolset::SearchWrite => "search_write",
            Toolset::Usage => "usage",
        }
    }

    /// Toolsets that refuse to start without a write key when explicitly requested.
    pub fn requires_write_key(&self) -> bool {
        matches!(self, Toolset::SearchWrite | Toolset::Ingestion)
    }

    pub fn descriptors(&self, config: &Config) -> Result<Vec<ToolDescriptor>, RegistryError> {
        match self {
            Toolset::Abtesting => abtesting::descriptors(),
            Toolset::Analytics => analytics::descriptors(),
            Toolset::Collections => collections::descriptors(),
            Toolset::Ingestion => ingestion::descriptors(config.region),
            Toolset::Monitoring => monitoring::descriptors(),
            Toolset::QuerySuggestions => query_suggestions::descriptors(),
            Toolset::Recommend => recommend::descriptors(),
            Toolset::Search => {
                let mut descriptors = search::read_descriptors()?;
                descriptors.extend(search::write_descriptors()?);
                Ok(descriptors)
            }
            Toolset::SearchRead => search::read_descriptors(),
            Toolset::SearchWrite => search::write_descriptors(),
            Toolset::Usage => usage::descriptors(),
        }
    }
}

impl fmt::Display for Toolset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Toolset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Toolset::ALL
            .into_iter()
            .find(|toolset| toolset.as_str() == s)
            .ok_or_else(|| format!("unknown toolset `{}`", s))
    }
}

fn require_write_key(toolset: &str, credentials: &Credentials) -> Result<(), RegistryError> {
    credentials
        .write()
        .map(|_| ())
        .map_err(|e| RegistryError::MissingCredentials {
            toolset: toolset.to_string(),
            message: e.to_string(),
        })
}

/// Build the registry for a configuration.
///
/// Enabled toolsets are registered in catalogue order. `search` supersedes
/// `search_read`/`search_write`. Tools gated on an ACL the key does not hold are left out.
pub fn build_registry(config: &Config) -> Result<Registry, RegistryError> {
    for name in config.toolsets.names() {
        if name.parse::<Toolset>().is_err() {
            warn!("Ignoring unknown toolset {} in MCP_ENABLED_TOOLS", name);
        }
    }

    let search_enabled = Registry::is_enabled(Toolset::Search.as_str(), &config.toolsets);
    let mut builder = Registry::builder();

    for toolset in Toolset::ALL {
        let name = toolset.as_str();
        if !Registry::is_enabled(name, &config.toolsets) {
            continue;
        }
        let needs_write_key = toolset.requires_write_key() && config.toolsets.is_explicit(name);
        if search_enabled && matches!(toolset, Toolset::SearchRead | Toolset::SearchWrite) {
            // An explicit write toolset still demands its key even when search covers it.
            if needs_write_key {
                require_write_key(name, &config.credentials)?;
            }
            info!("Skipping toolset {}: covered by search", name);
            continue;
        }

        builder.register_toolset_with(name, &config.credentials, |credentials| {
            if needs_write_key {
                require_write_key(name, credentials)?;
            }

            let descriptors = toolset.descriptors(config)?;
            Ok(descriptors
                .into_iter()
                .filter(|descriptor| match descriptor.required_acl() {
                    Some(acl) if !config.grants(acl) => {
                        info!(
                            "Skipping tool {}: API key lacks the {} ACL",
                            descriptor.name(),
                            acl
                        );
                        false
                    }
                    _ => true,
                })
                .collect())
        })?;
    }

    let registry = builder.build();
    info!(
        "Registered {} tools from toolsets: {}",
        registry.len(),
        registry.toolsets().join(", ")
    );
    Ok(registry)
}

/// Parameters of tools that take no arguments.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct NoParams {}

/// Split a comma-separated argument, dropping blanks.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Like [`split_list`], failing when nothing is left.
pub(crate) fn require_list(field: &str, raw: &str) -> Result<Vec<String>, ToolError> {
    let items = split_list(raw);
    if items.is_empty() {
        return Err(ToolError::invalid_argument(
            field,
            format!("{} must contain at least one value", field),
        ));
    }
    Ok(items)
}

/// Fail on an empty or blank string argument.
pub(crate) fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::invalid_argument(
            field,
            format!("{} parameter is required", field),
        ));
    }
    Ok(value)
}

/// Decode an argument that carries JSON inside a string.
pub(crate) fn parse_json_arg<T: DeserializeOwned>(field: &str, raw: &str) -> Result<T, ToolError> {
    serde_json::from_str(raw)
        .map_err(|e| ToolError::invalid_argument(field, format!("invalid {} JSON: {}", field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_require_list_rejects_blank() {
        let err = require_list("applications", " ,").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { ref field, .. } if field == "applications"));
    }

    #[test]
    fn test_parse_json_arg() {
        let parsed: Vec<Value> = parse_json_arg("variants", r#"[{"index":"a"},{"index":"b"}]"#).unwrap();
        assert_eq!(parsed.len(), 2);

        let err = parse_json_arg::<Vec<Value>>("variants", "[oops").unwrap_err();
        assert!(err.to_string().contains("invalid variants JSON"));
    }

    #[test]
    fn test_toolset_round_trips_names() {
        for toolset in Toolset::ALL {
            assert_eq!(toolset.as_str().parse::<Toolset>().unwrap(), toolset);
        }
        assert!("searchh".parse::<Toolset>().is_err());
    }
}
