//! Tool registry: name to descriptor, grouped by toolset.
//!
//! A [`RegistryBuilder`] is filled at startup and frozen into a [`Registry`], which has no
//! mutating methods and is shared read-only across all invocations.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::config::{Credentials, EnabledToolsets};
use crate::schema::SchemaError;
use crate::tools::ToolDescriptor;

/// Startup-fatal registration errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name `{name}` (registered by `{existing}`, again by `{toolset}`)")]
    DuplicateTool {
        name: String,
        existing: String,
        toolset: String,
    },

    #[error("tool name must not be empty")]
    EmptyName,

    #[error("malformed input schema for tool `{tool}`: {source}")]
    MalformedSchema {
        tool: String,
        #[source]
        source: SchemaError,
    },

    #[error("toolset `{toolset}` is enabled but {message}")]
    MissingCredentials { toolset: String, message: String },
}

#[derive(Debug, Clone)]
struct Entry {
    toolset: String,
    descriptor: ToolDescriptor,
}

/// Collects descriptors during startup.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    tools: BTreeMap<String, Entry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single descriptor outside any named toolset.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<&mut Self, RegistryError> {
        self.register_toolset("default", vec![descriptor])
    }

    /// Register a batch of descriptors under a toolset name.
    ///
    /// All-or-nothing: if any name collides, with the registry or within the batch,
    /// nothing from the batch is inserted.
    pub fn register_toolset(
        &mut self,
        toolset: &str,
        descriptors: Vec<ToolDescriptor>,
    ) -> Result<&mut Self, RegistryError> {
        let mut staged: BTreeMap<String, Entry> = BTreeMap::new();

        for descriptor in descriptors {
            let name = descriptor.name().to_string();
            let existing = self
                .tools
                .get(&name)
                .or_else(|| staged.get(&name))
                .map(|entry| entry.toolset.clone());

            if let Some(existing) = existing {
                return Err(RegistryError::DuplicateTool {
                    name,
                    existing,
                    toolset: toolset.to_string(),
                });
            }

            staged.insert(
                name,
                Entry {
                    toolset: toolset.to_string(),
                    descriptor,
                },
            );
        }

        debug!("Registered {} tools for toolset {}", staged.len(), toolset);
        self.tools.extend(staged);
        Ok(self)
    }

    /// Run a toolset provider and register what it returns.
    ///
    /// The provider sees the credential context so it can refuse to start (for write
    /// toolsets without a write key) or decide which tools it offers.
    pub fn register_toolset_with<F>(
        &mut self,
        toolset: &str,
        credentials: &Credentials,
        provider: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: FnOnce(&Credentials) -> Result<Vec<ToolDescriptor>, RegistryError>,
    {
        let descriptors = provider(credentials)?;
        self.register_toolset(toolset, descriptors)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn build(self) -> Registry {
        Registry { tools: self.tools }
    }
}

/// The frozen set of active tools.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tools: BTreeMap<String, Entry>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|entry| &entry.descriptor)
    }

    /// Toolset a tool was registered under.
    pub fn toolset_of(&self, name: &str) -> Option<&str> {
        self.tools.get(name).map(|entry| entry.toolset.as_str())
    }

    /// Pure activation predicate over the configured toolset selection.
    pub fn is_enabled(toolset: &str, active: &EnabledToolsets) -> bool {
        active.contains(toolset)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Descriptors, sorted by tool name.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values().map(|entry| &entry.descriptor)
    }

    /// Names of the toolsets that contributed at least one tool, sorted.
    pub fn toolsets(&self) -> Vec<&str> {
        let mut toolsets: Vec<&str> = self.tools.values().map(|e| e.toolset.as_str()).collect();
        toolsets.sort_unstable();
        toolsets.dedup();
        toolsets
    }
}
