//! Query Suggestions configuration tools (regional query-suggestions host).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

use super::{parse_json_arg, require};
use crate::client::{ApiRequest, Host, Region};
use crate::dispatch::InvocationContext;
use crate::registry::RegistryError;
use crate::tool;
use crate::tools::{ToolDescriptor, ToolError};

pub fn descriptors() -> Result<Vec<ToolDescriptor>, RegistryError> {
    Ok(vec![
        ToolDescriptor::from_tool(ListConfigs)?,
        ToolDescriptor::from_tool(GetConfig)?,
        ToolDescriptor::from_tool(CreateConfig)?,
        ToolDescriptor::from_tool(UpdateConfig)?,
        ToolDescriptor::from_tool(DeleteConfig)?,
        ToolDescriptor::from_tool(GetConfigStatus)?,
        ToolDescriptor::from_tool(GetLogFile)?,
    ])
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegionParams {
    /// Analytics region (us or eu)
    pub region: Region,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigParams {
    /// Analytics region (us or eu)
    pub region: Region,
    /// Query Suggestions index name
    pub index_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WriteConfigParams {
    /// Analytics region (us or eu)
    pub region: Region,
    /// Query Suggestions index name
    pub index_name: String,
    /// JSON array of source indices configurations
    pub source_indices: String,
    /// JSON array of languages or boolean for deduplicating singular and plural suggestions
    pub languages: Option<String>,
    /// JSON array of words or regular expressions to exclude from the suggestions
    pub exclude: Option<String>,
    /// Whether to turn on personalized query suggestions
    pub enable_personalization: Option<bool>,
    /// Whether to include suggestions with special characters
    pub allow_special_characters: Option<bool>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigBody {
    index_name: Option<String>,
    source_indices: Vec<Value>,
    languages: Option<Value>,
    exclude: Option<Vec<String>>,
    enable_personalization: Option<bool>,
    allow_special_characters: Option<bool>,
}

fn optional(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().filter(|r| !r.is_empty())
}

impl ConfigBody {
    /// Decode the JSON-in-string arguments. `include_index` puts `indexName` in the body,
    /// which creation needs and updates carry in the path instead.
    fn from_params(params: &WriteConfigParams, include_index: bool) -> Result<Self, ToolError> {
        Ok(Self {
            index_name: include_index.then(|| params.index_name.clone()),
            source_indices: parse_json_arg("sourceIndices", &params.source_indices)?,
            languages: optional(&params.languages)
                .map(|raw| parse_json_arg("languages", raw))
                .transpose()?,
            exclude: optional(&params.exclude)
                .map(|raw| parse_json_arg("exclude", raw))
                .transpose()?,
            enable_personalization: params.enable_personalization,
            allow_special_characters: params.allow_special_characters,
        })
    }
}

fn configs(region: Region) -> ApiRequest {
    ApiRequest::get(Host::QuerySuggestions(region), "/1/configs")
}

pub struct ListConfigs;

#[tool(
    name = "query_suggestions_list_configs",
    description = "Retrieves all Query Suggestions configurations of your Algolia application",
    label = "Query Suggestions Configurations"
)]
impl ListConfigs {
    async fn call(&self, ctx: &InvocationContext, params: RegionParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        ctx.send(configs(params.region).auth(key)).await
    }
}

pub struct GetConfig;

#[tool(
    name = "query_suggestions_get_config",
    description = "Retrieves a single Query Suggestions configuration by its index name",
    label = "Query Suggestions Configuration"
)]
impl GetConfig {
    async fn call(&self, ctx: &InvocationContext, params: ConfigParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = require("indexName", &params.index_name)?;

        let request = configs(params.region).segment(index_name).auth(key);
        ctx.send(request).await
    }
}

pub struct CreateConfig;

#[tool(
    name = "query_suggestions_create_config",
    description = "Creates a new Query Suggestions configuration",
    label = "Query Suggestions Configuration Created"
)]
impl CreateConfig {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: WriteConfigParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        require("indexName", &params.index_name)?;
        let body = ConfigBody::from_params(&params, true)?;

        let request = ApiRequest::post(Host::QuerySuggestions(params.region), "/1/configs")
            .json(serde_json::to_value(body)?)
            .auth(key);
        ctx.send(request).await
    }
}

pub struct UpdateConfig;

#[tool(
    name = "query_suggestions_update_config",
    description = "Updates a Query Suggestions configuration",
    label = "Query Suggestions Configuration Updated"
)]
impl UpdateConfig {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: WriteConfigParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = require("indexName", &params.index_name)?;
        let body = ConfigBody::from_params(&params, false)?;

        let request = ApiRequest::put(Host::QuerySuggestions(params.region), "/1/configs")
            .segment(index_name)
            .json(serde_json::to_value(body)?)
            .auth(key);
        ctx.send(request).await
    }
}

pub struct DeleteConfig;

#[tool(
    name = "query_suggestions_delete_config",
    description = "Deletes a Query Suggestions configuration",
    label = "Query Suggestions Configuration Deleted"
)]
impl DeleteConfig {
    async fn call(&self, ctx: &InvocationContext, params: ConfigParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = require("indexName", &params.index_name)?;

        let request = ApiRequest::delete(Host::QuerySuggestions(params.region), "/1/configs")
            .segment(index_name)
            .auth(key);
        ctx.send(request).await
    }
}

pub struct GetConfigStatus;

#[tool(
    name = "query_suggestions_get_config_status",
    description = "Reports the status of a Query Suggestions index",
    label = "Query Suggestions Configuration Status"
)]
impl GetConfigStatus {
    async fn call(&self, ctx: &InvocationContext, params: ConfigParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = require("indexName", &params.index_name)?;

        let request = configs(params.region)
            .segment(index_name)
            .segment("status")
            .auth(key);
        ctx.send(request).await
    }
}

pub struct GetLogFile;

#[tool(
    name = "query_suggestions_get_log_file",
    description = "Retrieves the logs for a single Query Suggestions index",
    label = "Query Suggestions Log File"
)]
impl GetLogFile {
    async fn call(&self, ctx: &InvocationContext, params: ConfigParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = require("indexName", &params.index_name)?;

        let request = ApiRequest::get(Host::QuerySuggestions(params.region), "/1/logs")
            .segment(index_name)
            .auth(key);
        ctx.send(request).await
    }
}
