//! Index, record, rule and synonym tools (search host of the application).
//!
//! Every tool takes an optional `indexName` that falls back to `ALGOLIA_INDEX_NAME`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use serde_with::skip_serializing_none;

use super::{parse_json_arg, require, split_list, NoParams};
use crate::client::{ApiRequest, Host};
use crate::config::ApiKey;
use crate::dispatch::InvocationContext;
use crate::registry::RegistryError;
use crate::tool;
use crate::tools::{ToolDescriptor, ToolError};

pub fn read_descriptors() -> Result<Vec<ToolDescriptor>, RegistryError> {
    Ok(vec![
        ToolDescriptor::from_tool(ListIndices)?,
        ToolDescriptor::from_tool(GetSettings)?,
        ToolDescriptor::from_tool(RunQuery)?,
        ToolDescriptor::from_tool(CountObjects)?,
        ToolDescriptor::from_tool(GetObject)?,
        ToolDescriptor::from_tool(GetRule)?,
        ToolDescriptor::from_tool(SearchRules)?,
        ToolDescriptor::from_tool(GetSynonym)?,
        ToolDescriptor::from_tool(SearchSynonyms)?,
    ])
}

pub fn write_descriptors() -> Result<Vec<ToolDescriptor>, RegistryError> {
    Ok(vec![
        ToolDescriptor::from_tool(ClearIndex)?,
        ToolDescriptor::from_tool(CopyIndex)?,
        ToolDescriptor::from_tool(MoveIndex)?,
        ToolDescriptor::from_tool(DeleteIndex)?,
        ToolDescriptor::from_tool(SetSettings)?,
        ToolDescriptor::from_tool(InsertObject)?,
        ToolDescriptor::from_tool(InsertObjects)?,
        ToolDescriptor::from_tool(DeleteObject)?,
        ToolDescriptor::from_tool(SaveRule)?,
        ToolDescriptor::from_tool(DeleteRule)?,
        ToolDescriptor::from_tool(ClearRules)?,
        ToolDescriptor::from_tool(SaveSynonym)?,
        ToolDescriptor::from_tool(DeleteSynonym)?,
        ToolDescriptor::from_tool(ClearSynonyms)?,
    ])
}

/// `/1/indexes/{index}`, authenticated with `key`.
fn index_request(method: reqwest::Method, key: ApiKey<'_>, index_name: &str) -> ApiRequest {
    ApiRequest::new(method, Host::Search(key.app_id.to_string()), "/1/indexes")
        .segment(index_name)
        .auth(key)
}

/// The `objectID` a record carries, as a path segment.
fn object_id_of(object: &Map<String, Value>) -> Option<String> {
    match object.get("objectID")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IndexParams {
    /// The index to use (defaults to ALGOLIA_INDEX_NAME)
    pub index_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryParams {
    /// The query to run against the index
    pub query: String,
    /// The index to search into
    pub index_name: Option<String>,
    /// The number of hits to return per page
    pub hits_per_page: Option<i64>,
    /// The page number (0-based) to retrieve
    pub page: Option<i64>,
    /// The filter expression using Algolia's filter syntax (e.g., 'category:Book AND price < 100')
    pub filters: Option<String>,
    /// Comma-separated list of attributes to facet on
    pub facets: Option<String>,
    /// Comma-separated list of attributes to search in
    pub restrict_searchable_attributes: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody {
    query: String,
    hits_per_page: Option<i64>,
    page: Option<i64>,
    filters: Option<String>,
    facets: Option<Vec<String>>,
    restrict_searchable_attributes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountObjectsParams {
    /// The index to count the objects
    pub index_name: Option<String>,
    /// Only count the objects matching this query
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectIdParams {
    /// The unique identifier of the object, rule or synonym
    #[serde(rename = "objectID")]
    pub object_id: String,
    /// The index to use (defaults to ALGOLIA_INDEX_NAME)
    pub index_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Anchoring {
    Is,
    StartsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRulesParams {
    /// The query to search for
    pub query: String,
    /// When specified restricts matches to rules with a specific anchoring type. When omitted, all anchoring types may match.
    pub anchoring: Option<Anchoring>,
    /// When specified, restricts matches to contextual rules with a specific context. When omitted, all rules may match.
    pub context: Option<String>,
    /// When specified, restricts matches to rules with a specific enabled status. When omitted, all enabled statuses may match.
    pub enabled: Option<bool>,
    /// The index to use (defaults to ALGOLIA_INDEX_NAME)
    pub index_name: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct SearchRulesBody {
    query: String,
    anchoring: Option<Anchoring>,
    context: Option<String>,
    enabled: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchSynonymsParams {
    /// The query to find synonyms for
    pub query: String,
    /// The index to use (defaults to ALGOLIA_INDEX_NAME)
    pub index_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IndexOperationParams {
    /// The name of the destination index
    pub index_name: String,
    /// The index to copy or move from (defaults to ALGOLIA_INDEX_NAME)
    pub source_index_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetSettingsParams {
    /// The settings to apply as a JSON string
    pub object: String,
    /// The index to use (defaults to ALGOLIA_INDEX_NAME)
    pub index_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertObjectParams {
    /// The object to insert or update as a JSON string (must include an objectID field)
    pub object: String,
    /// The index to use (defaults to ALGOLIA_INDEX_NAME)
    pub index_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertObjectsParams {
    /// Array of objects to insert or update as a JSON string (each must include an objectID field)
    pub objects: String,
    /// The index to use (defaults to ALGOLIA_INDEX_NAME)
    pub index_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveRuleParams {
    /// The unique identifier of the rule
    #[serde(rename = "objectID")]
    pub object_id: String,
    /// The rule as a JSON string, e.g. {"conditions":[{"pattern":"phone","anchoring":"contains"}],"consequence":{"params":{"filters":"category:smartphone"}}}
    pub rule: String,
    /// The index to use (defaults to ALGOLIA_INDEX_NAME)
    pub index_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveSynonymParams {
    /// The unique identifier of the synonym
    #[serde(rename = "objectID")]
    pub object_id: String,
    /// The synonym as a JSON string, e.g. {"type":"synonym","synonyms":["car","vehicle","auto"]} or {"type":"oneWaySynonym","input":"phone","synonyms":["iphone","android"]}
    pub synonym: String,
    /// The index to use (defaults to ALGOLIA_INDEX_NAME)
    pub index_name: Option<String>,
}

pub struct ListIndices;

#[tool(
    name = "list_indices",
    description = "List the indices in the application",
    label = "indices"
)]
impl ListIndices {
    async fn call(&self, ctx: &InvocationContext, _params: NoParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let request = ApiRequest::get(Host::Search(key.app_id.to_string()), "/1/indexes").auth(key);
        ctx.send(request).await
    }
}

pub struct GetSettings;

#[tool(
    name = "get_settings",
    description = "Get the settings for the Algolia index",
    label = "settings",
    acl = "settings"
)]
impl GetSettings {
    async fn call(&self, ctx: &InvocationContext, params: IndexParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;

        let request = index_request(reqwest::Method::GET, key, &index_name).segment("settings");
        ctx.send(request).await
    }
}

pub struct RunQuery;

#[tool(
    name = "run_query",
    description = "Run a query against the Algolia search index with advanced options",
    label = "query results"
)]
impl RunQuery {
    async fn call(&self, ctx: &InvocationContext, params: RunQueryParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;

        let body = QueryBody {
            query: params.query,
            hits_per_page: params.hits_per_page,
            page: params.page,
            filters: params.filters.filter(|f| !f.is_empty()),
            facets: params.facets.as_deref().map(split_list).filter(|l| !l.is_empty()),
            restrict_searchable_attributes: params
                .restrict_searchable_attributes
                .as_deref()
                .map(split_list)
                .filter(|l| !l.is_empty()),
        };

        let request = index_request(reqwest::Method::POST, key, &index_name)
            .segment("query")
            .json(serde_json::to_value(body)?);
        ctx.send(request).await
    }
}

pub struct CountObjects;

#[tool(
    name = "count_objects",
    description = "Count the number of objects in the Algolia search index.",
    label = "query results"
)]
impl CountObjects {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: CountObjectsParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;

        let request = index_request(reqwest::Method::POST, key, &index_name)
            .segment("query")
            .json(json!({
                "query": params.query.unwrap_or_default(),
                "hitsPerPage": 0,
            }));
        ctx.send(request).await
    }
}

pub struct GetObject;

#[tool(
    name = "get_object",
    description = "Get an object by its object ID",
    label = "object",
    acl = "search"
)]
impl GetObject {
    async fn call(&self, ctx: &InvocationContext, params: ObjectIdParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;
        let object_id = require("objectID", &params.object_id)?;

        let request = index_request(reqwest::Method::GET, key, &index_name).segment(object_id);
        ctx.send(request).await
    }
}

pub struct GetRule;

#[tool(
    name = "get_rule",
    description = "Get a rule from the Algolia index by its ID",
    label = "rule"
)]
impl GetRule {
    async fn call(&self, ctx: &InvocationContext, params: ObjectIdParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;
        let object_id = require("objectID", &params.object_id)?;

        let request = index_request(reqwest::Method::GET, key, &index_name)
            .segment("rules")
            .segment(object_id);
        ctx.send(request).await
    }
}

pub struct SearchRules;

#[tool(
    name = "search_rules",
    description = "Search for rules in the Algolia index",
    label = "rules"
)]
impl SearchRules {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: SearchRulesParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;

        let body = SearchRulesBody {
            query: params.query,
            anchoring: params.anchoring,
            context: params.context.filter(|c| !c.is_empty()),
            enabled: params.enabled,
        };

        let request = index_request(reqwest::Method::POST, key, &index_name)
            .segment("rules")
            .segment("search")
            .json(serde_json::to_value(body)?);
        ctx.send(request).await
    }
}

pub struct GetSynonym;

#[tool(
    name = "get_synonym",
    description = "Get a synonym from the Algolia index by its ID",
    label = "synonym"
)]
impl GetSynonym {
    async fn call(&self, ctx: &InvocationContext, params: ObjectIdParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;
        let object_id = require("objectID", &params.object_id)?;

        let request = index_request(reqwest::Method::GET, key, &index_name)
            .segment("synonyms")
            .segment(object_id);
        ctx.send(request).await
    }
}

pub struct SearchSynonyms;

#[tool(
    name = "search_synonyms",
    description = "Search for synonyms in the Algolia index that match a query",
    label = "synonyms"
)]
impl SearchSynonyms {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: SearchSynonymsParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;

        let request = index_request(reqwest::Method::POST, key, &index_name)
            .segment("synonyms")
            .segment("search")
            .json(json!({ "query": params.query }));
        ctx.send(request).await
    }
}

pub struct ClearIndex;

#[tool(
    name = "clear_index",
    description = "Clear an index by removing all records",
    label = "object"
)]
impl ClearIndex {
    async fn call(&self, ctx: &InvocationContext, params: IndexParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;

        let request = index_request(reqwest::Method::POST, key, &index_name).segment("clear");
        ctx.send(request).await
    }
}

/// `copy` or `move` from the source index (default index when omitted) to `indexName`.
async fn index_operation(
    ctx: &InvocationContext,
    operation: &str,
    params: IndexOperationParams,
) -> Result<Value, ToolError> {
    let key = ctx.credentials().write()?;
    let destination = require("indexName", &params.index_name)?;
    let source = ctx
        .credentials()
        .index_or_default(params.source_index_name)
        .map_err(|_| {
            ToolError::invalid_argument(
                "sourceIndexName",
                "sourceIndexName is required when ALGOLIA_INDEX_NAME is not set",
            )
        })?;

    let request = index_request(reqwest::Method::POST, key, &source)
        .segment("operation")
        .json(json!({ "operation": operation, "destination": destination }));
    ctx.send(request).await
}

pub struct CopyIndex;

#[tool(
    name = "copy_index",
    description = "Copy an index to a another index",
    label = "task"
)]
impl CopyIndex {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: IndexOperationParams,
    ) -> Result<Value, ToolError> {
        index_operation(ctx, "copy", params).await
    }
}

pub struct MoveIndex;

#[tool(
    name = "move_index",
    description = "Move an index to another index",
    label = "task"
)]
impl MoveIndex {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: IndexOperationParams,
    ) -> Result<Value, ToolError> {
        index_operation(ctx, "move", params).await
    }
}

pub struct DeleteIndex;

#[tool(
    name = "delete_index",
    description = "Delete an index by removing all assets and configurations",
    label = "task"
)]
impl DeleteIndex {
    async fn call(&self, ctx: &InvocationContext, params: IndexParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;

        ctx.send(index_request(reqwest::Method::DELETE, key, &index_name))
            .await
    }
}

pub struct SetSettings;

#[tool(
    name = "set_settings",
    description = "Change the settings for the Algolia index",
    label = "insert result"
)]
impl SetSettings {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: SetSettingsParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;
        let settings: Map<String, Value> = parse_json_arg("object", &params.object)?;

        let request = index_request(reqwest::Method::PUT, key, &index_name)
            .segment("settings")
            .json(Value::Object(settings));
        ctx.send(request).await
    }
}

pub struct InsertObject;

#[tool(
    name = "insert_object",
    description = "Insert or update an object in the Algolia index",
    label = "insert result"
)]
impl InsertObject {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: InsertObjectParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;
        let object: Map<String, Value> = parse_json_arg("object", &params.object)?;
        let object_id = object_id_of(&object).ok_or_else(|| {
            ToolError::invalid_argument("object", "object must include an objectID field")
        })?;

        let request = index_request(reqwest::Method::PUT, key, &index_name)
            .segment(object_id)
            .json(Value::Object(object));
        ctx.send(request).await
    }
}

pub struct InsertObjects;

#[tool(
    name = "insert_objects",
    description = "Insert or update multiple objects in the Algolia index",
    label = "batch insert result"
)]
impl InsertObjects {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: InsertObjectsParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;
        let objects: Vec<Map<String, Value>> = parse_json_arg("objects", &params.objects)?;

        let mut requests = Vec::with_capacity(objects.len());
        for (i, object) in objects.into_iter().enumerate() {
            if object_id_of(&object).is_none() {
                return Err(ToolError::invalid_argument(
                    "objects",
                    format!("object at index {} must include an objectID field", i),
                ));
            }
            requests.push(json!({ "action": "updateObject", "body": object }));
        }

        let request = index_request(reqwest::Method::POST, key, &index_name)
            .segment("batch")
            .json(json!({ "requests": requests }));
        ctx.send(request).await
    }
}

pub struct DeleteObject;

#[tool(
    name = "delete_object",
    description = "Delete an object by its object ID",
    label = "object"
)]
impl DeleteObject {
    async fn call(&self, ctx: &InvocationContext, params: ObjectIdParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;
        let object_id = require("objectID", &params.object_id)?;

        let request = index_request(reqwest::Method::DELETE, key, &index_name).segment(object_id);
        ctx.send(request).await
    }
}

pub struct SaveRule;

#[tool(
    name = "save_rule",
    description = "Save or update a rule in the Algolia index",
    label = "task"
)]
impl SaveRule {
    async fn call(&self, ctx: &InvocationContext, params: SaveRuleParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;
        let object_id = require("objectID", &params.object_id)?;
        let mut rule: Map<String, Value> = parse_json_arg("rule", &params.rule)?;
        rule.insert("objectID".to_string(), Value::String(object_id.to_string()));

        let request = index_request(reqwest::Method::PUT, key, &index_name)
            .segment("rules")
            .segment(object_id)
            .json(Value::Object(rule));
        ctx.send(request).await
    }
}

pub struct DeleteRule;

#[tool(
    name = "delete_rule",
    description = "Delete a rule by its object ID",
    label = "rule"
)]
impl DeleteRule {
    async fn call(&self, ctx: &InvocationContext, params: ObjectIdParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;
        let object_id = require("objectID", &params.object_id)?;

        let request = index_request(reqwest::Method::DELETE, key, &index_name)
            .segment("rules")
            .segment(object_id);
        ctx.send(request).await
    }
}

pub struct ClearRules;

#[tool(
    name = "clear_rules",
    description = "Clear all rules from the Algolia index",
    label = "clear result"
)]
impl ClearRules {
    async fn call(&self, ctx: &InvocationContext, params: IndexParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;

        let request = index_request(reqwest::Method::POST, key, &index_name)
            .segment("rules")
            .segment("clear");
        ctx.send(request).await
    }
}

pub struct SaveSynonym;

#[tool(
    name = "save_synonym",
    description = "Save or update a synonym in the Algolia index",
    label = "task"
)]
impl SaveSynonym {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: SaveSynonymParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;
        let object_id = require("objectID", &params.object_id)?;
        let mut synonym: Map<String, Value> = parse_json_arg("synonym", &params.synonym)?;
        synonym.insert("objectID".to_string(), Value::String(object_id.to_string()));

        let request = index_request(reqwest::Method::PUT, key, &index_name)
            .segment("synonyms")
            .segment(object_id)
            .json(Value::Object(synonym));
        ctx.send(request).await
    }
}

pub struct DeleteSynonym;

#[tool(
    name = "delete_synonym",
    description = "Delete a synonym by its object ID",
    label = "synonym"
)]
impl DeleteSynonym {
    async fn call(&self, ctx: &InvocationContext, params: ObjectIdParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;
        let object_id = require("objectID", &params.object_id)?;

        let request = index_request(reqwest::Method::DELETE, key, &index_name)
            .segment("synonyms")
            .segment(object_id);
        ctx.send(request).await
    }
}

pub struct ClearSynonyms;

#[tool(
    name = "clear_synonyms",
    description = "Clear all synonyms from the Algolia index",
    label = "clear result"
)]
impl ClearSynonyms {
    async fn call(&self, ctx: &InvocationContext, params: IndexParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = ctx.credentials().index_or_default(params.index_name)?;

        let request = index_request(reqwest::Method::POST, key, &index_name)
            .segment("synonyms")
            .segment("clear");
        ctx.send(request).await
    }
}
