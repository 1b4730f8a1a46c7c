//! Recommend tools (search host of the application).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use serde_with::skip_serializing_none;

use super::{parse_json_arg, require};
use crate::client::{ApiRequest, Host};
use crate::config::ApiKey;
use crate::dispatch::InvocationContext;
use crate::registry::RegistryError;
use crate::tool;
use crate::tools::{ToolDescriptor, ToolError};

pub fn descriptors() -> Result<Vec<ToolDescriptor>, RegistryError> {
    Ok(vec![
        ToolDescriptor::from_tool(GetRecommendations)?,
        ToolDescriptor::from_tool(GetRecommendRule)?,
        ToolDescriptor::from_tool(DeleteRecommendRule)?,
        ToolDescriptor::from_tool(SearchRecommendRules)?,
        ToolDescriptor::from_tool(BatchRecommendRules)?,
        ToolDescriptor::from_tool(GetRecommendStatus)?,
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendModel {
    RelatedProducts,
    BoughtTogether,
    TrendingFacets,
    TrendingItems,
}

impl RecommendModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendModel::RelatedProducts => "related-products",
            RecommendModel::BoughtTogether => "bought-together",
            RecommendModel::TrendingFacets => "trending-facets",
            RecommendModel::TrendingItems => "trending-items",
        }
    }
}

/// `/1/indexes/{indexName}/{model}` followed by `rest`.
fn scenario(
    method: reqwest::Method,
    key: ApiKey<'_>,
    index_name: &str,
    model: RecommendModel,
    rest: &[&str],
) -> ApiRequest {
    let mut request = ApiRequest::new(method, Host::Search(key.app_id.to_string()), "/1/indexes")
        .segment(index_name)
        .segment(model.as_str());
    for segment in rest {
        request = request.segment(segment);
    }
    request.auth(key)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecommendationsParams {
    /// JSON array of recommendation requests. Each request must include 'indexName', 'threshold', and a model-specific configuration.
    pub requests: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRuleParams {
    /// Name of the index on which to perform the operation
    pub index_name: String,
    /// Recommend model (related-products, bought-together, trending-facets, trending-items)
    pub model: RecommendModel,
    /// Unique record identifier
    #[serde(rename = "objectID")]
    pub object_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecommendRulesParams {
    /// Name of the index on which to perform the operation
    pub index_name: String,
    /// Recommend model (related-products, bought-together, trending-facets, trending-items)
    pub model: RecommendModel,
    /// Search query
    pub query: Option<String>,
    /// Only search for rules with matching context
    pub context: Option<String>,
    /// Requested page of the API response
    pub page: Option<i64>,
    /// Maximum number of hits per page
    pub hits_per_page: Option<i64>,
    /// Whether to only show rules where the value of their 'enabled' property matches this parameter
    pub enabled: Option<bool>,
    /// Filter expression. This only searches for rules matching the filter expression
    pub filters: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRulesBody {
    query: String,
    context: Option<String>,
    page: Option<i64>,
    hits_per_page: Option<i64>,
    enabled: Option<bool>,
    filters: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecommendRulesParams {
    /// Name of the index on which to perform the operation
    pub index_name: String,
    /// Recommend model (related-products, bought-together, trending-facets, trending-items)
    pub model: RecommendModel,
    /// JSON array of Recommend rules to create or update
    pub rules: String,
    /// Whether to replace all existing rules with the provided batch
    pub clear_existing_rules: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendStatusParams {
    /// Name of the index on which to perform the operation
    pub index_name: String,
    /// Recommend model (related-products, bought-together, trending-facets, trending-items)
    pub model: RecommendModel,
    /// Unique task identifier
    #[serde(rename = "taskID")]
    pub task_id: i64,
}

/// Every request needs the fields the Recommend API cannot default.
fn check_recommendation_requests(requests: &[Map<String, Value>]) -> Result<(), ToolError> {
    if requests.is_empty() {
        return Err(ToolError::invalid_argument(
            "requests",
            "at least one request is required",
        ));
    }

    for (i, request) in requests.iter().enumerate() {
        for field in ["indexName", "model", "threshold"] {
            if request.get(field).map_or(true, Value::is_null) {
                return Err(ToolError::invalid_argument(
                    "requests",
                    format!("request {} is missing {}", i, field),
                ));
            }
        }
    }
    Ok(())
}

pub struct GetRecommendations;

#[tool(
    name = "recommend_get_recommendations",
    description = "Retrieve recommendations from selected AI models",
    label = "Recommendations"
)]
impl GetRecommendations {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: RecommendationsParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let raw = require("requests", &params.requests)?;
        let requests: Vec<Map<String, Value>> = parse_json_arg("requests", raw)?;
        check_recommendation_requests(&requests)?;

        let request = ApiRequest::post(
            Host::Search(key.app_id.to_string()),
            "/1/indexes/*/recommendations",
        )
        .json(json!({ "requests": requests }))
        .auth(key);

        ctx.send(request).await
    }
}

pub struct GetRecommendRule;

#[tool(
    name = "recommend_get_recommend_rule",
    description = "Retrieve a Recommend rule that you previously created in the Algolia dashboard",
    label = "Recommend Rule"
)]
impl GetRecommendRule {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: RecommendRuleParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = require("indexName", &params.index_name)?;
        let object_id = require("objectID", &params.object_id)?;

        let request = scenario(
            reqwest::Method::GET,
            key,
            index_name,
            params.model,
            &["recommend", "rules", object_id],
        );
        ctx.send(request).await
    }
}

pub struct DeleteRecommendRule;

#[tool(
    name = "recommend_delete_recommend_rule",
    description = "Delete a Recommend rule from a recommendation scenario",
    label = "Recommend Rule Deleted"
)]
impl DeleteRecommendRule {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: RecommendRuleParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = require("indexName", &params.index_name)?;
        let object_id = require("objectID", &params.object_id)?;

        let request = scenario(
            reqwest::Method::DELETE,
            key,
            index_name,
            params.model,
            &["recommend", "rules", object_id],
        );
        ctx.send(request).await
    }
}

pub struct SearchRecommendRules;

#[tool(
    name = "recommend_search_recommend_rules",
    description = "Search for Recommend rules. Use an empty query to list all rules for this recommendation scenario.",
    label = "Recommend Rules Search"
)]
impl SearchRecommendRules {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: SearchRecommendRulesParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = require("indexName", &params.index_name)?;

        let body = SearchRulesBody {
            query: params.query.unwrap_or_default(),
            context: params.context,
            page: params.page,
            hits_per_page: params.hits_per_page,
            enabled: params.enabled,
            filters: params.filters,
        };

        let request = scenario(
            reqwest::Method::POST,
            key,
            index_name,
            params.model,
            &["recommend", "rules", "search"],
        )
        .json(serde_json::to_value(body)?);
        ctx.send(request).await
    }
}

pub struct BatchRecommendRules;

#[tool(
    name = "recommend_batch_recommend_rules",
    description = "Create or update a batch of Recommend Rules",
    label = "Recommend Rules Batch"
)]
impl BatchRecommendRules {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: BatchRecommendRulesParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let index_name = require("indexName", &params.index_name)?;
        let rules: Vec<Value> = parse_json_arg("rules", &params.rules)?;

        let request = scenario(
            reqwest::Method::POST,
            key,
            index_name,
            params.model,
            &["recommend", "rules", "batch"],
        )
        .query_opt("clearExistingRules", params.clear_existing_rules.filter(|on| *on))
        .json(Value::Array(rules));
        ctx.send(request).await
    }
}

pub struct GetRecommendStatus;

#[tool(
    name = "recommend_get_recommend_status",
    description = "Check the status of a given task",
    label = "Recommend Task Status"
)]
impl GetRecommendStatus {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: RecommendStatusParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = require("indexName", &params.index_name)?;

        let task_id = params.task_id.to_string();
        let request = scenario(
            reqwest::Method::GET,
            key,
            index_name,
            params.model,
            &["task", &task_id],
        );
        ctx.send(request).await
    }
}
