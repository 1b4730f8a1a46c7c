//! Search analytics tools (analytics host).

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::require;
use crate::client::{ApiRequest, Host};
use crate::config::ApiKey;
use crate::dispatch::InvocationContext;
use crate::registry::RegistryError;
use crate::tool;
use crate::tools::{ToolDescriptor, ToolError};

pub fn descriptors() -> Result<Vec<ToolDescriptor>, RegistryError> {
    Ok(vec![
        ToolDescriptor::from_tool(GetClickThroughRate)?,
        ToolDescriptor::from_tool(GetNoResultsRate)?,
        ToolDescriptor::from_tool(GetSearchesCount)?,
        ToolDescriptor::from_tool(GetTopSearches)?,
    ])
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRangeParams {
    /// Index name
    pub index: String,
    /// Start date of the period to analyze, in YYYY-MM-DD format
    pub start_date: Option<String>,
    /// End date of the period to analyze, in YYYY-MM-DD format
    pub end_date: Option<String>,
    /// Tags by which to segment the analytics
    pub tags: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn range_request(
    path: &str,
    index: &str,
    start_date: Option<String>,
    end_date: Option<String>,
    tags: Option<String>,
    key: ApiKey<'_>,
) -> ApiRequest {
    ApiRequest::get(Host::Analytics, path)
        .query("index", index)
        .query_opt("startDate", non_empty(start_date))
        .query_opt("endDate", non_empty(end_date))
        .query_opt("tags", non_empty(tags))
        .auth(key)
}

async fn fetch_range(
    ctx: &InvocationContext,
    path: &str,
    params: AnalyticsRangeParams,
) -> Result<Value, ToolError> {
    let key = ctx.credentials().read()?;
    let index = require("index", &params.index)?;

    let request = range_request(path, index, params.start_date, params.end_date, params.tags, key);
    ctx.send(request).await
}

pub struct GetClickThroughRate;

#[tool(
    name = "analytics_get_click_through_rate",
    description = "Retrieve the click-through rate (CTR) for all your searches with at least one click event, including a daily breakdown",
    label = "Click Through Rate"
)]
impl GetClickThroughRate {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: AnalyticsRangeParams,
    ) -> Result<Value, ToolError> {
        fetch_range(ctx, "/2/clicks/clickThroughRate", params).await
    }
}

pub struct GetNoResultsRate;

#[tool(
    name = "analytics_get_no_results_rate",
    description = "Retrieve the fraction of searches that didn't return any results within a time range, including a daily breakdown",
    label = "No Results Rate"
)]
impl GetNoResultsRate {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: AnalyticsRangeParams,
    ) -> Result<Value, ToolError> {
        fetch_range(ctx, "/2/searches/noResultRate", params).await
    }
}

pub struct GetSearchesCount;

#[tool(
    name = "analytics_get_searches_count",
    description = "Retrieve the number of searches within a time range, including a daily breakdown",
    label = "Searches Count"
)]
impl GetSearchesCount {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: AnalyticsRangeParams,
    ) -> Result<Value, ToolError> {
        fetch_range(ctx, "/2/searches/count", params).await
    }
}

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum OrderBy {
    SearchCount,
    ClickThroughRate,
    ConversionRate,
    AverageClickPosition,
}

impl OrderBy {
    fn as_str(&self) -> &'static str {
        match self {
            OrderBy::SearchCount => "searchCount",
            OrderBy::ClickThroughRate => "clickThroughRate",
            OrderBy::ConversionRate => "conversionRate",
            OrderBy::AverageClickPosition => "averageClickPosition",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopSearchesParams {
    /// Index name
    pub index: String,
    /// Whether to include metrics related to click and conversion events in the response
    pub click_analytics: Option<bool>,
    /// Whether to include metrics related to revenue events in the response
    pub revenue_analytics: Option<bool>,
    /// Start date of the period to analyze, in YYYY-MM-DD format
    pub start_date: Option<String>,
    /// End date of the period to analyze, in YYYY-MM-DD format
    pub end_date: Option<String>,
    /// Attribute by which to order the response items (searchCount, clickThroughRate, conversionRate, averageClickPosition)
    pub order_by: Option<OrderBy>,
    /// Sorting direction of the results: asc or desc
    pub direction: Option<Direction>,
    /// Number of items to return (max 1000)
    pub limit: Option<i64>,
    /// Position of the first item to return
    pub offset: Option<i64>,
    /// Tags by which to segment the analytics
    pub tags: Option<String>,
}

pub struct GetTopSearches;

#[tool(
    name = "analytics_get_top_searches",
    description = "Retrieve the most popular searches for an index",
    label = "Top Searches"
)]
impl GetTopSearches {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: TopSearchesParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index = require("index", &params.index)?;

        // Flags are only sent when turned on.
        let request = range_request(
            "/2/searches",
            index,
            params.start_date,
            params.end_date,
            params.tags,
            key,
        )
        .query_opt("clickAnalytics", params.click_analytics.filter(|on| *on))
        .query_opt("revenueAnalytics", params.revenue_analytics.filter(|on| *on))
        .query_opt("orderBy", params.order_by.map(|o| o.as_str()))
        .query_opt("direction", params.direction.map(|d| d.as_str()))
        .query_opt("limit", params.limit)
        .query_opt("offset", params.offset);

        ctx.send(request).await
    }
}
