//! Billing metrics tools (usage host).

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{require, require_list};
use crate::client::{ApiRequest, Host};
use crate::dispatch::InvocationContext;
use crate::registry::RegistryError;
use crate::tool;
use crate::tools::{ToolDescriptor, ToolError};

pub fn descriptors() -> Result<Vec<ToolDescriptor>, RegistryError> {
    Ok(vec![
        ToolDescriptor::from_tool(GetDailyMetrics)?,
        ToolDescriptor::from_tool(GetHourlyMetrics)?,
        ToolDescriptor::from_tool(GetMetricsRegistry)?,
    ])
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetricsParams {
    /// Comma-separated list of Algolia Application IDs
    pub applications: String,
    /// The start date of the period for which the metrics should be returned (YYYY-MM-DD)
    pub start_date: String,
    /// The end date (included) of the period for which the metrics should be returned (YYYY-MM-DD)
    pub end_date: Option<String>,
    /// Comma-separated list of metric names to retrieve
    pub metric_names: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourlyMetricsParams {
    /// Algolia Application ID
    pub application: String,
    /// The start time of the period for which the metrics should be returned (ISO 8601 format)
    pub start_time: String,
    /// The end time (included) of the period for which the metrics should be returned (ISO 8601 format)
    pub end_time: Option<String>,
    /// Comma-separated list of metric names to retrieve
    pub metric_names: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MetricsRegistryParams {
    /// Comma-separated list of Algolia Application IDs
    pub applications: String,
}

/// Repeat `key` once per value, the way the usage API expects list parameters.
fn repeated(mut request: ApiRequest, key: &str, values: &[String]) -> ApiRequest {
    for value in values {
        request = request.query(key, value);
    }
    request
}

pub struct GetDailyMetrics;

#[tool(
    name = "usage_get_daily_metrics",
    description = "Returns a list of billing metrics per day for the specified applications",
    label = "Daily Metrics"
)]
impl GetDailyMetrics {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: DailyMetricsParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let applications = require_list("applications", &params.applications)?;
        let start_date = require("startDate", &params.start_date)?;
        let metric_names = require_list("metricNames", &params.metric_names)?;

        let request = repeated(
            ApiRequest::get(Host::Usage, "/2/metrics/daily"),
            "application",
            &applications,
        )
        .query("startDate", start_date)
        .query_opt("endDate", params.end_date.filter(|d| !d.is_empty()));
        let request = repeated(request, "name", &metric_names).auth(key);

        ctx.send(request).await
    }
}

pub struct GetHourlyMetrics;

#[tool(
    name = "usage_get_hourly_metrics",
    description = "Returns a list of billing metrics per hour for the specified application",
    label = "Hourly Metrics"
)]
impl GetHourlyMetrics {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: HourlyMetricsParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let application = require("application", &params.application)?;
        let start_time = require("startTime", &params.start_time)?;
        let metric_names = require_list("metricNames", &params.metric_names)?;

        let request = ApiRequest::get(Host::Usage, "/2/metrics/hourly")
            .query("application", application)
            .query("startTime", start_time)
            .query_opt("endTime", params.end_time.filter(|t| !t.is_empty()));
        let request = repeated(request, "name", &metric_names).auth(key);

        ctx.send(request).await
    }
}

pub struct GetMetricsRegistry;

#[tool(
    name = "usage_get_metrics_registry",
    description = "Returns the list of available metrics",
    label = "Metrics Registry"
)]
impl GetMetricsRegistry {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: MetricsRegistryParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let applications = require_list("applications", &params.applications)?;

        let request = repeated(
            ApiRequest::get(Host::Usage, "/2/metrics/registry"),
            "application",
            &applications,
        )
        .auth(key);
        ctx.send(request).await
    }
}
