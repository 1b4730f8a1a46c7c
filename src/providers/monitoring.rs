//! Status and infrastructure monitoring tools (status host).
//!
//! The public status endpoints take no credentials; inventory and infrastructure
//! metrics need the read key.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{require, NoParams};
use crate::client::{ApiRequest, Host};
use crate::dispatch::InvocationContext;
use crate::registry::RegistryError;
use crate::tool;
use crate::tools::{ToolDescriptor, ToolError};

pub fn descriptors() -> Result<Vec<ToolDescriptor>, RegistryError> {
    Ok(vec![
        ToolDescriptor::from_tool(GetClustersStatus)?,
        ToolDescriptor::from_tool(GetClusterStatus)?,
        ToolDescriptor::from_tool(GetIncidents)?,
        ToolDescriptor::from_tool(GetClusterIncidents)?,
        ToolDescriptor::from_tool(GetIndexingTime)?,
        ToolDescriptor::from_tool(GetLatency)?,
        ToolDescriptor::from_tool(GetReachability)?,
        ToolDescriptor::from_tool(GetServers)?,
        ToolDescriptor::from_tool(GetMetrics)?,
    ])
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClustersParams {
    /// Subset of clusters, separated by commas (e.g., c1-de,c2-de,c3-de)
    pub clusters: String,
}

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub enum Metric {
    #[serde(rename = "avg_build_time")]
    AvgBuildTime,
    #[serde(rename = "ssd_usage")]
    SsdUsage,
    #[serde(rename = "ram_search_usage")]
    RamSearchUsage,
    #[serde(rename = "ram_indexing_usage")]
    RamIndexingUsage,
    #[serde(rename = "cpu_usage")]
    CpuUsage,
    #[serde(rename = "*")]
    All,
}

impl Metric {
    fn as_str(&self) -> &'static str {
        match self {
            Metric::AvgBuildTime => "avg_build_time",
            Metric::SsdUsage => "ssd_usage",
            Metric::RamSearchUsage => "ram_search_usage",
            Metric::RamIndexingUsage => "ram_indexing_usage",
            Metric::CpuUsage => "cpu_usage",
            Metric::All => "*",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl Period {
    fn as_str(&self) -> &'static str {
        match self {
            Period::Minute => "minute",
            Period::Hour => "hour",
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MetricsParams {
    /// Metric to report (avg_build_time, ssd_usage, ram_search_usage, ram_indexing_usage, cpu_usage, or * for all)
    pub metric: Metric,
    /// Period over which to aggregate the metrics (minute, hour, day, week, month)
    pub period: Period,
}

/// Public status endpoint scoped to a cluster list, e.g. `/1/latency/{clusters}`.
async fn fetch_for_clusters(
    ctx: &InvocationContext,
    path: &str,
    clusters: &str,
) -> Result<Value, ToolError> {
    let clusters = require("clusters", clusters)?;
    ctx.send(ApiRequest::get(Host::Status, path).segment(clusters))
        .await
}

pub struct GetClustersStatus;

#[tool(
    name = "monitoring_get_clusters_status",
    description = "Retrieves the status of all Algolia clusters and instances",
    label = "Clusters Status"
)]
impl GetClustersStatus {
    async fn call(&self, ctx: &InvocationContext, _params: NoParams) -> Result<Value, ToolError> {
        ctx.send(ApiRequest::get(Host::Status, "/1/status")).await
    }
}

pub struct GetClusterStatus;

#[tool(
    name = "monitoring_get_cluster_status",
    description = "Retrieves the status of selected clusters",
    label = "Cluster Status"
)]
impl GetClusterStatus {
    async fn call(&self, ctx: &InvocationContext, params: ClustersParams) -> Result<Value, ToolError> {
        fetch_for_clusters(ctx, "/1/status", &params.clusters).await
    }
}

pub struct GetIncidents;

#[tool(
    name = "monitoring_get_incidents",
    description = "Retrieves known incidents for all clusters",
    label = "Incidents"
)]
impl GetIncidents {
    async fn call(&self, ctx: &InvocationContext, _params: NoParams) -> Result<Value, ToolError> {
        ctx.send(ApiRequest::get(Host::Status, "/1/incidents")).await
    }
}

pub struct GetClusterIncidents;

#[tool(
    name = "monitoring_get_cluster_incidents",
    description = "Retrieves known incidents for the selected clusters",
    label = "Cluster Incidents"
)]
impl GetClusterIncidents {
    async fn call(&self, ctx: &InvocationContext, params: ClustersParams) -> Result<Value, ToolError> {
        fetch_for_clusters(ctx, "/1/incidents", &params.clusters).await
    }
}

pub struct GetIndexingTime;

#[tool(
    name = "monitoring_get_indexing_time",
    description = "Retrieves average times for indexing operations for selected clusters",
    label = "Indexing Time"
)]
impl GetIndexingTime {
    async fn call(&self, ctx: &InvocationContext, params: ClustersParams) -> Result<Value, ToolError> {
        fetch_for_clusters(ctx, "/1/indexing", &params.clusters).await
    }
}

pub struct GetLatency;

#[tool(
    name = "monitoring_get_latency",
    description = "Retrieves the average latency for search requests for selected clusters",
    label = "Latency"
)]
impl GetLatency {
    async fn call(&self, ctx: &InvocationContext, params: ClustersParams) -> Result<Value, ToolError> {
        fetch_for_clusters(ctx, "/1/latency", &params.clusters).await
    }
}

pub struct GetReachability;

#[tool(
    name = "monitoring_get_reachability",
    description = "Retrieves the average reachability of the servers of the selected clusters, as measured by Algolia's probes",
    label = "Reachability"
)]
impl GetReachability {
    async fn call(&self, ctx: &InvocationContext, params: ClustersParams) -> Result<Value, ToolError> {
        let clusters = require("clusters", &params.clusters)?;
        let request = ApiRequest::get(Host::Status, "/1/reachability")
            .segment(clusters)
            .segment("probes");
        ctx.send(request).await
    }
}

pub struct GetServers;

#[tool(
    name = "monitoring_get_servers",
    description = "Retrieves the servers belonging to the clusters of your Algolia application",
    label = "Servers"
)]
impl GetServers {
    async fn call(&self, ctx: &InvocationContext, _params: NoParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let request = ApiRequest::get(Host::Status, "/1/inventory/servers").auth(key);
        ctx.send(request).await
    }
}

pub struct GetMetrics;

#[tool(
    name = "monitoring_get_metrics",
    description = "Retrieves metrics related to your Algolia infrastructure, aggregated over a selected time window",
    label = "Infrastructure Metrics"
)]
impl GetMetrics {
    async fn call(&self, ctx: &InvocationContext, params: MetricsParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let request = ApiRequest::get(Host::Status, "/1/infrastructure")
            .segment(params.metric.as_str())
            .segment("period")
            .segment(params.period.as_str())
            .auth(key);
        ctx.send(request).await
    }
}
