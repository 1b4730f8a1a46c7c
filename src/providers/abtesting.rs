//! A/B testing tools (analytics host).

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::parse_json_arg;
use crate::client::{ApiRequest, Host};
use crate::dispatch::InvocationContext;
use crate::registry::RegistryError;
use crate::tool;
use crate::tools::{ToolDescriptor, ToolError};

pub fn descriptors() -> Result<Vec<ToolDescriptor>, RegistryError> {
    Ok(vec![
        ToolDescriptor::from_tool(ListAbTests)?,
        ToolDescriptor::from_tool(GetAbTest)?,
        ToolDescriptor::from_tool(CreateAbTest)?,
        ToolDescriptor::from_tool(DeleteAbTest)?,
        ToolDescriptor::from_tool(StopAbTest)?,
        ToolDescriptor::from_tool(EstimateAbTest)?,
        ToolDescriptor::from_tool(ScheduleAbTest)?,
    ])
}

/// Decode the `variants` argument; Algolia A/B tests always compare exactly two.
fn parse_variants(raw: &str) -> Result<Vec<Value>, ToolError> {
    let variants: Vec<Value> = parse_json_arg("variants", raw)?;
    if variants.len() != 2 {
        return Err(ToolError::invalid_argument(
            "variants",
            "exactly 2 variants are required",
        ));
    }
    Ok(variants)
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListAbTestsParams {
    /// Position of the first item to return
    pub offset: Option<i64>,
    /// Number of items to return
    pub limit: Option<i64>,
    /// Index name prefix. Only A/B tests for indices starting with this string are included in the response
    pub index_prefix: Option<String>,
    /// Index name suffix. Only A/B tests for indices ending with this string are included in the response
    pub index_suffix: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AbTestIdParams {
    /// Unique A/B test identifier
    pub id: f64,
}

impl AbTestIdParams {
    /// Clients may send `42.0`; the path needs the integer form.
    fn abtest_id(&self) -> Result<u64, ToolError> {
        let whole = self.id.is_finite() && self.id.fract() == 0.0;
        if whole && self.id >= 0.0 && self.id <= u64::MAX as f64 {
            Ok(self.id as u64)
        } else {
            Err(ToolError::invalid_argument(
                "id",
                format!("A/B test id must be a non-negative whole number, got {}", self.id),
            ))
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAbTestParams {
    /// A/B test name
    pub name: String,
    /// End date and time of the A/B test in RFC 3339 format (e.g. 2023-06-17T00:00:00Z)
    pub end_at: String,
    /// A/B test variants as JSON array (exactly 2 variants required). Each variant must have 'index' and 'trafficPercentage' fields and may optionally have 'description' and 'customSearchParameters' fields.
    pub variants: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EstimateAbTestParams {
    /// A/B test variants as JSON array (exactly 2 variants required). Each variant must have 'index' and 'trafficPercentage' fields and may optionally have 'description' and 'customSearchParameters' fields.
    pub variants: String,
    /// A/B test configuration as JSON object. Must include 'minimumDetectableEffect' with 'size' and 'metric' fields. May optionally include 'outliers' and 'emptySearch' settings.
    pub configuration: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleAbTestParams {
    /// A/B test name
    pub name: String,
    /// Date and time when the A/B test is scheduled to start in RFC 3339 format (e.g. 2023-06-15T15:06:44.400601Z)
    pub scheduled_at: String,
    /// End date and time of the A/B test in RFC 3339 format (e.g. 2023-06-17T00:00:00Z)
    pub end_at: String,
    /// A/B test variants as JSON array (exactly 2 variants required). Each variant must have 'index' and 'trafficPercentage' fields and may optionally have 'description' and 'customSearchParameters' fields.
    pub variants: String,
}

pub struct ListAbTests;

#[tool(
    name = "abtesting_list_abtests",
    description = "List all A/B tests configured for this application",
    label = "AB Tests"
)]
impl ListAbTests {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: ListAbTestsParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;

        let request = ApiRequest::get(Host::Analytics, "/2/abtests")
            .query_opt("offset", params.offset)
            .query_opt("limit", params.limit)
            .query_opt("indexPrefix", params.index_prefix.filter(|p| !p.is_empty()))
            .query_opt("indexSuffix", params.index_suffix.filter(|s| !s.is_empty()))
            .auth(key);

        ctx.send(request).await
    }
}

pub struct GetAbTest;

#[tool(
    name = "abtesting_get_abtest",
    description = "Retrieve the details for an A/B test by its ID",
    label = "AB Test"
)]
impl GetAbTest {
    async fn call(&self, ctx: &InvocationContext, params: AbTestIdParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let id = params.abtest_id()?;
        let request = ApiRequest::get(Host::Analytics, "/2/abtests")
            .segment(id)
            .auth(key);
        ctx.send(request).await
    }
}

pub struct CreateAbTest;

#[tool(
    name = "abtesting_create_abtest",
    description = "Create a new A/B test",
    label = "AB Test Created"
)]
impl CreateAbTest {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: CreateAbTestParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let variants = parse_variants(&params.variants)?;

        let request = ApiRequest::post(Host::Analytics, "/2/abtests")
            .json(json!({
                "name": params.name,
                "endAt": params.end_at,
                "variants": variants,
            }))
            .auth(key);

        ctx.send(request).await
    }
}

pub struct DeleteAbTest;

#[tool(
    name = "abtesting_delete_abtest",
    description = "Delete an A/B test by its ID",
    label = "AB Test Deleted"
)]
impl DeleteAbTest {
    async fn call(&self, ctx: &InvocationContext, params: AbTestIdParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let id = params.abtest_id()?;
        let request = ApiRequest::delete(Host::Analytics, "/2/abtests")
            .segment(id)
            .auth(key);
        ctx.send(request).await
    }
}

pub struct StopAbTest;

#[tool(
    name = "abtesting_stop_abtest",
    description = "Stop an A/B test by its ID. You can't restart stopped A/B tests.",
    label = "AB Test Stopped"
)]
impl StopAbTest {
    async fn call(&self, ctx: &InvocationContext, params: AbTestIdParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let id = params.abtest_id()?;
        let request = ApiRequest::post(Host::Analytics, "/2/abtests")
            .segment(id)
            .segment("stop")
            .auth(key);
        ctx.send(request).await
    }
}

pub struct EstimateAbTest;

#[tool(
    name = "abtesting_estimate_abtest",
    description = "Estimate the sample size and duration of an A/B test based on historical traffic",
    label = "AB Test Estimate"
)]
impl EstimateAbTest {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: EstimateAbTestParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let variants = parse_variants(&params.variants)?;

        let configuration: Map<String, Value> =
            parse_json_arg("configuration", &params.configuration)?;
        if !configuration.contains_key("minimumDetectableEffect") {
            return Err(ToolError::invalid_argument(
                "configuration",
                "configuration must include 'minimumDetectableEffect'",
            ));
        }

        let request = ApiRequest::post(Host::Analytics, "/2/abtests/estimate")
            .json(json!({
                "configuration": configuration,
                "variants": variants,
            }))
            .auth(key);

        ctx.send(request).await
    }
}

pub struct ScheduleAbTest;

#[tool(
    name = "abtesting_schedule_abtest",
    description = "Schedule an A/B test to be started at a later time",
    label = "AB Test Scheduled"
)]
impl ScheduleAbTest {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: ScheduleAbTestParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let variants = parse_variants(&params.variants)?;

        let request = ApiRequest::post(Host::Analytics, "/2/abtests/schedule")
            .json(json!({
                "name": params.name,
                "scheduledAt": params.scheduled_at,
                "endAt": params.end_at,
                "variants": variants,
            }))
            .auth(key);

        ctx.send(request).await
    }
}
