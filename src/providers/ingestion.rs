//! Connector and transformation tools (regional data host).
//!
//! The tools carry the region they were registered for, taken from `ALGOLIA_REGION`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use serde_with::skip_serializing_none;
use tracing::debug;
use uuid::Uuid;

use super::{require, NoParams};
use crate::client::{ApiRequest, Host, Region};
use crate::dispatch::InvocationContext;
use crate::registry::RegistryError;
use crate::tool;
use crate::tools::{ToolDescriptor, ToolError};

pub fn descriptors(region: Region) -> Result<Vec<ToolDescriptor>, RegistryError> {
    Ok(vec![
        ToolDescriptor::from_tool(ListConnectors { region })?,
        ToolDescriptor::from_tool(ListTasksForConnector { region })?,
        ToolDescriptor::from_tool(StartTask { region })?,
        ToolDescriptor::from_tool(CreateJsonConnector { region })?,
        ToolDescriptor::from_tool(ListTransformations { region })?,
        ToolDescriptor::from_tool(GetTransformation { region })?,
        ToolDescriptor::from_tool(UpdateTransformation { region })?,
        ToolDescriptor::from_tool(TryTransformation { region })?,
    ])
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SourceIdParams {
    /// The source or connector id to look up
    pub source_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TaskIdParams {
    /// The task id to start
    pub task_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct JsonConnectorParams {
    /// The URL to the hosted json file
    pub url: String,
    /// The json property we will use as unique identifier (Algolia ObjectID afterward)
    pub unique_column_name: String,
    /// Algolia index name you want to use or create (defaults to ALGOLIA_INDEX_NAME)
    pub index_name: Option<String>,
    /// The cron schedule to run the task
    pub scheduled_cron: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TransformationIdParams {
    /// The transformation id to look up
    pub transformation_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateTransformationParams {
    /// The transformation id to look up
    pub transformation_id: String,
    /// The code of the transformation
    pub code: String,
    /// The name of the transformation
    pub name: String,
    /// The description of the transformation
    pub description: Option<String>,
    /// The authentications the transformation may use
    pub authentication_ids: Option<Vec<String>>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct TransformationBody {
    code: String,
    name: String,
    description: Option<String>,
    #[serde(rename = "authenticationIDs")]
    authentication_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TryTransformationParams {
    /// The javascript code we want to try
    pub code: String,
    /// the JSON object we want to use as a sample
    pub sample: Map<String, Value>,
}

/// Pull the id a creation step returned, failing the whole call when it is missing.
fn created_id(response: &Value, field: &str, step: &str) -> Result<String, ToolError> {
    response
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::Error(format!("unable to create {}: response has no {}", step, field)))
}

/// Task ids in a `/2/tasks` listing that belong to `source_id`.
fn task_ids_for_source(listing: &Value, source_id: &str) -> Vec<String> {
    listing
        .get("tasks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|task| task.get("sourceID").and_then(Value::as_str) == Some(source_id))
        .filter_map(|task| task.get("taskID").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

pub struct ListConnectors {
    region: Region,
}

#[tool(
    name = "list_connector",
    description = "List all existing connectors",
    label = "connectors"
)]
impl ListConnectors {
    async fn call(&self, ctx: &InvocationContext, _params: NoParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let request = ApiRequest::get(Host::Ingestion(self.region), "/1/sources").auth(key);
        ctx.send(request).await
    }
}

pub struct ListTasksForConnector {
    region: Region,
}

#[tool(
    name = "list_tasks_for_a_connector",
    description = "List all tasks for a source or a connector",
    label = "tasks_for_this_source"
)]
impl ListTasksForConnector {
    async fn call(&self, ctx: &InvocationContext, params: SourceIdParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let source_id = require("source_id", &params.source_id)?;

        let request = ApiRequest::get(Host::Ingestion(self.region), "/2/tasks")
            .query("sourceID", source_id)
            .auth(key);
        let listing = ctx.send(request).await?;

        let has_tasks = listing
            .get("tasks")
            .and_then(Value::as_array)
            .is_some_and(|tasks| !tasks.is_empty());
        if !has_tasks {
            return Err(ToolError::Error("could not find any tasks".to_string()));
        }

        Ok(json!(task_ids_for_source(&listing, source_id)))
    }
}

pub struct StartTask {
    region: Region,
}

#[tool(name = "start_task", description = "Start a task", label = "task")]
impl StartTask {
    async fn call(&self, ctx: &InvocationContext, params: TaskIdParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let task_id = require("task_id", &params.task_id)?;

        let request = ApiRequest::post(Host::Ingestion(self.region), "/2/tasks")
            .segment(task_id)
            .segment("run")
            .auth(key);
        ctx.send(request).await
    }
}

pub struct CreateJsonConnector {
    region: Region,
}

#[tool(
    name = "create_new_json_connector",
    description = "Create a new JSON connector",
    label = "task"
)]
impl CreateJsonConnector {
    /// Source, authentication, destination, then the task tying them together.
    /// A failing step stops the chain; resources already created are left in place.
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: JsonConnectorParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let url = require("url", &params.url)?;
        let unique_column = require("unique_column_name", &params.unique_column_name)?;
        let index_name = ctx
            .credentials()
            .index_or_default(params.index_name)
            .map_err(|_| {
                ToolError::invalid_argument(
                    "index_name",
                    "index_name is required when ALGOLIA_INDEX_NAME is not set",
                )
            })?;
        let host = Host::Ingestion(self.region);

        let source = ctx
            .send(
                ApiRequest::post(host.clone(), "/1/sources")
                    .json(json!({
                        "type": "json",
                        "name": format!("JSON connector {}", Uuid::new_v4()),
                        "input": {
                            "url": url,
                            "uniqueIDColumn": unique_column,
                            "method": "GET",
                        },
                    }))
                    .auth(key),
            )
            .await?;
        let source_id = created_id(&source, "sourceID", "source")?;
        debug!("Created ingestion source {}", source_id);

        let authentication = ctx
            .send(
                ApiRequest::post(host.clone(), "/1/authentications")
                    .json(json!({
                        "type": "algolia",
                        "name": format!("Algolia API key {}", Uuid::new_v4()),
                        "input": {
                            "appID": key.app_id,
                            "apiKey": key.api_key,
                        },
                    }))
                    .auth(key),
            )
            .await?;
        let authentication_id = created_id(&authentication, "authenticationID", "authentication")?;

        let destination = ctx
            .send(
                ApiRequest::post(host.clone(), "/1/destinations")
                    .json(json!({
                        "type": "search",
                        "name": format!("Index {} {}", index_name, Uuid::new_v4()),
                        "input": { "indexName": index_name },
                        "authenticationID": authentication_id,
                    }))
                    .auth(key),
            )
            .await?;
        let destination_id = created_id(&destination, "destinationID", "destination")?;
        debug!("Created ingestion destination {}", destination_id);

        let mut task = json!({
            "sourceID": source_id,
            "destinationID": destination_id,
            "action": "replace",
            "enabled": true,
        });
        if let Some(cron) = params.scheduled_cron.filter(|c| !c.trim().is_empty()) {
            task["cron"] = Value::String(cron);
        }

        ctx.send(ApiRequest::post(host, "/2/tasks").json(task).auth(key))
            .await
    }
}

pub struct ListTransformations {
    region: Region,
}

#[tool(
    name = "list_transformations",
    description = "List all existing JS transformations",
    label = "transformations"
)]
impl ListTransformations {
    async fn call(&self, ctx: &InvocationContext, _params: NoParams) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let request = ApiRequest::get(Host::Ingestion(self.region), "/1/transformations").auth(key);
        ctx.send(request).await
    }
}

pub struct GetTransformation {
    region: Region,
}

#[tool(
    name = "get_transformation",
    description = "Get a transformation by its ID",
    label = "transformation"
)]
impl GetTransformation {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: TransformationIdParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let id = require("transformation_id", &params.transformation_id)?;

        let request = ApiRequest::get(Host::Ingestion(self.region), "/1/transformations")
            .segment(id)
            .auth(key);
        ctx.send(request).await
    }
}

pub struct UpdateTransformation {
    region: Region,
}

#[tool(
    name = "update_transformation",
    description = "Update a transformation by its ID. You need to take all the parameters of the previously fetched transformation, not just the ones you want to update",
    label = "transformation"
)]
impl UpdateTransformation {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: UpdateTransformationParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let id = require("transformation_id", &params.transformation_id)?.to_string();
        require("code", &params.code)?;
        require("name", &params.name)?;

        let body = TransformationBody {
            code: params.code,
            name: params.name,
            description: params.description.filter(|d| !d.is_empty()),
            authentication_ids: params.authentication_ids,
        };

        let request = ApiRequest::put(Host::Ingestion(self.region), "/1/transformations")
            .segment(id)
            .json(serde_json::to_value(body)?)
            .auth(key);
        ctx.send(request).await
    }
}

pub struct TryTransformation {
    region: Region,
}

#[tool(
    name = "try_transformation",
    description = "Execute the JavaScript transformation code with a specific sample dataset.",
    label = "transformed sample"
)]
impl TryTransformation {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: TryTransformationParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        require("code", &params.code)?;

        let request = ApiRequest::post(Host::Ingestion(self.region), "/1/transformations/try")
            .json(json!({
                "code": params.code,
                "sampleRecord": params.sample,
            }))
            .auth(key);
        ctx.send(request).await
    }
}
