//! Collections tools (experiences host).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

use super::{parse_json_arg, require};
use crate::client::{ApiRequest, Host};
use crate::dispatch::InvocationContext;
use crate::registry::RegistryError;
use crate::tool;
use crate::tools::{ToolDescriptor, ToolError};

pub fn descriptors() -> Result<Vec<ToolDescriptor>, RegistryError> {
    Ok(vec![
        ToolDescriptor::from_tool(ListCollections)?,
        ToolDescriptor::from_tool(GetCollection)?,
        ToolDescriptor::from_tool(UpsertCollection)?,
        ToolDescriptor::from_tool(DeleteCollection)?,
        ToolDescriptor::from_tool(CommitCollection)?,
    ])
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionsParams {
    /// Name of the index
    pub index_name: String,
    /// Number of items to skip (default to 0)
    pub offset: Option<i64>,
    /// Number of items per fetch (defaults to 10)
    pub limit: Option<i64>,
    /// Query to filter collections
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CollectionIdParams {
    /// Collection ID
    pub id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCollectionParams {
    /// Collection ID (optional for new collections)
    pub id: Option<String>,
    /// Name of the index
    pub index_name: String,
    /// Collection name
    pub name: String,
    /// Collection description
    pub description: Option<String>,
    /// JSON array of objectIDs to add to the collection
    pub add: Option<String>,
    /// JSON array of objectIDs to remove from the collection
    pub remove: Option<String>,
    /// JSON object with conditions to filter records
    pub conditions: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionBody {
    index_name: String,
    name: String,
    id: Option<String>,
    description: Option<String>,
    add: Option<Vec<String>>,
    remove: Option<Vec<String>>,
    conditions: Option<Map<String, Value>>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub struct ListCollections;

#[tool(
    name = "collections_list_collections",
    description = "Retrieve a list of all collections",
    label = "Collections"
)]
impl ListCollections {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: ListCollectionsParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let index_name = require("indexName", &params.index_name)?;

        let request = ApiRequest::get(Host::Experiences, "/1/collections")
            .query("indexName", index_name)
            .query_opt("offset", params.offset)
            .query_opt("limit", params.limit)
            .query_opt("query", non_empty(params.query))
            .auth(key);

        ctx.send(request).await
    }
}

pub struct GetCollection;

#[tool(
    name = "collections_get_collection",
    description = "Retrieve a collection by ID",
    label = "Collection"
)]
impl GetCollection {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: CollectionIdParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().read()?;
        let id = require("id", &params.id)?;

        let request = ApiRequest::get(Host::Experiences, "/1/collections")
            .segment(id)
            .auth(key);
        ctx.send(request).await
    }
}

pub struct UpsertCollection;

#[tool(
    name = "collections_upsert_collection",
    description = "Upserts a collection",
    label = "Collection Upserted"
)]
impl UpsertCollection {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: UpsertCollectionParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        require("indexName", &params.index_name)?;
        require("name", &params.name)?;

        let body = CollectionBody {
            add: non_empty(params.add)
                .map(|raw| parse_json_arg("add", &raw))
                .transpose()?,
            remove: non_empty(params.remove)
                .map(|raw| parse_json_arg("remove", &raw))
                .transpose()?,
            conditions: non_empty(params.conditions)
                .map(|raw| parse_json_arg("conditions", &raw))
                .transpose()?,
            index_name: params.index_name,
            name: params.name,
            id: non_empty(params.id),
            description: non_empty(params.description),
        };

        let request = ApiRequest::post(Host::Experiences, "/1/collections")
            .json(serde_json::to_value(body)?)
            .auth(key);
        ctx.send(request).await
    }
}

pub struct DeleteCollection;

#[tool(
    name = "collections_delete_collection",
    description = "Soft deletes a collection by setting 'deleted' to true",
    label = "Collection Deleted"
)]
impl DeleteCollection {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: CollectionIdParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let id = require("id", &params.id)?;

        let request = ApiRequest::delete(Host::Experiences, "/1/collections")
            .segment(id)
            .auth(key);
        ctx.send(request).await
    }
}

pub struct CommitCollection;

#[tool(
    name = "collections_commit_collection",
    description = "Evaluates the changes on a collection and replicates them to the index",
    label = "Collection Commit Started"
)]
impl CommitCollection {
    async fn call(
        &self,
        ctx: &InvocationContext,
        params: CollectionIdParams,
    ) -> Result<Value, ToolError> {
        let key = ctx.credentials().write()?;
        let id = require("id", &params.id)?;

        let request = ApiRequest::post(Host::Experiences, "/1/collections")
            .segment(id)
            .segment("commit")
            .auth(key);
        ctx.send(request).await
    }
}
