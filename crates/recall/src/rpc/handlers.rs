//! Method dispatch for the JSON-RPC surface
//!
//! Each logical operation maps to one method name. Parameters are explicit
//! structs deserialized from the request's `params` mapping; results are
//! JSON mappings.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::engine::MemoryEngine;
use crate::error::{RecallError, Result};
use crate::memory::filter::ListFilter;
use crate::memory::types::{EdgeType, MemoryId, MemoryPatch, MemoryType, NewMemory};

/// Hard cap on page sizes accepted over the wire
const MAX_LIMIT: usize = 1000;

/// Every method name the dispatcher understands
pub const METHODS: &[&str] = &[
    "memory_create",
    "memory_get",
    "memory_update",
    "memory_delete",
    "memory_list",
    "memory_search",
    "memory_search_suggest",
    "memory_link",
    "memory_unlink",
    "memory_related",
    "memory_stats",
];

/// Whether a method name is part of the RPC surface
pub fn is_known_method(method: &str) -> bool {
    METHODS.contains(&method)
}

#[derive(Debug, Deserialize)]
struct IdParams {
    id: MemoryId,
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    id: MemoryId,
    #[serde(flatten)]
    patch: MemoryPatch,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default = "default_list_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    workspace: Option<String>,
    #[serde(default)]
    memory_type: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

fn default_list_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default = "default_search_limit")]
    limit: usize,
    #[serde(default)]
    workspace: Option<String>,
}

fn default_search_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
struct LinkParams {
    from_id: MemoryId,
    to_id: MemoryId,
    #[serde(default = "default_edge_type")]
    edge_type: String,
}

fn default_edge_type() -> String {
    "related_to".to_string()
}

#[derive(Debug, Deserialize)]
struct QueryParams {
    query: String,
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T> {
    // Absent params means an empty mapping
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params)
        .map_err(|e| RecallError::InvalidArgument(format!("invalid params: {e}")))
}

fn check_limit(limit: usize) -> Result<()> {
    if limit > MAX_LIMIT {
        return Err(RecallError::InvalidArgument(format!(
            "limit must be at most {MAX_LIMIT}, got {limit}"
        )));
    }
    Ok(())
}

/// Dispatch one logical operation against the engine
pub async fn dispatch(
    engine: &MemoryEngine,
    tenant: &str,
    method: &str,
    params: Value,
) -> Result<Value> {
    match method {
        "memory_create" => {
            let input: NewMemory = parse_params(params)?;
            let memory = engine.create(tenant, input).await?;
            Ok(serde_json::to_value(memory)?)
        }
        "memory_get" => {
            let IdParams { id } = parse_params(params)?;
            let memory = engine.get(tenant, id)?;
            Ok(serde_json::to_value(memory)?)
        }
        "memory_update" => {
            let UpdateParams { id, patch } = parse_params(params)?;
            let memory = engine.update(tenant, id, patch).await?;
            Ok(serde_json::to_value(memory)?)
        }
        "memory_delete" => {
            let IdParams { id } = parse_params(params)?;
            engine.delete(tenant, id).await?;
            Ok(json!({ "deleted": true, "id": id }))
        }
        "memory_list" => {
            let list: ListParams = parse_params(params)?;
            check_limit(list.limit)?;
            let mut filter = ListFilter::new();
            if let Some(workspace) = list.workspace {
                filter = filter.with_workspace(workspace);
            }
            if let Some(ref raw) = list.memory_type {
                filter = filter.with_memory_type(MemoryType::parse(raw)?);
            }
            if let Some(tags) = list.tags {
                filter = filter.with_tags(tags);
            }
            let page = engine.list(tenant, &filter, list.limit, list.offset)?;
            Ok(serde_json::to_value(page)?)
        }
        "memory_search" => {
            let search: SearchParams = parse_params(params)?;
            check_limit(search.limit)?;
            let results = engine
                .search(
                    tenant,
                    &search.query,
                    search.limit,
                    search.workspace.as_deref(),
                )
                .await?;
            Ok(json!({ "results": results }))
        }
        "memory_search_suggest" => {
            let QueryParams { query } = parse_params(params)?;
            let suggestions = engine.suggest(tenant, &query)?;
            Ok(serde_json::to_value(suggestions)?)
        }
        "memory_link" => {
            let link: LinkParams = parse_params(params)?;
            let edge_type: EdgeType = link.edge_type.parse()?;
            let created = engine
                .link(tenant, link.from_id, link.to_id, edge_type)
                .await?;
            Ok(json!({ "created": created }))
        }
        "memory_unlink" => {
            let link: LinkParams = parse_params(params)?;
            let edge_type: EdgeType = link.edge_type.parse()?;
            let removed = engine
                .unlink(tenant, link.from_id, link.to_id, edge_type)
                .await?;
            Ok(json!({ "removed": removed }))
        }
        "memory_related" => {
            let IdParams { id } = parse_params(params)?;
            let related = engine.related(tenant, id)?;
            Ok(json!({ "related": related }))
        }
        "memory_stats" => {
            let stats = engine.stats(tenant);
            Ok(serde_json::to_value(stats)?)
        }
        other => Err(RecallError::InvalidArgument(format!(
            "unknown method: {other}"
        ))),
    }
}
