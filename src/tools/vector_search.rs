use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::config::{SearchParameters, VectorSearchToolSettings};
use crate::error::{Result, RouteFlowError};

use super::manifest::{FieldType, ToolField, ToolSpec};
use super::tool::{Tool, ToolInvocation};

/// Columnar response of a nearest-neighbour text index.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VectorSearchResponse {
    #[serde(default)]
    pub manifest: SearchManifest,
    #[serde(default)]
    pub result: SearchResultSet,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchManifest {
    #[serde(default)]
    pub columns: Vec<SearchColumn>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchColumn {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchResultSet {
    #[serde(default)]
    pub row_count: usize,
    #[serde(default)]
    pub data_array: Vec<Vec<Value>>,
}

impl VectorSearchResponse {
    /// Builds a response from column names and rows, mostly for fakes.
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            manifest: SearchManifest {
                columns: columns
                    .iter()
                    .map(|name| SearchColumn {
                        name: name.to_string(),
                    })
                    .collect(),
            },
            result: SearchResultSet {
                row_count: rows.len(),
                data_array: rows,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_uri: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

#[async_trait]
pub trait VectorSearchService: Send + Sync {
    async fn similarity_search(
        &self,
        query: &str,
        params: &SearchParameters,
    ) -> Result<VectorSearchResponse>;
}

/// Turns the columnar response into hits. Never fails: rows without usable
/// content are dropped, so callers always get a (possibly empty) list.
pub fn parse_search_results(response: &VectorSearchResponse) -> Vec<SearchHit> {
    if response.result.row_count == 0 && response.result.data_array.is_empty() {
        return Vec::new();
    }
    let columns: Vec<&str> = response
        .manifest
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect();

    let mut hits = Vec::new();
    for (index, row) in response.result.data_array.iter().enumerate() {
        let mut info: Map<String, Value> = Map::new();
        for (column, cell) in columns.iter().zip(row.iter()) {
            info.insert(column.to_string(), cell.clone());
        }

        let content = match info.get("content").and_then(|v| v.as_str()) {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            Some(_) => continue,
            None => {
                debug!(row = index, "search row without string content skipped");
                continue;
            }
        };

        // the index appends the similarity score after the requested columns
        let score = info
            .get("score")
            .or_else(|| row.get(columns.len()))
            .and_then(|v| v.as_f64())
            .unwrap_or_default();

        let id = match info.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => format!("row-{}", index),
        };

        hits.push(SearchHit {
            id,
            content,
            score,
            doc_uri: info
                .get("doc_uri")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            metadata: info.get("metadata").cloned().unwrap_or(Value::Null),
        });
    }
    hits
}

/// Serializes hits as `{"fact_1": ..., "fact_2": ...}` in rank order.
pub fn format_facts(hits: &[SearchHit]) -> Result<String> {
    let mut facts = Map::new();
    for (i, hit) in hits.iter().enumerate() {
        facts.insert(format!("fact_{}", i + 1), Value::String(hit.content.clone()));
    }
    serde_json::to_string_pretty(&Value::Object(facts)).map_err(RouteFlowError::from)
}

pub struct VectorSearchTool {
    spec: ToolSpec,
    params: SearchParameters,
    service: Arc<dyn VectorSearchService>,
}

impl VectorSearchTool {
    pub fn new(
        settings: &VectorSearchToolSettings,
        params: SearchParameters,
        service: Arc<dyn VectorSearchService>,
    ) -> Self {
        let spec = ToolSpec::builder(settings.tool_name.clone())
            .description(settings.tool_description.clone())
            .input(
                ToolField::new("query", FieldType::String)
                    .required()
                    .with_description(settings.tool_arguments.query_input_description.clone()),
            )
            .build();
        Self {
            spec,
            params,
            service,
        }
    }

    #[instrument(skip(self), fields(tool = %self.spec.name))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response = self.service.similarity_search(query, &self.params).await?;
        let hits = parse_search_results(&response);
        debug!(hits = hits.len(), "vector search completed");
        Ok(hits)
    }
}

#[async_trait]
impl Tool for VectorSearchTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, invocation: ToolInvocation) -> Result<String> {
        let query = invocation
            .str_arg("query")
            .ok_or_else(|| RouteFlowError::InvalidArguments {
                tool: self.spec.name.clone(),
                reason: "missing `query`".to_string(),
            })?;
        let hits = self.retrieve(query).await?;
        format_facts(&hits)
    }
}
