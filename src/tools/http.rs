use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use crate::config::{EndpointConfig, EnvConfig, SearchParameters};
use crate::error::{Result, RouteFlowError};
use crate::message::Message;

use super::structured::StructuredQueryService;
use super::vector_search::{VectorSearchResponse, VectorSearchService};

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(300))
        .build()
        .map_err(|e| RouteFlowError::Config(format!("failed to build HTTP client: {}", e)))
}

async fn post_json(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &Value,
) -> Result<Value> {
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| RouteFlowError::Service(format!("request to {} failed: {}", url, e)))?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(RouteFlowError::Service(format!(
            "{} returned {}: {}",
            url, status, text
        )));
    }
    response
        .json()
        .await
        .map_err(|e| RouteFlowError::Service(format!("invalid response from {}: {}", url, e)))
}

/// Similarity search against an index query endpoint.
pub struct HttpVectorSearchService {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpVectorSearchService {
    pub fn from_endpoint(endpoint: &EndpointConfig) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            url: endpoint.url.clone(),
            api_key: EnvConfig::endpoint_api_key(endpoint)?,
        })
    }
}

pub fn search_body(query: &str, params: &SearchParameters) -> Value {
    let mut body = json!({
        "query_text": query,
        "columns": params.columns,
        "num_results": params.num_results,
    });
    if let Some(filters) = &params.filters {
        body["filters_json"] = json!(filters.to_string());
    }
    if let Some(query_type) = &params.query_type {
        body["query_type"] = json!(query_type);
    }
    body
}

#[async_trait]
impl VectorSearchService for HttpVectorSearchService {
    #[instrument(skip(self, params), fields(url = %self.url))]
    async fn similarity_search(
        &self,
        query: &str,
        params: &SearchParameters,
    ) -> Result<VectorSearchResponse> {
        let payload = post_json(&self.client, &self.url, &self.api_key, &search_body(query, params))
            .await?;
        serde_json::from_value(payload).map_err(RouteFlowError::from)
    }
}

/// Structured-query service that accepts and returns `{"messages": [...]}`.
pub struct HttpStructuredQueryService {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpStructuredQueryService {
    pub fn from_endpoint(endpoint: &EndpointConfig) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            url: endpoint.url.clone(),
            api_key: EnvConfig::endpoint_api_key(endpoint)?,
        })
    }
}

#[async_trait]
impl StructuredQueryService for HttpStructuredQueryService {
    #[instrument(skip_all, fields(url = %self.url, history = messages.len()))]
    async fn invoke(&self, messages: &[Message]) -> Result<Vec<Message>> {
        let history: Vec<Value> = messages
            .iter()
            .map(|m| json!({"role": m.role(), "content": m.content()}))
            .collect();
        let payload = post_json(
            &self.client,
            &self.url,
            &self.api_key,
            &json!({ "messages": history }),
        )
        .await?;
        Ok(payload["messages"]
            .as_array()
            .map(|replies| {
                replies
                    .iter()
                    .filter_map(|reply| reply["content"].as_str())
                    .map(Message::assistant)
                    .collect()
            })
            .unwrap_or_default())
    }
}
