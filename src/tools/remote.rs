use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::config::{EndpointConfig, EnvConfig};
use crate::error::{Result, RouteFlowError};

use super::manifest::ToolSpec;
use super::tool::{Tool, ToolInvocation};

/// Minimal JSON-RPC 2.0 client for tool servers (`tools/list`, `tools/call`).
pub struct JsonRpcClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| RouteFlowError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_endpoint(endpoint: &EndpointConfig) -> Result<Self> {
        let api_key = EnvConfig::endpoint_api_key(endpoint).ok();
        Self::new(endpoint.url.clone(), api_key)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[instrument(skip(self, params), fields(url = %self.url))]
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| RouteFlowError::Service(format!("{} request failed: {}", method, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RouteFlowError::Service(format!(
                "{} returned HTTP {}",
                method, status
            )));
        }
        let payload: Value = response
            .json()
            .await
            .map_err(|e| RouteFlowError::Service(format!("invalid {} response: {}", method, e)))?;
        if let Some(error) = payload.get("error") {
            return Err(RouteFlowError::Service(format!(
                "{} failed: {}",
                method,
                error["message"].as_str().unwrap_or("unknown error")
            )));
        }
        Ok(payload["result"].clone())
    }
}

/// A tool hosted on a remote server; input schema comes from discovery.
pub struct RemoteTool {
    spec: ToolSpec,
    client: Arc<JsonRpcClient>,
}

impl RemoteTool {
    pub fn new(spec: ToolSpec, client: Arc<JsonRpcClient>) -> Self {
        Self { spec, client }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, invocation: ToolInvocation) -> Result<String> {
        let result = self
            .client
            .call(
                "tools/call",
                json!({ "name": self.spec.name, "arguments": invocation.input }),
            )
            .await?;
        let text = join_text_content(&result);
        if result["isError"].as_bool().unwrap_or(false) {
            return Err(RouteFlowError::Service(text));
        }
        Ok(text)
    }
}

/// Concatenates the `text` parts of a `tools/call` result.
pub fn join_text_content(result: &Value) -> String {
    result["content"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Turns a `tools/list` result into specs. Entries without a name are skipped.
pub fn specs_from_listing(result: &Value) -> Vec<ToolSpec> {
    result["tools"]
        .as_array()
        .map(|tools| {
            tools
                .iter()
                .filter_map(|tool| {
                    let name = tool["name"].as_str()?;
                    Some(ToolSpec::from_json_schema(
                        name,
                        tool["description"].as_str().filter(|d| !d.is_empty()),
                        &tool["inputSchema"],
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub async fn discover_remote_tools(endpoint: &EndpointConfig) -> Result<Vec<RemoteTool>> {
    let client = Arc::new(JsonRpcClient::from_endpoint(endpoint)?);
    let listing = client.call("tools/list", json!({})).await?;
    let tools: Vec<RemoteTool> = specs_from_listing(&listing)
        .into_iter()
        .map(|spec| RemoteTool::new(spec, Arc::clone(&client)))
        .collect();
    debug!(url = %client.url(), count = tools.len(), "discovered remote tools");
    Ok(tools)
}

/// Loads tools from every server. A server that cannot be listed is skipped.
pub async fn load_remote_tools(endpoints: &[EndpointConfig]) -> Vec<Arc<dyn Tool>> {
    let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
    for endpoint in endpoints {
        match discover_remote_tools(endpoint).await {
            Ok(found) => tools.extend(found.into_iter().map(|t| Arc::new(t) as Arc<dyn Tool>)),
            Err(err) => warn!(url = %endpoint.url, error = %err, "failed to load tools"),
        }
    }
    tools
}
