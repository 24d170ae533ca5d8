use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RouteFlowError};

use super::workers::{WorkerId, WorkerRoster, SUPERVISOR};

/// 运行时配置（JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub llm_parameters: LlmParameters,
    #[serde(default = "default_max_iterations")]
    pub agents_max_iterations: u32,
    /// Node whose tokens are streamed to the caller as text deltas.
    #[serde(default = "default_final_node")]
    pub final_node: String,
    pub agents: OrderedAgents,
    #[serde(default)]
    pub vector_search_parameters: SearchParameters,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub guard: GuardSettings,
}

fn default_max_iterations() -> u32 {
    3
}

fn default_final_node() -> String {
    WorkerId::ResponseAgent.as_str().to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Per-agent settings. `tools` is only meaningful for the unstructured worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<AgentTools>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentTools {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_search_tool: Option<VectorSearchToolSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchToolSettings {
    pub tool_name: String,
    pub tool_description: String,
    #[serde(default)]
    pub tool_arguments: VectorSearchArguments,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchArguments {
    #[serde(default = "default_query_description")]
    pub query_input_description: String,
}

impl Default for VectorSearchArguments {
    fn default() -> Self {
        Self {
            query_input_description: default_query_description(),
        }
    }
}

fn default_query_description() -> String {
    "The string used to query the index".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchParameters {
    #[serde(default = "default_num_results")]
    pub num_results: usize,
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
}

fn default_num_results() -> usize {
    5
}

fn default_columns() -> Vec<String> {
    ["id", "doc_uri", "content", "metadata"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            num_results: default_num_results(),
            columns: default_columns(),
            filters: None,
            query_type: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<EndpointConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_query: Option<EndpointConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_search: Option<EndpointConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<EndpointConfig>,
    /// JSON-RPC tool servers whose tools are bound to the unstructured worker.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_servers: Vec<EndpointConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Literal key, `${ENV_VAR}` reference, or empty to read `api_key_env`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_key_env() -> String {
    "AGENTROUTE_API_KEY".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub ignore_old_messages: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl AgentConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: AgentConfig = serde_json::from_str(raw)
            .map_err(|e| RouteFlowError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RouteFlowError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// Fails fast on a roster/config mismatch.
    pub fn validate(&self) -> Result<()> {
        let roster = self.roster()?;
        if self.agents.get(SUPERVISOR).is_none() {
            return Err(RouteFlowError::Config(
                "missing `supervisor` agent settings".to_string(),
            ));
        }
        if !roster.names().iter().any(|name| *name == self.final_node) {
            return Err(RouteFlowError::Config(format!(
                "final node `{}` is not a configured worker",
                self.final_node
            )));
        }
        if roster.contains(WorkerId::UnstructuredAgent)
            && self.vector_search_tool().is_none()
        {
            return Err(RouteFlowError::Config(
                "`unstructured_agent` requires `tools.vector_search_tool`".to_string(),
            ));
        }
        Ok(())
    }

    pub fn roster(&self) -> Result<WorkerRoster> {
        WorkerRoster::from_names(self.agents.names())
    }

    pub fn agent(&self, name: &str) -> Option<&AgentSettings> {
        self.agents.get(name)
    }

    pub fn system_prompt(&self, name: &str) -> &str {
        self.agents
            .get(name)
            .map(|settings| settings.system_prompt.as_str())
            .unwrap_or_default()
    }

    pub fn vector_search_tool(&self) -> Option<&VectorSearchToolSettings> {
        self.agents
            .get(WorkerId::UnstructuredAgent.as_str())
            .and_then(|settings| settings.tools.as_ref())
            .and_then(|tools| tools.vector_search_tool.as_ref())
    }
}

/// Agent settings keyed by name, in document order.
#[derive(Debug, Clone, Default)]
pub struct OrderedAgents(Vec<(String, AgentSettings)>);

impl OrderedAgents {
    pub fn new(entries: Vec<(String, AgentSettings)>) -> Self {
        Self(entries)
    }

    pub fn get(&self, name: &str) -> Option<&AgentSettings> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, settings)| settings)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }
}

impl Serialize for OrderedAgents {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrderedAgents {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        // serde_json is built with `preserve_order`, so the map keeps document order.
        let map = serde_json::Map::deserialize(deserializer)?;
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let settings: AgentSettings =
                serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            entries.push((key, settings));
        }
        Ok(OrderedAgents(entries))
    }
}
