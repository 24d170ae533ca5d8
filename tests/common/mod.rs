#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use agentroute::config::SearchParameters;
use agentroute::llm::ChatModel;
use agentroute::tools::{StructuredQueryService, VectorSearchResponse, VectorSearchService};
use agentroute::{AgentConfig, Message, RuntimeContext, ScriptedChatModel};

pub const SEARCH_TOOL: &str = "search_documents";

pub fn config_value(max_iterations: u32) -> Value {
    json!({
        "agents_max_iterations": max_iterations,
        "agents": {
            "supervisor": {"system_prompt": "Route the conversation."},
            "structured_agent": {"system_prompt": ""},
            "unstructured_agent": {
                "system_prompt": "Search the documents.",
                "tools": {
                    "vector_search_tool": {
                        "tool_name": SEARCH_TOOL,
                        "tool_description": "Searches policy documents."
                    }
                }
            },
            "response_agent": {"system_prompt": "Answer the user."}
        }
    })
}

pub fn config(max_iterations: u32) -> AgentConfig {
    AgentConfig::from_json(&config_value(max_iterations).to_string())
        .expect("test config is valid")
}

/// Structured-query fake answering with a restated query and a result.
pub struct FakeWarehouse {
    pub seen: Mutex<Vec<usize>>,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StructuredQueryService for FakeWarehouse {
    async fn invoke(&self, messages: &[Message]) -> agentroute::Result<Vec<Message>> {
        self.seen.lock().push(messages.len());
        Ok(vec![
            Message::assistant("SELECT sum(revenue) FROM sales WHERE quarter = 'Q1'"),
            Message::assistant("Q1 revenue: 4.2M"),
        ])
    }
}

/// Index fake with one useful row and one blank row.
pub struct FakeIndex {
    pub queries: Mutex<Vec<String>>,
}

impl FakeIndex {
    pub fn new() -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorSearchService for FakeIndex {
    async fn similarity_search(
        &self,
        query: &str,
        _params: &SearchParameters,
    ) -> agentroute::Result<VectorSearchResponse> {
        self.queries.lock().push(query.to_string());
        Ok(VectorSearchResponse::from_rows(
            &["id", "doc_uri", "content", "metadata", "score"],
            vec![
                vec![
                    json!("doc-1"),
                    json!("policies/returns.pdf"),
                    json!("Returns are accepted within 30 days."),
                    json!("{}"),
                    json!(0.87),
                ],
                vec![
                    json!("doc-2"),
                    json!("policies/blank.pdf"),
                    json!(""),
                    json!("{}"),
                    json!(0.42),
                ],
            ],
        ))
    }
}

pub fn context(model: &ScriptedChatModel, max_iterations: u32) -> RuntimeContext {
    RuntimeContext::new(config(max_iterations), model.clone_dyn())
        .expect("context builds")
        .with_structured_query(Arc::new(FakeWarehouse::new()))
        .with_vector_search(Arc::new(FakeIndex::new()))
        .expect("vector search binds")
}

pub fn route(next: &str) -> Value {
    json!({"observation": "user asked a question", "action": "route", "next": next})
}
