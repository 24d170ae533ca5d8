use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::LlmParameters;
use crate::error::Result;
use crate::message::{Message, ToolCall};
use crate::tools::ToolSpec;

/// 对话请求
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    /// System prompt followed by the conversation history.
    pub fn with_system(system_prompt: &str, history: &[Message]) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(system_prompt));
        messages.extend(history.iter().cloned());
        Self::new(messages)
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_parameters(mut self, params: &LlmParameters) -> Self {
        self.temperature = params.temperature;
        self.max_tokens = params.max_tokens;
        self
    }
}

/// JSON schema a structured-output call must satisfy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructuredSchema {
    pub name: String,
    pub schema: Value,
}

impl StructuredSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// Fragment of a tool call as it arrives over a stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallChunk {
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// 流式输出块
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatChunk {
    pub message_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_call_chunks: Vec<ToolCallChunk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl ChatChunk {
    pub fn text(message_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// True when the chunk carries tool-call fragments or completed calls.
    pub fn has_tool_activity(&self) -> bool {
        !self.tool_call_chunks.is_empty() || !self.tool_calls.is_empty()
    }
}

pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatChunk>> + Send>>;

/// Folds streamed chunks back into one assistant message.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    message_id: Option<String>,
    content: String,
    partial: Vec<ToolCallChunk>,
    complete: Vec<ToolCall>,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &ChatChunk) {
        if self.message_id.is_none() && !chunk.message_id.is_empty() {
            self.message_id = Some(chunk.message_id.clone());
        }
        self.content.push_str(&chunk.content);
        for fragment in &chunk.tool_call_chunks {
            match self.partial.iter_mut().find(|p| p.index == fragment.index) {
                Some(existing) => {
                    if existing.id.is_none() {
                        existing.id = fragment.id.clone();
                    }
                    if existing.name.is_none() {
                        existing.name = fragment.name.clone();
                    }
                    if let Some(arguments) = &fragment.arguments {
                        existing
                            .arguments
                            .get_or_insert_with(String::new)
                            .push_str(arguments);
                    }
                }
                None => self.partial.push(fragment.clone()),
            }
        }
        self.complete.extend(chunk.tool_calls.iter().cloned());
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn finish(mut self) -> Message {
        self.partial.sort_by_key(|p| p.index);
        let mut tool_calls = self.complete;
        for fragment in self.partial {
            let id = fragment
                .id
                .unwrap_or_else(|| format!("call_{}", fragment.index));
            if tool_calls.iter().any(|call| call.id == id) {
                continue;
            }
            tool_calls.push(ToolCall {
                id,
                name: fragment.name.unwrap_or_default(),
                arguments: fragment.arguments.unwrap_or_default(),
            });
        }
        let mut message = Message::assistant_with_tools(self.content, tool_calls);
        if let (Some(id), Message::Assistant { id: slot, .. }) = (self.message_id, &mut message) {
            *slot = id;
        }
        message
    }
}

/// Drains a stream into a single assistant message.
pub async fn collect_stream(mut stream: ChatStream) -> Result<Message> {
    let mut accumulator = ChunkAccumulator::new();
    while let Some(chunk) = stream.next().await {
        accumulator.push(&chunk?);
    }
    Ok(accumulator.finish())
}
