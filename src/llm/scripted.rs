use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::client::{ChatModel, DynChatModel};
use super::types::{ChatRequest, StructuredSchema};
use crate::error::{Result, RouteFlowError};
use crate::message::{uuid, Message, ToolCall};

#[derive(Default)]
struct Script {
    replies: VecDeque<Message>,
    structured: VecDeque<Value>,
    repeat_reply: Option<Message>,
    repeat_structured: Option<Value>,
    requests: Vec<ChatRequest>,
    replayed: usize,
}

/// Chat model that answers from a queue of canned replies. Used by tests and
/// local dry runs; every request is recorded for inspection.
#[derive(Clone, Default)]
pub struct ScriptedChatModel {
    script: Arc<Mutex<Script>>,
}

impl ScriptedChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, message: Message) -> &Self {
        self.script.lock().replies.push_back(message);
        self
    }

    pub fn push_structured(&self, value: Value) -> &Self {
        self.script.lock().structured.push_back(value);
        self
    }

    /// Reply used once the queue is empty. Ids are refreshed on every use so
    /// repeated tool calls stay distinct.
    pub fn repeat_reply(&self, message: Message) -> &Self {
        self.script.lock().repeat_reply = Some(message);
        self
    }

    pub fn repeat_structured(&self, value: Value) -> &Self {
        self.script.lock().repeat_structured = Some(value);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.script.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.script.lock().requests.len()
    }
}

fn refreshed(message: &Message, round: usize) -> Message {
    match message {
        Message::Assistant {
            content,
            tool_calls,
            name,
            ..
        } => Message::Assistant {
            id: uuid(),
            content: content.clone(),
            tool_calls: tool_calls
                .iter()
                .map(|call| ToolCall {
                    id: format!("{}-{}", call.id, round),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                })
                .collect(),
            name: name.clone(),
        },
        other => other.clone(),
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn invoke(&self, request: ChatRequest) -> Result<Message> {
        let mut script = self.script.lock();
        script.requests.push(request);
        if let Some(reply) = script.replies.pop_front() {
            return Ok(reply);
        }
        match script.repeat_reply.clone() {
            Some(template) => {
                script.replayed += 1;
                Ok(refreshed(&template, script.replayed))
            }
            None => Err(RouteFlowError::Model("scripted replies exhausted".to_string())),
        }
    }

    async fn invoke_structured(
        &self,
        request: ChatRequest,
        schema: &StructuredSchema,
    ) -> Result<Value> {
        let mut script = self.script.lock();
        script.requests.push(request);
        script
            .structured
            .pop_front()
            .or_else(|| script.repeat_structured.clone())
            .ok_or_else(|| {
                RouteFlowError::Model(format!("no scripted output for `{}`", schema.name))
            })
    }

    fn clone_dyn(&self) -> DynChatModel {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::collect_stream;
    use serde_json::json;

    #[tokio::test]
    async fn default_stream_replays_reply() {
        let model = ScriptedChatModel::new();
        model.push_reply(Message::assistant("héllo"));
        let message = collect_stream(model.stream(ChatRequest::default()))
            .await
            .unwrap();
        assert_eq!(message.content(), "héllo");
    }

    #[tokio::test]
    async fn repeated_tool_calls_get_fresh_ids() {
        let model = ScriptedChatModel::new();
        model.repeat_reply(Message::assistant_with_tools(
            "",
            vec![ToolCall::new("c", "lookup", &json!({}))],
        ));
        let first = model.invoke(ChatRequest::default()).await.unwrap();
        let second = model.invoke(ChatRequest::default()).await.unwrap();
        assert_ne!(first.tool_calls()[0].id, second.tool_calls()[0].id);
        assert_eq!(model.request_count(), 2);
    }
}
