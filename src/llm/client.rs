use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::types::{ChatChunk, ChatRequest, ChatStream, StructuredSchema};
use crate::error::{Result, RouteFlowError};
use crate::message::Message;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One assistant turn, possibly carrying tool calls.
    async fn invoke(&self, request: ChatRequest) -> Result<Message>;

    /// Default streaming replays `invoke` one character at a time, then a
    /// closing chunk holding any tool calls and the finish reason.
    fn stream(&self, request: ChatRequest) -> ChatStream {
        let model = self.clone_dyn();
        let request = Arc::new(request);

        Box::pin(futures::stream::unfold(
            StreamCursor::Pending(request, model),
            |cursor| async move {
                match cursor {
                    StreamCursor::Pending(request, model) => {
                        match model.invoke((*request).clone()).await {
                            Ok(message) => next_chunk(message, 0),
                            Err(e) => Some((Err(e), StreamCursor::Done)),
                        }
                    }
                    StreamCursor::Replaying(message, pos) => next_chunk(message, pos),
                    StreamCursor::Done => None,
                }
            },
        ))
    }

    /// Asks for a JSON value matching `schema`. The default parses the text of
    /// a plain `invoke`; output that is not JSON breaks the classifier contract.
    async fn invoke_structured(
        &self,
        request: ChatRequest,
        schema: &StructuredSchema,
    ) -> Result<Value> {
        let message = self.invoke(request).await?;
        serde_json::from_str(message.content().trim()).map_err(|e| {
            RouteFlowError::ClassifierContract(format!(
                "`{}` output is not valid JSON: {}",
                schema.name, e
            ))
        })
    }

    fn clone_dyn(&self) -> DynChatModel;
}

pub type DynChatModel = Arc<dyn ChatModel>;

enum StreamCursor {
    Pending(Arc<ChatRequest>, DynChatModel),
    Replaying(Message, usize),
    Done,
}

fn next_chunk(message: Message, pos: usize) -> Option<(Result<ChatChunk>, StreamCursor)> {
    let content = message.content();
    if let Some(ch) = content.get(pos..).and_then(|rest| rest.chars().next()) {
        let chunk = ChatChunk::text(message.id(), ch.to_string());
        let pos = pos + ch.len_utf8();
        return Some((Ok(chunk), StreamCursor::Replaying(message, pos)));
    }

    let finish_reason = if message.has_tool_calls() {
        "tool_calls"
    } else {
        "stop"
    };
    let chunk = ChatChunk {
        message_id: message.id().to_string(),
        tool_calls: message.tool_calls().to_vec(),
        finish_reason: Some(finish_reason.to_string()),
        ..ChatChunk::default()
    };
    Some((Ok(chunk), StreamCursor::Done))
}
