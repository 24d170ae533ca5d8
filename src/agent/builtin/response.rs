use async_trait::async_trait;
use futures::StreamExt;
use tracing::instrument;

use crate::agent::{Agent, AgentContext, StateUpdate};
use crate::config::WorkerId;
use crate::error::Result;
use crate::llm::{ChatRequest, ChunkAccumulator};
use crate::message::{uuid, Message};
use crate::state::ConversationState;

/// Final answer writer. Always streams so callers can forward tokens while
/// the answer is produced; no tools are bound.
pub struct ResponseAgent;

#[async_trait]
impl Agent for ResponseAgent {
    fn name(&self) -> &'static str {
        WorkerId::ResponseAgent.as_str()
    }

    #[instrument(skip_all, fields(history = state.messages().len()))]
    async fn run(&self, state: &ConversationState, ctx: &AgentContext<'_>) -> Result<StateUpdate> {
        let runtime = ctx.runtime;
        let request = ChatRequest::with_system(
            runtime.config.system_prompt(self.name()),
            state.messages(),
        )
        .with_parameters(&runtime.config.llm_parameters);

        let mut stream = runtime.model.stream(request);
        let mut accumulator = ChunkAccumulator::new();
        // deltas of one answer must share an item id
        let fallback_id = uuid();
        while let Some(chunk) = stream.next().await {
            let mut chunk = chunk?;
            if chunk.message_id.is_empty() {
                chunk.message_id = fallback_id.clone();
            }
            ctx.emit_chunk(&chunk);
            accumulator.push(&chunk);
        }

        let id = WorkerId::ResponseAgent;
        Ok(StateUpdate::message(Message::assistant_named(
            id.as_str(),
            Message::labeled(id.label(), accumulator.content()),
        )))
    }
}
