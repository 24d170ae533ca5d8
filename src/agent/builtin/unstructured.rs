use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::agent::{Agent, AgentContext, StateUpdate};
use crate::config::WorkerId;
use crate::error::Result;
use crate::llm::ChatRequest;
use crate::message::Message;
use crate::state::ConversationState;

/// Retrieval worker: the chat model with the bound tools decides whether to
/// search again or to hand back to the supervisor.
pub struct UnstructuredAgent;

#[async_trait]
impl Agent for UnstructuredAgent {
    fn name(&self) -> &'static str {
        WorkerId::UnstructuredAgent.as_str()
    }

    #[instrument(skip_all, fields(history = state.messages().len()))]
    async fn run(&self, state: &ConversationState, ctx: &AgentContext<'_>) -> Result<StateUpdate> {
        let runtime = ctx.runtime;
        let request = ChatRequest::with_system(
            runtime.config.system_prompt(self.name()),
            state.messages(),
        )
        .with_tools(runtime.tools.specs())
        .with_parameters(&runtime.config.llm_parameters);

        let mut reply = runtime.model.invoke(request).await?;
        if let Message::Assistant { content, .. } = &mut reply {
            if !content.is_empty() {
                let labeled =
                    Message::labeled(WorkerId::UnstructuredAgent.label(), content.as_str());
                *content = labeled;
            }
        }
        debug!(tool_calls = reply.tool_calls().len(), "unstructured agent replied");
        Ok(StateUpdate::message(reply))
    }
}
