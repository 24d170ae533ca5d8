use async_trait::async_trait;
use tracing::instrument;

use crate::agent::{Agent, AgentContext, StateUpdate};
use crate::config::WorkerId;
use crate::error::{Result, RouteFlowError};
use crate::message::Message;
use crate::state::ConversationState;

/// Hands the whole conversation to the structured-query service and reports
/// its first and last replies.
pub struct StructuredAgent;

#[async_trait]
impl Agent for StructuredAgent {
    fn name(&self) -> &'static str {
        WorkerId::StructuredAgent.as_str()
    }

    #[instrument(skip_all, fields(history = state.messages().len()))]
    async fn run(&self, state: &ConversationState, ctx: &AgentContext<'_>) -> Result<StateUpdate> {
        let tool = ctx.runtime.structured.as_ref().ok_or_else(|| {
            RouteFlowError::Config("structured_agent has no structured-query service".to_string())
        })?;
        let (first, last) = tool.query_history(state.messages()).await?;
        let id = WorkerId::StructuredAgent;
        Ok(StateUpdate::message(Message::assistant_named(
            id.as_str(),
            Message::labeled(id.label(), &format!("{first} \n\n {last}")),
        )))
    }
}
