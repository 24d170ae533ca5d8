use async_trait::async_trait;

use crate::agent::{Agent, AgentContext, StateUpdate};
use crate::error::Result;
use crate::message::Message;
use crate::state::ConversationState;

pub const ITERATION_LIMIT: &str = "iteration_limit";

pub const MAX_ITERATION_MESSAGE: &str = "<name>Response Agent</name> Agent stopped due to max iterations. Please try again with more specific query!";

/// Terminal node reached when the iteration ceiling trips.
pub struct IterationLimitAgent;

#[async_trait]
impl Agent for IterationLimitAgent {
    fn name(&self) -> &'static str {
        ITERATION_LIMIT
    }

    async fn run(
        &self,
        _state: &ConversationState,
        _ctx: &AgentContext<'_>,
    ) -> Result<StateUpdate> {
        Ok(StateUpdate::message(Message::assistant_named(
            "unknown",
            MAX_ITERATION_MESSAGE,
        )))
    }
}
