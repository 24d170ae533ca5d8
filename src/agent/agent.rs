use async_trait::async_trait;

use crate::error::Result;
use crate::message::Message;
use crate::state::{ConversationState, RoutingDecision};

use super::context::AgentContext;

/// What a node hands back to the engine. The engine appends `messages` to the
/// state and stores `next` for the outgoing edge conditions.
#[derive(Clone, Debug, Default)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub next: Option<RoutingDecision>,
}

impl StateUpdate {
    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            next: None,
        }
    }

    pub fn message(message: Message) -> Self {
        Self::messages(vec![message])
    }

    pub fn route(decision: RoutingDecision) -> Self {
        Self {
            messages: Vec::new(),
            next: Some(decision),
        }
    }
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;

    /// Reads the state, never mutates it. Iteration accounting belongs to the
    /// engine.
    async fn run(&self, state: &ConversationState, ctx: &AgentContext<'_>) -> Result<StateUpdate>;
}
