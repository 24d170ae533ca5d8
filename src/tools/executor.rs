use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::agent::{Agent, AgentContext, StateUpdate};
use crate::error::{Result, RouteFlowError};
use crate::message::{Message, ToolCall};
use crate::state::ConversationState;

use super::registry::ToolRegistry;
use super::tool::ToolInvocation;

/// Executes the tool calls of the last assistant message against the
/// runtime's tool registry.
pub struct ToolNode {
    name: &'static str,
}

impl ToolNode {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

/// Runs one call. Every failure is folded into the returned text so the model
/// can see what went wrong and sibling calls still run.
pub async fn execute_call(tools: &ToolRegistry, call: &ToolCall) -> String {
    match try_execute(tools, call).await {
        Ok(output) => output,
        Err(err) => {
            warn!(tool = %call.name, call_id = %call.id, error = %err, "tool call failed");
            format!("Error: {}", err)
        }
    }
}

async fn try_execute(tools: &ToolRegistry, call: &ToolCall) -> Result<String> {
    let tool = tools
        .get(&call.name)
        .ok_or_else(|| RouteFlowError::ToolNotRegistered(call.name.clone()))?;
    let input = call.parse_arguments()?;
    tool.spec().validate(&input)?;
    tool.invoke(ToolInvocation::new(call.name.clone(), input).with_call_id(call.id.clone()))
        .await
}

#[async_trait]
impl Agent for ToolNode {
    fn name(&self) -> &'static str {
        self.name
    }

    #[instrument(skip_all, fields(node = self.name))]
    async fn run(&self, state: &ConversationState, ctx: &AgentContext<'_>) -> Result<StateUpdate> {
        let calls = state
            .last_message()
            .map(|message| message.tool_calls())
            .unwrap_or_default();

        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            if !seen.insert(call.id.as_str()) {
                warn!(call_id = %call.id, "duplicate tool call id discarded");
                continue;
            }
            let output = execute_call(&ctx.runtime.tools, call).await;
            results.push(Message::tool_named(call.id.clone(), call.name.clone(), output));
        }
        debug!(results = results.len(), "tool calls executed");
        Ok(StateUpdate::messages(results))
    }
}
