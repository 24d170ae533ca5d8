use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::agent::{Agent, AgentContext, StateUpdate};
use crate::config::{WorkerRoster, SUPERVISOR};
use crate::error::{Result, RouteFlowError};
use crate::llm::{ChatRequest, StructuredSchema};
use crate::state::{ConversationState, RoutingDecision};

/// Router output schema. `next` is an enum over the roster so a conforming
/// model cannot name anything else.
pub fn router_schema(roster: &WorkerRoster) -> StructuredSchema {
    StructuredSchema::new(
        "Router",
        json!({
            "type": "object",
            "description": "Agent to route to next. If no agents needed, route to response_agent.",
            "properties": {
                "observation": {"type": "string"},
                "action": {"type": "string"},
                "next": {
                    "type": "string",
                    "enum": roster.names(),
                    "description": "worker to route to next",
                },
            },
            "required": ["observation", "action", "next"],
            "additionalProperties": false,
        }),
    )
}

/// Reads `next` from the router output. Anything other than a roster member
/// is a contract violation, never a fallback.
pub fn parse_router_output(value: &Value, roster: &WorkerRoster) -> Result<RoutingDecision> {
    let next = value
        .get("next")
        .ok_or_else(|| RouteFlowError::ClassifierContract("router output has no `next`".into()))?;
    let name = next.as_str().ok_or_else(|| {
        RouteFlowError::ClassifierContract(format!("`next` must be a string, got `{next}`"))
    })?;
    roster.resolve(name).map(RoutingDecision::Worker)
}

pub struct SupervisorAgent;

#[async_trait]
impl Agent for SupervisorAgent {
    fn name(&self) -> &'static str {
        SUPERVISOR
    }

    #[instrument(skip_all, fields(iterations = state.iterations()))]
    async fn run(&self, state: &ConversationState, ctx: &AgentContext<'_>) -> Result<StateUpdate> {
        let runtime = ctx.runtime;
        let max = ctx.max_iterations();
        if state.iterations() > max {
            info!(max, "iteration limit reached, routing to limit node");
            return Ok(StateUpdate::route(RoutingDecision::RecursionLimit));
        }

        let request = ChatRequest::with_system(
            runtime.config.system_prompt(SUPERVISOR),
            state.messages(),
        )
        .with_parameters(&runtime.config.llm_parameters);
        let output = runtime
            .model
            .invoke_structured(request, &router_schema(&runtime.roster))
            .await?;
        let decision = parse_router_output(&output, &runtime.roster)?;

        debug!(
            observation = output["observation"].as_str().unwrap_or_default(),
            action = output["action"].as_str().unwrap_or_default(),
            next = %decision,
            "supervisor routed"
        );
        Ok(StateUpdate::route(decision))
    }
}
