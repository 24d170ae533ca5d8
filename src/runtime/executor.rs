use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::agent::{routing_agents, AgentContext, AgentRegistry, RuntimeContext};
use crate::error::{Result, RouteFlowError};
use crate::flow::{build_routing_flow, Flow, FlowNodeKind};
use crate::state::ConversationState;

use super::types::{EventSink, FlowEvent, FlowExecution};

pub type FlowStream = Pin<Box<dyn Stream<Item = Result<FlowEvent>> + Send>>;

/// Flow 执行器
///
/// Runs one node at a time against a single owned state. Iteration
/// accounting and the ceiling live here, not in the nodes.
#[derive(Clone)]
pub struct FlowExecutor {
    flow: Arc<Flow>,
    agents: Arc<AgentRegistry>,
    context: Arc<RuntimeContext>,
    max_iterations: u32,
}

impl FlowExecutor {
    pub fn new(flow: Flow, agents: AgentRegistry, context: RuntimeContext) -> Self {
        let max_iterations = context.max_iterations();
        Self {
            flow: Arc::new(flow),
            agents: Arc::new(agents),
            context: Arc::new(context),
            max_iterations,
        }
    }

    /// The supervisor workflow over the context's roster.
    pub fn routing(context: RuntimeContext) -> Result<Self> {
        let flow = build_routing_flow(&context.roster)?;
        let agents = routing_agents(&context.roster);
        Ok(Self::new(flow, agents, context))
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    pub async fn invoke(&self, state: ConversationState) -> Result<FlowExecution> {
        self.run(state, None).await
    }

    /// Runs the flow on a spawned task. Node updates and token chunks arrive
    /// in order; a failure is the last item. Dropping the stream only stops
    /// delivery.
    pub fn stream(&self, state: ConversationState) -> FlowStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let executor = self.clone();
        tokio::spawn(async move {
            if let Err(err) = executor.run(state, Some(&tx)).await {
                let _ = tx.send(Err(err));
            }
        });
        Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        }))
    }

    #[instrument(skip_all, fields(flow = %self.flow.name))]
    async fn run(
        &self,
        mut state: ConversationState,
        events: Option<&EventSink>,
    ) -> Result<FlowExecution> {
        let mut current = self.flow.start.clone();
        loop {
            let node = self
                .flow
                .node(&current)
                .ok_or_else(|| RouteFlowError::UnknownNode(current.clone()))?;

            let agent_name = match &node.kind {
                FlowNodeKind::Terminal => {
                    debug!(
                        node = %node.name,
                        iterations = state.iterations(),
                        "reached terminal node"
                    );
                    return Ok(FlowExecution {
                        flow_name: self.flow.name.clone(),
                        last_node: node.name.clone(),
                        state,
                    });
                }
                FlowNodeKind::Agent(agent_name) => agent_name,
            };

            if node.guarded && state.iterations() > self.max_iterations {
                match &self.flow.limit_node {
                    Some(limit) => {
                        info!(
                            node = %node.name,
                            iterations = state.iterations(),
                            "iteration ceiling reached"
                        );
                        current = limit.clone();
                        continue;
                    }
                    None => {
                        return Err(RouteFlowError::MaxIterationsExceeded(self.max_iterations))
                    }
                }
            }

            let agent = self
                .agents
                .get(agent_name)
                .ok_or_else(|| RouteFlowError::AgentNotRegistered(agent_name.clone()))?;
            debug!(node = %node.name, iterations = state.iterations(), "running node");

            let ctx = AgentContext::new(&node.name, &self.context, events)
                .with_max_iterations(self.max_iterations);
            let update = agent.run(&state, &ctx).await?;

            if let Some(events) = events {
                let _ = events.send(Ok(FlowEvent::Updates {
                    node: node.name.clone(),
                    messages: update.messages.clone(),
                }));
            }
            state.append(update.messages)?;
            state.set_next(update.next);
            if node.counts_iteration {
                state.record_iteration();
            }

            current = self.next_node(&node.name, &state).await?;
        }
    }

    async fn next_node(&self, from: &str, state: &ConversationState) -> Result<String> {
        for transition in self.flow.transitions(from) {
            let matched = match &transition.condition {
                Some(condition) => condition(state).await,
                None => true,
            };
            if matched {
                debug!(from, to = %transition.to, edge = ?transition.name, "transition");
                return Ok(transition.to.clone());
            }
        }
        warn!(from, "no transition matched");
        Err(RouteFlowError::NoTransition {
            from: from.to_string(),
        })
    }
}
