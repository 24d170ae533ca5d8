use std::collections::HashMap;
use std::sync::Arc;

use super::agent::Agent;
use super::builtin::{
    IterationLimitAgent, ResponseAgent, StructuredAgent, SupervisorAgent, UnstructuredAgent,
    ITERATION_LIMIT,
};
use crate::config::{WorkerId, WorkerRoster, SUPERVISOR};
use crate::flow::UNSTRUCTURED_TOOLS;
use crate::tools::ToolNode;

pub type AgentRegistry = HashMap<String, Arc<dyn Agent>>;

pub fn register_agent(name: &str, agent: Arc<dyn Agent>, registry: &mut AgentRegistry) {
    registry.insert(name.to_string(), agent);
}

/// Registers the supervisor, the limit node and every rostered worker under
/// its node name.
pub fn routing_agents(roster: &WorkerRoster) -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    register_agent(SUPERVISOR, Arc::new(SupervisorAgent), &mut registry);
    register_agent(ITERATION_LIMIT, Arc::new(IterationLimitAgent), &mut registry);

    for worker in roster.iter() {
        match worker {
            WorkerId::StructuredAgent => {
                register_agent(worker.as_str(), Arc::new(StructuredAgent), &mut registry)
            }
            WorkerId::UnstructuredAgent => {
                register_agent(worker.as_str(), Arc::new(UnstructuredAgent), &mut registry);
                register_agent(
                    UNSTRUCTURED_TOOLS,
                    Arc::new(ToolNode::new(UNSTRUCTURED_TOOLS)),
                    &mut registry,
                );
            }
            WorkerId::ResponseAgent => {
                register_agent(worker.as_str(), Arc::new(ResponseAgent), &mut registry)
            }
        }
    }
    registry
}
