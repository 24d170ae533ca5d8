use crate::agent::builtin::ITERATION_LIMIT;
use crate::config::{WorkerId, WorkerRoster, SUPERVISOR};
use crate::error::Result;
use crate::state::RoutingDecision;

use super::builder::FlowBuilder;
use super::conditions::{condition_has_tool_calls, condition_next_is, condition_no_tool_calls};
use super::types::Flow;

pub const ROUTING_FLOW: &str = "routing";
pub const END: &str = "__end__";
pub const UNSTRUCTURED_TOOLS: &str = "unstructured_agent_tools";

/// Supervisor-centred graph over the configured roster:
///
/// ```text
/// supervisor -> <worker> | iteration_limit
/// structured_agent -> supervisor
/// unstructured_agent -> unstructured_agent_tools (tool calls) | supervisor
/// unstructured_agent_tools -> unstructured_agent
/// response_agent, iteration_limit -> __end__
/// ```
pub fn build_routing_flow(roster: &WorkerRoster) -> Result<Flow> {
    let mut builder = FlowBuilder::new(ROUTING_FLOW);
    builder
        .add_router_node(SUPERVISOR, SUPERVISOR)
        .add_limit_node(ITERATION_LIMIT, ITERATION_LIMIT)
        .add_terminal_node(END)
        .set_start(SUPERVISOR);

    for worker in roster.iter() {
        let name = worker.as_str();
        builder.add_agent_node(name, name).connect_if_named(
            SUPERVISOR,
            name,
            name,
            condition_next_is(RoutingDecision::Worker(worker)),
        );

        match worker {
            WorkerId::StructuredAgent => {
                builder.connect(name, SUPERVISOR);
            }
            WorkerId::UnstructuredAgent => {
                builder
                    .add_tool_node(UNSTRUCTURED_TOOLS, UNSTRUCTURED_TOOLS)
                    .connect_if_named(
                        name,
                        UNSTRUCTURED_TOOLS,
                        "continue",
                        condition_has_tool_calls(),
                    )
                    .connect_if_named(name, SUPERVISOR, "done", condition_no_tool_calls())
                    .connect(UNSTRUCTURED_TOOLS, name);
            }
            WorkerId::ResponseAgent => {
                builder.connect(name, END);
            }
        }
    }

    builder
        .connect_if_named(
            SUPERVISOR,
            ITERATION_LIMIT,
            "RECURSION_LIMIT",
            condition_next_is(RoutingDecision::RecursionLimit),
        )
        .connect(ITERATION_LIMIT, END);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowNodeKind;

    #[test]
    fn routing_flow_has_expected_nodes() {
        let roster = WorkerRoster::from_names([
            "supervisor",
            "structured_agent",
            "unstructured_agent",
            "response_agent",
        ])
        .unwrap();
        let flow = build_routing_flow(&roster).unwrap();
        assert_eq!(flow.start, SUPERVISOR);
        assert_eq!(flow.limit_node.as_deref(), Some(ITERATION_LIMIT));
        assert_eq!(flow.transitions(SUPERVISOR).len(), 4);
        assert!(flow.node(UNSTRUCTURED_TOOLS).unwrap().counts_iteration);
        assert!(!flow.node(UNSTRUCTURED_TOOLS).unwrap().guarded);
        assert!(!flow.node(SUPERVISOR).unwrap().guarded);
        assert!(!flow.node(ITERATION_LIMIT).unwrap().counts_iteration);
        assert_eq!(flow.node(END).unwrap().kind, FlowNodeKind::Terminal);
    }

    #[test]
    fn tool_node_only_exists_with_unstructured_worker() {
        let roster = WorkerRoster::from_names(["structured_agent", "response_agent"]).unwrap();
        let flow = build_routing_flow(&roster).unwrap();
        assert!(flow.node(UNSTRUCTURED_TOOLS).is_none());
    }
}
