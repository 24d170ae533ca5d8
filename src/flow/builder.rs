use std::collections::HashMap;

use crate::error::{Result, RouteFlowError};
use crate::flow::conditions::TransitionCondition;
use crate::flow::nodes::FlowNode;
use crate::flow::types::{Flow, FlowTransition};

/// Flow 构建器
pub struct FlowBuilder {
    name: String,
    start: Option<String>,
    nodes: HashMap<String, FlowNode>,
    transitions: HashMap<String, Vec<FlowTransition>>,
    limit_node: Option<String>,
}

impl FlowBuilder {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            start: None,
            nodes: HashMap::new(),
            transitions: HashMap::new(),
            limit_node: None,
        }
    }

    /// Worker node: counted and guarded by the iteration ceiling.
    pub fn add_agent_node(&mut self, name: &str, agent_name: &str) -> &mut Self {
        self.nodes
            .insert(name.to_string(), FlowNode::agent(name, agent_name));
        self
    }

    /// Tool-execution node. Counted like a worker so a worker/tool loop that
    /// never returns to the router still reaches the ceiling, but never
    /// diverted: requested calls always get their results.
    pub fn add_tool_node(&mut self, name: &str, agent_name: &str) -> &mut Self {
        let mut node = FlowNode::agent(name, agent_name);
        node.guarded = false;
        self.nodes.insert(name.to_string(), node);
        self
    }

    /// Router node: counted, but checks the ceiling itself.
    pub fn add_router_node(&mut self, name: &str, agent_name: &str) -> &mut Self {
        let mut node = FlowNode::agent(name, agent_name);
        node.guarded = false;
        self.nodes.insert(name.to_string(), node);
        self
    }

    /// Where guarded activations go once the ceiling trips. Not counted.
    pub fn add_limit_node(&mut self, name: &str, agent_name: &str) -> &mut Self {
        let mut node = FlowNode::agent(name, agent_name);
        node.counts_iteration = false;
        node.guarded = false;
        self.nodes.insert(name.to_string(), node);
        self.limit_node = Some(name.to_string());
        self
    }

    pub fn add_terminal_node(&mut self, name: &str) -> &mut Self {
        self.nodes
            .insert(name.to_string(), FlowNode::terminal(name));
        self
    }

    pub fn set_start(&mut self, name: &str) -> &mut Self {
        self.start = Some(name.to_string());
        self
    }

    pub fn connect(&mut self, from: &str, to: &str) -> &mut Self {
        self.push_transition(from, to, None, None)
    }

    pub fn connect_if(
        &mut self,
        from: &str,
        to: &str,
        condition: TransitionCondition,
    ) -> &mut Self {
        self.push_transition(from, to, Some(condition), None)
    }

    pub fn connect_if_named(
        &mut self,
        from: &str,
        to: &str,
        name: &str,
        condition: TransitionCondition,
    ) -> &mut Self {
        self.push_transition(from, to, Some(condition), Some(name.to_string()))
    }

    fn push_transition(
        &mut self,
        from: &str,
        to: &str,
        condition: Option<TransitionCondition>,
        name: Option<String>,
    ) -> &mut Self {
        self.transitions
            .entry(from.to_string())
            .or_default()
            .push(FlowTransition {
                to: to.to_string(),
                condition,
                name,
            });
        self
    }

    /// Checks that the start node and every edge endpoint exist and that
    /// non-terminal nodes have somewhere to go.
    pub fn build(self) -> Result<Flow> {
        let start = self
            .start
            .ok_or_else(|| RouteFlowError::Config(format!("flow `{}` has no start", self.name)))?;
        if !self.nodes.contains_key(&start) {
            return Err(RouteFlowError::UnknownNode(start));
        }
        for (from, transitions) in &self.transitions {
            if !self.nodes.contains_key(from) {
                return Err(RouteFlowError::UnknownNode(from.clone()));
            }
            if let Some(missing) = transitions.iter().find(|t| !self.nodes.contains_key(&t.to)) {
                return Err(RouteFlowError::UnknownNode(missing.to.clone()));
            }
        }
        for node in self.nodes.values() {
            if !node.is_terminal() && !self.transitions.contains_key(&node.name) {
                return Err(RouteFlowError::NoTransition {
                    from: node.name.clone(),
                });
            }
        }
        Ok(Flow {
            name: self.name,
            start,
            nodes: self.nodes,
            transitions: self.transitions,
            limit_node: self.limit_node,
        })
    }
}
