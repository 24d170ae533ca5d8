use std::collections::HashMap;
use std::fmt;

use crate::flow::conditions::TransitionCondition;
use crate::flow::nodes::FlowNode;

/// Flow 工作流
#[derive(Clone)]
pub struct Flow {
    pub name: String,
    pub start: String,
    pub nodes: HashMap<String, FlowNode>,
    pub transitions: HashMap<String, Vec<FlowTransition>>,
    /// Node that receives guarded activations once the ceiling trips.
    pub limit_node: Option<String>,
}

impl Flow {
    pub fn node(&self, name: &str) -> Option<&FlowNode> {
        self.nodes.get(name)
    }

    /// Outgoing edges in declaration order; the first match wins.
    pub fn transitions(&self, name: &str) -> &[FlowTransition] {
        self.transitions
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("start", &self.start)
            .field("nodes", &self.nodes.len())
            .field("limit_node", &self.limit_node)
            .finish()
    }
}

/// Flow 转换
#[derive(Clone)]
pub struct FlowTransition {
    pub to: String,
    pub condition: Option<TransitionCondition>,
    pub name: Option<String>,
}

impl fmt::Debug for FlowTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowTransition")
            .field("to", &self.to)
            .field("name", &self.name)
            .field("has_condition", &self.condition.is_some())
            .finish()
    }
}
