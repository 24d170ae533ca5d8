/// Flow 节点类型定义

/// Flow 节点
#[derive(Clone, Debug)]
pub struct FlowNode {
    pub name: String,
    pub kind: FlowNodeKind,
    /// Each activation adds one to the state's iteration counter.
    pub counts_iteration: bool,
    /// Diverted to the limit node once the counter is past the maximum.
    pub guarded: bool,
}

/// Flow 节点类型
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowNodeKind {
    Agent(String),
    Terminal,
}

impl FlowNode {
    pub fn agent(name: &str, agent_name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FlowNodeKind::Agent(agent_name.to_string()),
            counts_iteration: true,
            guarded: true,
        }
    }

    pub fn terminal(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FlowNodeKind::Terminal,
            counts_iteration: false,
            guarded: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == FlowNodeKind::Terminal
    }
}
