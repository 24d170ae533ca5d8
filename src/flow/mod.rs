// Flow 模块 - 工作流定义

pub mod builder;
pub mod conditions;
pub mod nodes;
pub mod types;
pub mod workflow;

// 重新导出核心类型
pub use builder::FlowBuilder;
pub use conditions::{
    condition_always, condition_from_fn, condition_has_tool_calls, condition_next_is,
    condition_no_tool_calls, ConditionFuture, TransitionCondition,
};
pub use nodes::{FlowNode, FlowNodeKind};
pub use types::{Flow, FlowTransition};
pub use workflow::{build_routing_flow, END, ROUTING_FLOW, UNSTRUCTURED_TOOLS};
