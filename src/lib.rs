pub mod agent;
pub mod config;
pub mod error;
pub mod flow;
pub mod guard;
pub mod llm;
pub mod message;
pub mod responses;
pub mod runtime;
pub mod state;
pub mod tools;
pub mod utils;

pub use agent::{
    register_agent, routing_agents, Agent, AgentContext, AgentRegistry, RuntimeContext,
    StateUpdate,
};
pub use config::{AgentConfig, EnvConfig, WorkerId, WorkerRoster, SUPERVISOR};
pub use error::{Result, RouteFlowError};
pub use flow::{
    build_routing_flow, condition_always, condition_from_fn, condition_has_tool_calls,
    condition_next_is, condition_no_tool_calls, Flow, FlowBuilder, FlowNode, FlowNodeKind, END,
    ROUTING_FLOW, UNSTRUCTURED_TOOLS,
};
pub use guard::{ContentCategory, SafetyAssessment, SafetyGuard, REFUSAL_MESSAGE};
#[cfg(feature = "http-client")]
pub use llm::OpenAiCompatClient;
pub use llm::{ChatChunk, ChatModel, ChatRequest, DynChatModel, ScriptedChatModel};
pub use message::{Message, ToolCall};
pub use responses::{
    OutputItem, ResponseEvent, ResponsesAgent, ResponsesRequest, ResponsesResponse,
};
pub use runtime::{FlowEvent, FlowExecution, FlowExecutor};
pub use state::{ConversationState, RoutingDecision, RECURSION_LIMIT};
pub use tools::{Tool, ToolInvocation, ToolNode, ToolRegistry, ToolSpec};
pub use utils::logging;
