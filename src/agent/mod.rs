pub mod agent;
pub mod builtin;
pub mod context;
pub mod registry;

pub use agent::{Agent, StateUpdate};
pub use context::{AgentContext, RuntimeContext};
pub use registry::{register_agent, routing_agents, AgentRegistry};
