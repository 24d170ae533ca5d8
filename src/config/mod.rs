pub mod agent_config;
pub mod env;
pub mod workers;

pub use agent_config::{
    AgentConfig, AgentSettings, AgentTools, EndpointConfig, Endpoints, GuardSettings,
    LlmParameters, OrderedAgents, SearchParameters, VectorSearchArguments,
    VectorSearchToolSettings,
};
pub use env::EnvConfig;
pub use workers::{WorkerId, WorkerRoster, SUPERVISOR};
