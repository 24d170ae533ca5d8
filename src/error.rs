use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouteFlowError>;

#[derive(Debug, Error)]
pub enum RouteFlowError {
    #[error("unknown node `{0}` in flow")]
    UnknownNode(String),
    #[error("agent `{0}` not registered")]
    AgentNotRegistered(String),
    #[error("tool `{0}` not registered")]
    ToolNotRegistered(String),
    #[error("unknown worker `{0}`")]
    UnknownWorker(String),
    #[error("no transition from `{from}` matches the current state")]
    NoTransition { from: String },
    #[error("maximum iterations {0} exceeded")]
    MaxIterationsExceeded(u32),
    #[error("classifier contract violation: {0}")]
    ClassifierContract(String),
    #[error("tool result mismatch: {0}")]
    ToolResultMismatch(String),
    #[error("invalid arguments for tool `{tool}`: {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("model error: {0}")]
    Model(String),
    #[error("service error: {0}")]
    Service(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for RouteFlowError {
    fn from(err: serde_json::Error) -> Self {
        RouteFlowError::Serialization(err.to_string())
    }
}
