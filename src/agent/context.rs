use std::sync::Arc;

use crate::config::{AgentConfig, WorkerRoster};
use crate::error::{Result, RouteFlowError};
use crate::llm::{ChatChunk, DynChatModel};
use crate::runtime::{EventSink, FlowEvent};
use crate::tools::{
    StructuredQueryService, StructuredQueryTool, Tool, ToolRegistry, VectorSearchService,
    VectorSearchTool,
};

/// Shared, read-only handles for every execution. Cloning is cheap.
#[derive(Clone)]
pub struct RuntimeContext {
    pub config: Arc<AgentConfig>,
    pub roster: WorkerRoster,
    pub model: DynChatModel,
    pub tools: Arc<ToolRegistry>,
    pub structured: Option<Arc<StructuredQueryTool>>,
}

impl RuntimeContext {
    pub fn new(config: AgentConfig, model: DynChatModel) -> Result<Self> {
        config.validate()?;
        let roster = config.roster()?;
        Ok(Self {
            config: Arc::new(config),
            roster,
            model,
            tools: Arc::new(ToolRegistry::new()),
            structured: None,
        })
    }

    /// Binds a tool for the unstructured worker.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self> {
        Arc::make_mut(&mut self.tools).register(tool)?;
        Ok(self)
    }

    /// Builds the vector-search tool from `agents.unstructured_agent.tools`.
    pub fn with_vector_search(self, service: Arc<dyn VectorSearchService>) -> Result<Self> {
        let settings = self.config.vector_search_tool().cloned().ok_or_else(|| {
            RouteFlowError::Config("no `vector_search_tool` configured".to_string())
        })?;
        let tool = VectorSearchTool::new(
            &settings,
            self.config.vector_search_parameters.clone(),
            service,
        );
        self.with_tool(Arc::new(tool))
    }

    pub fn with_structured_query(mut self, service: Arc<dyn StructuredQueryService>) -> Self {
        let description = self
            .config
            .agent(crate::config::WorkerId::StructuredAgent.as_str())
            .and_then(|settings| settings.description.clone());
        self.structured = Some(Arc::new(StructuredQueryTool::new(
            service,
            description.as_deref(),
        )));
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.config.agents_max_iterations
    }

    pub fn final_node(&self) -> &str {
        &self.config.final_node
    }
}

/// Per-activation view handed to an agent.
#[derive(Clone, Copy)]
pub struct AgentContext<'a> {
    pub node: &'a str,
    pub runtime: &'a RuntimeContext,
    events: Option<&'a EventSink>,
    max_iterations: u32,
}

impl<'a> AgentContext<'a> {
    pub fn new(node: &'a str, runtime: &'a RuntimeContext, events: Option<&'a EventSink>) -> Self {
        Self {
            node,
            runtime,
            events,
            max_iterations: runtime.max_iterations(),
        }
    }

    /// Overrides the configured ceiling for this activation.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Ceiling in force for the running flow.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Publishes a token chunk tagged with this node. A closed receiver only
    /// means nobody is listening anymore.
    pub fn emit_chunk(&self, chunk: &ChatChunk) {
        if let Some(events) = self.events {
            let _ = events.send(Ok(FlowEvent::Messages {
                node: self.node.to_string(),
                chunk: chunk.clone(),
            }));
        }
    }
}
