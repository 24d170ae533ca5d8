// 工具模块

pub mod executor;
#[cfg(feature = "http-client")]
pub mod http;
pub mod manifest;
pub mod registry;
#[cfg(feature = "http-client")]
pub mod remote;
pub mod structured;
pub mod tool;
pub mod vector_search;

pub use executor::{execute_call, ToolNode};
#[cfg(feature = "http-client")]
pub use http::{HttpStructuredQueryService, HttpVectorSearchService};
pub use manifest::{FieldType, ToolField, ToolSpec, ToolSpecBuilder};
pub use registry::ToolRegistry;
#[cfg(feature = "http-client")]
pub use remote::{discover_remote_tools, load_remote_tools, JsonRpcClient, RemoteTool};
pub use structured::{StructuredQueryService, StructuredQueryTool, STRUCTURED_QUERY_TOOL};
pub use tool::{Tool, ToolInvocation};
pub use vector_search::{
    format_facts, parse_search_results, SearchHit, VectorSearchResponse, VectorSearchService,
    VectorSearchTool,
};
