// 内置节点

mod limit;
mod response;
mod structured;
mod supervisor;
mod unstructured;

pub use limit::{IterationLimitAgent, ITERATION_LIMIT, MAX_ITERATION_MESSAGE};
pub use response::ResponseAgent;
pub use structured::StructuredAgent;
pub use supervisor::{parse_router_output, router_schema, SupervisorAgent};
pub use unstructured::UnstructuredAgent;
