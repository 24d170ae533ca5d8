// 运行时执行引擎模块

mod executor;
mod types;

pub use executor::{FlowExecutor, FlowStream};
pub use types::{EventSink, FlowEvent, FlowExecution};
