// 响应协议适配模块

pub mod agent;
pub mod convert;
pub mod types;

pub use agent::{translate_event, ResponseStream, ResponsesAgent};
pub use convert::{message_to_items, request_to_messages};
pub use types::{
    ContentPart, OutputItem, ResponseAccumulator, ResponseEvent, ResponsesRequest,
    ResponsesResponse,
};
