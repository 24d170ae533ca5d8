//! HTTP 客户端实现模块
//!
//! - `OpenAiCompatClient`: chat-completions client with tools, SSE streaming
//!   and `json_schema` structured output
//! - `SseParser`: SSE 流式响应解析器

#[cfg(feature = "http-client")]
pub mod openai;
pub mod stream;

#[cfg(feature = "http-client")]
pub use openai::OpenAiCompatClient;
pub use stream::SseParser;
