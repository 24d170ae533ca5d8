// LLM 客户端模块

pub mod client;
pub mod http;
pub mod scripted;
pub mod types;

pub use client::{ChatModel, DynChatModel};
#[cfg(feature = "http-client")]
pub use http::OpenAiCompatClient;
pub use http::SseParser;
pub use scripted::ScriptedChatModel;
pub use types::{
    collect_stream, ChatChunk, ChatRequest, ChatStream, ChunkAccumulator, StructuredSchema,
    ToolCallChunk,
};
