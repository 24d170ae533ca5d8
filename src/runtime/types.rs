use tokio::sync::mpsc;

use crate::error::Result;
use crate::llm::ChatChunk;
use crate::message::Message;
use crate::state::ConversationState;

/// 运行时类型定义

/// Flow 执行事件
#[derive(Clone, Debug)]
pub enum FlowEvent {
    /// Messages a node added to the state, published after the node returns.
    Updates { node: String, messages: Vec<Message> },
    /// A token chunk produced while a node was still running.
    Messages { node: String, chunk: ChatChunk },
}

impl FlowEvent {
    pub fn node(&self) -> &str {
        match self {
            FlowEvent::Updates { node, .. } | FlowEvent::Messages { node, .. } => node,
        }
    }
}

/// Receives engine events. A failed execution ends with one `Err`.
pub type EventSink = mpsc::UnboundedSender<Result<FlowEvent>>;

/// Flow 执行结果
#[derive(Clone, Debug)]
pub struct FlowExecution {
    pub flow_name: String,
    pub last_node: String,
    pub state: ConversationState,
}

impl FlowExecution {
    /// Last message the execution produced, usually the final answer.
    pub fn final_message(&self) -> Option<&Message> {
        self.state.last_message()
    }
}
