// 会话状态模块

mod conversation;

pub use conversation::{ConversationState, RoutingDecision, RECURSION_LIMIT};
