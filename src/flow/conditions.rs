use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::state::{ConversationState, RoutingDecision};

/// Flow 条件类型定义

/// 条件 Future 类型
pub type ConditionFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// 转换条件类型
pub type TransitionCondition =
    Arc<dyn Fn(&ConversationState) -> ConditionFuture<'_> + Send + Sync>;

/// 从函数创建转换条件
pub fn condition_from_fn<F>(func: F) -> TransitionCondition
where
    F: Fn(&ConversationState) -> bool + Send + Sync + 'static,
{
    let func = Arc::new(func);
    Arc::new(move |state| {
        let func = Arc::clone(&func);
        Box::pin(async move { func(state) })
    })
}

/// 总是为真的条件
pub fn condition_always() -> TransitionCondition {
    Arc::new(|_| Box::pin(async move { true }))
}

/// The last routing decision equals `decision`.
pub fn condition_next_is(decision: RoutingDecision) -> TransitionCondition {
    condition_from_fn(move |state| state.next() == Some(decision))
}

/// The last message requests at least one tool call.
pub fn condition_has_tool_calls() -> TransitionCondition {
    condition_from_fn(|state| {
        state
            .last_message()
            .map(|message| message.has_tool_calls())
            .unwrap_or(false)
    })
}

pub fn condition_no_tool_calls() -> TransitionCondition {
    condition_from_fn(|state| {
        !state
            .last_message()
            .map(|message| message.has_tool_calls())
            .unwrap_or(false)
    })
}
