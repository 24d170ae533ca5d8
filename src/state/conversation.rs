use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::WorkerId;
use crate::error::{Result, RouteFlowError};
use crate::message::Message;

pub const RECURSION_LIMIT: &str = "RECURSION_LIMIT";

/// Supervisor output for one activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutingDecision {
    Worker(WorkerId),
    RecursionLimit,
}

impl RoutingDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingDecision::Worker(id) => id.as_str(),
            RoutingDecision::RecursionLimit => RECURSION_LIMIT,
        }
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State owned by one in-flight workflow execution.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
    #[serde(default)]
    iterations: u32,
    #[serde(skip)]
    next: Option<RoutingDecision>,
}

impl ConversationState {
    pub fn new(messages: Vec<Message>) -> Result<Self> {
        let mut state = Self::default();
        state.append(messages)?;
        Ok(state)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn next(&self) -> Option<RoutingDecision> {
        self.next
    }

    pub fn set_next(&mut self, decision: Option<RoutingDecision>) {
        self.next = decision;
    }

    /// Advances the counter by one. There is no way to lower it.
    pub fn record_iteration(&mut self) -> u32 {
        self.iterations = self.iterations.saturating_add(1);
        self.iterations
    }

    /// Appends messages, rejecting tool results that do not answer an earlier
    /// tool call or that answer one a second time.
    pub fn append<I>(&mut self, messages: I) -> Result<()>
    where
        I: IntoIterator<Item = Message>,
    {
        let mut issued: HashSet<String> = HashSet::new();
        let mut answered: HashSet<String> = HashSet::new();
        for message in &self.messages {
            track(message, &mut issued, &mut answered);
        }

        let mut staged = Vec::new();
        for message in messages {
            if let Message::Tool { tool_call_id, .. } = &message {
                if !issued.contains(tool_call_id) {
                    return Err(RouteFlowError::ToolResultMismatch(format!(
                        "tool result `{tool_call_id}` has no matching tool call"
                    )));
                }
                if answered.contains(tool_call_id) {
                    return Err(RouteFlowError::ToolResultMismatch(format!(
                        "tool call `{tool_call_id}` already has a result"
                    )));
                }
            }
            track(&message, &mut issued, &mut answered);
            staged.push(message);
        }
        self.messages.extend(staged);
        Ok(())
    }
}

fn track(message: &Message, issued: &mut HashSet<String>, answered: &mut HashSet<String>) {
    match message {
        Message::Assistant { tool_calls, .. } => {
            for call in tool_calls {
                issued.insert(call.id.clone());
            }
        }
        Message::Tool { tool_call_id, .. } => {
            answered.insert(tool_call_id.clone());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCall;
    use serde_json::json;

    fn call(id: &str) -> ToolCall {
        ToolCall::new(id, "search", &json!({"query": "q"}))
    }

    #[test]
    fn accepts_tool_results_for_issued_calls() {
        let mut state = ConversationState::new(vec![Message::user("hi")]).unwrap();
        state
            .append(vec![
                Message::assistant_with_tools("", vec![call("a"), call("b")]),
                Message::tool("a", "one"),
                Message::tool("b", "two"),
            ])
            .unwrap();
        assert_eq!(state.messages().len(), 4);
    }

    #[test]
    fn rejects_orphaned_tool_result() {
        let mut state = ConversationState::new(vec![Message::user("hi")]).unwrap();
        let err = state.append(vec![Message::tool("ghost", "x")]).unwrap_err();
        assert!(matches!(err, RouteFlowError::ToolResultMismatch(_)));
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn rejects_duplicate_tool_result() {
        let mut state = ConversationState::new(vec![
            Message::assistant_with_tools("", vec![call("a")]),
            Message::tool("a", "one"),
        ])
        .unwrap();
        assert!(state.append(vec![Message::tool("a", "again")]).is_err());
    }

    #[test]
    fn iterations_only_move_forward() {
        let mut state = ConversationState::default();
        assert_eq!(state.record_iteration(), 1);
        assert_eq!(state.record_iteration(), 2);
        assert_eq!(state.iterations(), 2);
    }
}
