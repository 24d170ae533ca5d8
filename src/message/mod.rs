use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, RouteFlowError};

/// A single conversation turn. Transport shapes are normalized into this type
/// at the boundary, nothing downstream sees raw dicts or chunks.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        #[serde(default = "uuid")]
        id: String,
        content: String,
    },
    User {
        #[serde(default = "uuid")]
        id: String,
        content: String,
    },
    Assistant {
        #[serde(default = "uuid")]
        id: String,
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Tool {
        #[serde(default = "uuid")]
        id: String,
        tool_call_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Message {
    pub fn system<T: Into<String>>(content: T) -> Self {
        Message::System {
            id: uuid(),
            content: content.into(),
        }
    }

    pub fn user<T: Into<String>>(content: T) -> Self {
        Message::User {
            id: uuid(),
            content: content.into(),
        }
    }

    pub fn assistant<T: Into<String>>(content: T) -> Self {
        Message::Assistant {
            id: uuid(),
            content: content.into(),
            tool_calls: Vec::new(),
            name: None,
        }
    }

    pub fn assistant_named<T: Into<String>, N: Into<String>>(name: N, content: T) -> Self {
        Message::Assistant {
            id: uuid(),
            content: content.into(),
            tool_calls: Vec::new(),
            name: Some(name.into()),
        }
    }

    pub fn assistant_with_tools<T: Into<String>>(content: T, tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant {
            id: uuid(),
            content: content.into(),
            tool_calls,
            name: None,
        }
    }

    pub fn tool<I: Into<String>, T: Into<String>>(tool_call_id: I, content: T) -> Self {
        Message::Tool {
            id: uuid(),
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            name: None,
        }
    }

    pub fn tool_named<I, N, T>(tool_call_id: I, name: N, content: T) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        T: Into<String>,
    {
        Message::Tool {
            id: uuid(),
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            name: Some(name.into()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Message::System { id, .. }
            | Message::User { id, .. }
            | Message::Assistant { id, .. }
            | Message::Tool { id, .. } => id,
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
            Message::Tool { .. } => "tool",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System { content, .. }
            | Message::User { content, .. }
            | Message::Assistant { content, .. }
            | Message::Tool { content, .. } => content,
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }

    /// Prefixes non-empty text with a `<name>...</name>` label line.
    pub fn labeled(label: &str, content: &str) -> String {
        format!("<name>{label}</name>\n{content}")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Serialized JSON object.
    #[serde(default = "empty_arguments")]
    pub arguments: String,
}

impl ToolCall {
    pub fn new<I, N>(id: I, name: N, arguments: &Value) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.to_string(),
        }
    }

    /// Decodes `arguments` into a flat key/value mapping. Blank arguments are
    /// treated as an empty object.
    pub fn parse_arguments(&self) -> Result<Map<String, Value>> {
        if self.arguments.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(RouteFlowError::InvalidArguments {
                tool: self.name.clone(),
                reason: format!("expected a JSON object, got `{other}`"),
            }),
            Err(err) => Err(RouteFlowError::InvalidArguments {
                tool: self.name.clone(),
                reason: err.to_string(),
            }),
        }
    }
}

fn empty_arguments() -> String {
    "{}".to_string()
}

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

pub fn uuid() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("msg-{}-{}-{}", now.as_secs(), now.subsec_nanos(), seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_role_tagged_messages() {
        let message: Message = serde_json::from_value(json!({
            "role": "tool",
            "tool_call_id": "call-1",
            "content": "{}"
        }))
        .unwrap();
        assert_eq!(message.role(), "tool");
        assert!(message.id().starts_with("msg-"));
    }

    #[test]
    fn uuids_are_unique() {
        let a = uuid();
        let b = uuid();
        assert_ne!(a, b);
    }

    #[test]
    fn blank_arguments_parse_as_empty_object() {
        let call = ToolCall {
            id: "1".into(),
            name: "search".into(),
            arguments: "  ".into(),
        };
        assert!(call.parse_arguments().unwrap().is_empty());
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let call = ToolCall::new("1", "search", &json!([1, 2]));
        assert!(matches!(
            call.parse_arguments(),
            Err(RouteFlowError::InvalidArguments { .. })
        ));
    }
}
