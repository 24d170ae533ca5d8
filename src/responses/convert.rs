use serde_json::Value;

use crate::error::{Result, RouteFlowError};
use crate::message::{Message, ToolCall};

use super::types::{ContentPart, OutputItem};

/// Converts response-API input items into canonical messages. Accepts
/// `message`, `function_call` and `function_call_output` items as well as
/// plain `{role, content}` objects.
pub fn request_to_messages(input: &[Value]) -> Result<Vec<Message>> {
    let mut messages: Vec<Message> = Vec::with_capacity(input.len());
    for item in input {
        match item["type"].as_str() {
            Some("function_call") => {
                let call = ToolCall {
                    id: required_str(item, "call_id")?.to_string(),
                    name: required_str(item, "name")?.to_string(),
                    arguments: item["arguments"].as_str().unwrap_or("{}").to_string(),
                };
                // calls that follow an assistant item belong to that turn
                match messages.last_mut() {
                    Some(Message::Assistant { tool_calls, .. }) => tool_calls.push(call),
                    _ => messages.push(Message::assistant_with_tools("", vec![call])),
                }
            }
            Some("function_call_output") => {
                let output = match &item["output"] {
                    Value::String(text) => text.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                messages.push(Message::tool(required_str(item, "call_id")?, output));
            }
            Some("message") | None => messages.push(role_message(item)?),
            Some(other) => {
                return Err(RouteFlowError::Serialization(format!(
                    "unsupported input item type `{other}`"
                )))
            }
        }
    }
    Ok(messages)
}

fn required_str<'a>(item: &'a Value, key: &str) -> Result<&'a str> {
    item[key].as_str().ok_or_else(|| {
        RouteFlowError::Serialization(format!("input item is missing string `{key}`"))
    })
}

fn text_of(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect(),
        _ => String::new(),
    }
}

fn role_message(item: &Value) -> Result<Message> {
    let content = text_of(&item["content"]);
    match item["role"].as_str().unwrap_or("user") {
        "user" => Ok(Message::user(content)),
        "system" | "developer" => Ok(Message::system(content)),
        "assistant" => Ok(Message::assistant(content)),
        "tool" => Ok(Message::tool(required_str(item, "tool_call_id")?, content)),
        other => Err(RouteFlowError::Serialization(format!(
            "unsupported message role `{other}`"
        ))),
    }
}

/// Output items for one message. Tool-calling assistant turns become an
/// optional text item followed by one `function_call` per call.
pub fn message_to_items(message: &Message) -> Vec<OutputItem> {
    match message {
        Message::Assistant {
            id,
            content,
            tool_calls,
            ..
        } if !tool_calls.is_empty() => {
            let mut items = Vec::with_capacity(tool_calls.len() + 1);
            if !content.trim().is_empty() {
                items.push(OutputItem::text(id.clone(), content.clone()));
            }
            items.extend(tool_calls.iter().map(|call| OutputItem::FunctionCall {
                id: id.clone(),
                call_id: call.id.clone(),
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            }));
            items
        }
        Message::Assistant { id, content, .. } => {
            vec![OutputItem::text(id.clone(), content.clone())]
        }
        Message::Tool {
            tool_call_id,
            content,
            ..
        } => vec![OutputItem::FunctionCallOutput {
            call_id: tool_call_id.clone(),
            output: content.clone(),
        }],
        Message::User { id, content } | Message::System { id, content } => {
            vec![OutputItem::Message {
                id: id.clone(),
                role: message.role().to_string(),
                content: vec![ContentPart::input_text(content.clone())],
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_mixed_input_items() {
        let input = vec![
            json!({"role": "user", "content": "What were Q1 KPIs?"}),
            json!({"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "Let me check."}]}),
            json!({"type": "function_call", "call_id": "c1", "name": "search", "arguments": "{\"query\":\"kpi\"}"}),
            json!({"type": "function_call_output", "call_id": "c1", "output": "{}"}),
        ];
        let messages = request_to_messages(&input).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content(), "Let me check.");
        assert_eq!(messages[1].tool_calls()[0].id, "c1");
        assert_eq!(messages[2].role(), "tool");
    }

    #[test]
    fn tool_calling_turn_yields_text_and_calls() {
        let message = Message::assistant_with_tools(
            "Searching",
            vec![
                ToolCall::new("c1", "search", &json!({"query": "a"})),
                ToolCall::new("c2", "search", &json!({"query": "b"})),
            ],
        );
        let items = message_to_items(&message);
        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], OutputItem::Message { .. }));
        assert!(matches!(&items[2], OutputItem::FunctionCall { call_id, .. } if call_id == "c2"));
    }

    #[test]
    fn blank_text_is_not_emitted_for_tool_calls() {
        let message =
            Message::assistant_with_tools("  ", vec![ToolCall::new("c1", "search", &json!({}))]);
        assert_eq!(message_to_items(&message).len(), 1);
    }

    #[test]
    fn unknown_item_type_is_rejected() {
        assert!(request_to_messages(&[json!({"type": "reasoning"})]).is_err());
    }
}
