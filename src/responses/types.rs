use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ContentPart {
    pub fn output_text(text: impl Into<String>) -> Self {
        Self {
            kind: "output_text".to_string(),
            text: text.into(),
        }
    }

    pub fn input_text(text: impl Into<String>) -> Self {
        Self {
            kind: "input_text".to_string(),
            text: text.into(),
        }
    }
}

/// One output item of a response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        id: String,
        role: String,
        content: Vec<ContentPart>,
    },
    FunctionCall {
        id: String,
        call_id: String,
        name: String,
        arguments: String,
    },
    FunctionCallOutput {
        call_id: String,
        output: String,
    },
}

impl OutputItem {
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        OutputItem::Message {
            id: id.into(),
            role: "assistant".to_string(),
            content: vec![ContentPart::output_text(text)],
        }
    }

    /// Concatenated text of a message item; empty for other kinds.
    pub fn text_content(&self) -> String {
        match self {
            OutputItem::Message { content, .. } => {
                content.iter().map(|part| part.text.as_str()).collect()
            }
            _ => String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseEvent {
    #[serde(rename = "response.output_item.done")]
    OutputItemDone { item: OutputItem },
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta { item_id: String, delta: String },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResponsesRequest {
    pub input: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_inputs: Option<Value>,
}

impl ResponsesRequest {
    pub fn from_text(text: &str) -> Self {
        Self {
            input: vec![serde_json::json!({"role": "user", "content": text})],
            custom_inputs: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResponsesResponse {
    pub output: Vec<OutputItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_outputs: Option<Value>,
}

/// Builds the buffered response from a stream of events: consecutive deltas
/// with one item id grow a single text item, done items are kept as-is.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    output: Vec<OutputItem>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ResponseEvent) {
        match event {
            ResponseEvent::OutputItemDone { item } => self.output.push(item),
            ResponseEvent::OutputTextDelta { item_id, delta } => {
                if let Some(OutputItem::Message { id, content, .. }) = self.output.last_mut() {
                    if *id == item_id {
                        match content.last_mut() {
                            Some(part) => part.text.push_str(&delta),
                            None => content.push(ContentPart::output_text(delta)),
                        }
                        return;
                    }
                }
                self.output.push(OutputItem::text(item_id, delta));
            }
        }
    }

    pub fn finish(self, custom_outputs: Option<Value>) -> ResponsesResponse {
        ResponsesResponse {
            output: self.output,
            custom_outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_wire_type_names() {
        let event = ResponseEvent::OutputTextDelta {
            item_id: "m1".into(),
            delta: "Hi".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "response.output_text.delta");

        let item = OutputItem::FunctionCallOutput {
            call_id: "c1".into(),
            output: "{}".into(),
        };
        assert_eq!(serde_json::to_value(&item).unwrap()["type"], json!("function_call_output"));
    }

    #[test]
    fn deltas_with_new_id_start_new_item() {
        let mut acc = ResponseAccumulator::new();
        for (id, delta) in [("a", "He"), ("a", "y"), ("b", "!")] {
            acc.push(ResponseEvent::OutputTextDelta {
                item_id: id.into(),
                delta: delta.into(),
            });
        }
        let response = acc.finish(None);
        assert_eq!(response.output.len(), 2);
        assert_eq!(response.output[0].text_content(), "Hey");
    }
}
