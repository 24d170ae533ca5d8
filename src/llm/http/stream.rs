use serde_json::Value;

use crate::error::{Result, RouteFlowError};
use crate::llm::types::{ChatChunk, ToolCallChunk};

/// SSE (Server-Sent Events) 解析器
///
/// Parses chat-completions stream bodies:
/// ```text
/// data: {"id":"...","choices":[{"delta":{"content":"Hello"}}]}
///
/// data: {"id":"...","choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\""}}]}}]}
///
/// data: [DONE]
/// ```
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    done: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes; returns every chunk completed by them. Partial events
    /// stay buffered as bytes until their terminating blank line arrives, so
    /// a character split across reads is decoded whole.
    pub fn parse_chunk(&mut self, data: &[u8]) -> Result<Vec<ChatChunk>> {
        // CRLF framing folds to LF
        self.buffer.extend(data.iter().copied().filter(|byte| *byte != b'\r'));

        let mut chunks = Vec::new();
        while let Some(end_pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let event: Vec<u8> = self.buffer.drain(..end_pos + 2).collect();
            let event_text = std::str::from_utf8(&event[..end_pos])
                .map_err(|e| RouteFlowError::Model(format!("SSE event is not UTF-8: {}", e)))?;
            if let Some(chunk) = self.parse_event(event_text)? {
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }

    /// True once `[DONE]` has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    fn parse_event(&mut self, event_text: &str) -> Result<Option<ChatChunk>> {
        let data: String = event_text
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|line| line.trim_start())
            .collect::<Vec<_>>()
            .join("\n");
        let data = data.trim();
        if data.is_empty() {
            return Ok(None);
        }
        if data == "[DONE]" {
            self.done = true;
            return Ok(None);
        }

        let json: Value = serde_json::from_str(data).map_err(|e| {
            RouteFlowError::Model(format!("failed to parse SSE JSON: {}: {}", e, data))
        })?;
        Ok(Self::extract_delta(&json))
    }

    fn extract_delta(json: &Value) -> Option<ChatChunk> {
        let choice = json["choices"].as_array().and_then(|c| c.first())?;
        let delta = &choice["delta"];

        let tool_call_chunks = delta["tool_calls"]
            .as_array()
            .map(|calls| {
                calls
                    .iter()
                    .enumerate()
                    .map(|(position, call)| ToolCallChunk {
                        index: call["index"]
                            .as_u64()
                            .map(|i| i as usize)
                            .unwrap_or(position),
                        id: call["id"].as_str().map(str::to_string),
                        name: call["function"]["name"].as_str().map(str::to_string),
                        arguments: call["function"]["arguments"].as_str().map(str::to_string),
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let chunk = ChatChunk {
            message_id: json["id"].as_str().unwrap_or_default().to_string(),
            content: delta["content"].as_str().unwrap_or_default().to_string(),
            tool_call_chunks,
            tool_calls: Vec::new(),
            finish_reason: choice["finish_reason"].as_str().map(str::to_string),
        };
        if chunk.content.is_empty()
            && chunk.tool_call_chunks.is_empty()
            && chunk.finish_reason.is_none()
        {
            return None;
        }
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_deltas_across_reads() {
        let mut parser = SseParser::new();
        let first = parser
            .parse_chunk(b"data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\"Hel")
            .unwrap();
        assert!(first.is_empty());
        let rest = parser
            .parse_chunk(b"lo\"}}]}\n\ndata: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\n")
            .unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].content, "Hello");
        assert_eq!(rest[1].message_id, "c1");
    }

    #[test]
    fn parses_tool_call_fragments() {
        let mut parser = SseParser::new();
        let data = b"data: {\"id\":\"c2\",\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"function\":{\"name\":\"search\",\"arguments\":\"{\\\"q\"}}]}}]}\n\n";
        let chunks = parser.parse_chunk(data).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].has_tool_activity());
        assert_eq!(chunks[0].tool_call_chunks[0].name.as_deref(), Some("search"));
        assert_eq!(chunks[0].tool_call_chunks[0].arguments.as_deref(), Some("{\"q"));
    }

    #[test]
    fn done_marker_sets_flag() {
        let mut parser = SseParser::new();
        let chunks = parser.parse_chunk(b"data: [DONE]\n\n").unwrap();
        assert!(chunks.is_empty());
        assert!(parser.is_done());
    }

    #[test]
    fn multibyte_character_split_across_reads() {
        let body = "data: {\"id\":\"c3\",\"choices\":[{\"delta\":{\"content\":\"café\"}}]}\n\n";
        let bytes = body.as_bytes();
        let split = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut parser = SseParser::new();
        assert!(parser.parse_chunk(&bytes[..split]).unwrap().is_empty());
        let chunks = parser.parse_chunk(&bytes[split..]).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "café");
    }

    #[test]
    fn crlf_framing_is_accepted() {
        let mut parser = SseParser::new();
        let chunks = parser
            .parse_chunk(b"data: {\"id\":\"c4\",\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\r\n\r\n")
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "ok");
    }
}
