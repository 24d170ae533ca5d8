use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::stream::SseParser;
use crate::config::{EndpointConfig, EnvConfig};
use crate::error::{Result, RouteFlowError};
use crate::llm::client::{ChatModel, DynChatModel};
use crate::llm::types::{ChatChunk, ChatRequest, ChatStream, StructuredSchema};
use crate::message::{Message, ToolCall};

/// Client for any chat-completions endpoint speaking the OpenAI wire format.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatClient {
    pub fn new<S1, S2, S3>(endpoint: S1, api_key: S2, model: S3) -> Result<Self>
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| RouteFlowError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_endpoint(endpoint: &EndpointConfig) -> Result<Self> {
        let model = endpoint.model.clone().ok_or_else(|| {
            RouteFlowError::Config(format!("endpoint `{}` has no model", endpoint.url))
        })?;
        let api_key = EnvConfig::endpoint_api_key(endpoint)?;
        Self::new(endpoint.url.clone(), api_key, model)
    }

    fn body(&self, request: &ChatRequest, stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages.iter().map(message_to_wire).collect::<Vec<_>>(),
            "stream": stream,
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(
                request
                    .tools
                    .iter()
                    .map(|spec| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": spec.name,
                                "description": spec.description,
                                "parameters": spec.parameters_schema(),
                            }
                        })
                    })
                    .collect(),
            );
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| RouteFlowError::Model(format!("chat request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RouteFlowError::Model(format!(
                "chat endpoint returned {}: {}",
                status, text
            )));
        }
        Ok(response)
    }

    async fn complete(&self, body: Value) -> Result<Message> {
        let payload: Value = self
            .post(&body)
            .await?
            .json()
            .await
            .map_err(|e| RouteFlowError::Model(format!("invalid chat response: {}", e)))?;
        parse_completion(&payload)
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    #[instrument(skip_all, fields(model = %self.model, messages = request.messages.len()))]
    async fn invoke(&self, request: ChatRequest) -> Result<Message> {
        self.complete(self.body(&request, false)).await
    }

    fn stream(&self, request: ChatRequest) -> ChatStream {
        let client = self.clone();
        Box::pin(futures::stream::unfold(
            SseState::Start(client, request),
            |state| async move {
                match state {
                    SseState::Start(client, request) => {
                        let body = client.body(&request, true);
                        match client.post(&body).await {
                            Ok(response) => {
                                let bytes = response
                                    .bytes_stream()
                                    .map(|chunk| chunk.map(|b| b.to_vec()))
                                    .boxed();
                                read_next(bytes, SseParser::new(), VecDeque::new()).await
                            }
                            Err(e) => Some((Err(e), SseState::Done)),
                        }
                    }
                    SseState::Reading {
                        body,
                        parser,
                        pending,
                    } => read_next(body, parser, pending).await,
                    SseState::Done => None,
                }
            },
        ))
    }

    #[instrument(skip_all, fields(model = %self.model, schema = %schema.name))]
    async fn invoke_structured(
        &self,
        request: ChatRequest,
        schema: &StructuredSchema,
    ) -> Result<Value> {
        let mut body = self.body(&request, false);
        body["response_format"] = json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
                "strict": true,
            }
        });
        let message = self.complete(body).await?;
        serde_json::from_str(message.content().trim()).map_err(|e| {
            RouteFlowError::ClassifierContract(format!(
                "`{}` output is not valid JSON: {}",
                schema.name, e
            ))
        })
    }

    fn clone_dyn(&self) -> DynChatModel {
        Arc::new(self.clone())
    }
}

type ByteStream = BoxStream<'static, reqwest::Result<Vec<u8>>>;

enum SseState {
    Start(OpenAiCompatClient, ChatRequest),
    Reading {
        body: ByteStream,
        parser: SseParser,
        pending: VecDeque<ChatChunk>,
    },
    Done,
}

async fn read_next(
    mut body: ByteStream,
    mut parser: SseParser,
    mut pending: VecDeque<ChatChunk>,
) -> Option<(Result<ChatChunk>, SseState)> {
    loop {
        if let Some(chunk) = pending.pop_front() {
            return Some((
                Ok(chunk),
                SseState::Reading {
                    body,
                    parser,
                    pending,
                },
            ));
        }
        if parser.is_done() {
            return None;
        }
        match body.next().await {
            Some(Ok(bytes)) => match parser.parse_chunk(&bytes) {
                Ok(chunks) => pending.extend(chunks),
                Err(e) => return Some((Err(e), SseState::Done)),
            },
            Some(Err(e)) => {
                return Some((
                    Err(RouteFlowError::Model(format!("stream read failed: {}", e))),
                    SseState::Done,
                ))
            }
            None => {
                debug!("chat stream closed without [DONE]");
                return None;
            }
        }
    }
}

fn message_to_wire(message: &Message) -> Value {
    match message {
        Message::Assistant {
            content,
            tool_calls,
            ..
        } if !tool_calls.is_empty() => json!({
            "role": "assistant",
            "content": if content.is_empty() { Value::Null } else { json!(content) },
            "tool_calls": tool_calls
                .iter()
                .map(|call| json!({
                    "id": call.id,
                    "type": "function",
                    "function": { "name": call.name, "arguments": call.arguments },
                }))
                .collect::<Vec<_>>(),
        }),
        Message::Tool {
            tool_call_id,
            content,
            ..
        } => json!({
            "role": "tool",
            "tool_call_id": tool_call_id,
            "content": content,
        }),
        other => json!({
            "role": other.role(),
            "content": other.content(),
        }),
    }
}

fn parse_completion(payload: &Value) -> Result<Message> {
    let choice = payload["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or_else(|| RouteFlowError::Model("chat response has no choices".to_string()))?;
    let message = &choice["message"];
    let content = message["content"].as_str().unwrap_or_default();
    let tool_calls: Vec<ToolCall> = message["tool_calls"]
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .filter_map(|call| {
                    Some(ToolCall {
                        id: call["id"].as_str()?.to_string(),
                        name: call["function"]["name"].as_str()?.to_string(),
                        arguments: call["function"]["arguments"]
                            .as_str()
                            .unwrap_or("{}")
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let mut reply = Message::assistant_with_tools(content, tool_calls);
    if let (Some(id), Message::Assistant { id: slot, .. }) = (payload["id"].as_str(), &mut reply) {
        *slot = id.to_string();
    }
    Ok(reply)
}
