use std::pin::Pin;
use std::sync::Arc;

use futures::{stream, Stream, StreamExt};
use tracing::{debug, instrument};

use crate::agent::RuntimeContext;
use crate::error::Result;
use crate::guard::{SafetyGuard, REFUSAL_MESSAGE};
use crate::message::uuid;
use crate::runtime::{FlowEvent, FlowExecutor};
use crate::state::ConversationState;

use super::convert::{message_to_items, request_to_messages};
use super::types::{
    OutputItem, ResponseAccumulator, ResponseEvent, ResponsesRequest, ResponsesResponse,
};

pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<ResponseEvent>> + Send>>;

/// Maps one engine event onto zero or more response events. Node updates
/// from `final_node` are dropped because its text already went out as
/// deltas; deltas come only from `final_node` and never carry tool activity.
pub fn translate_event(event: FlowEvent, final_node: &str) -> Vec<ResponseEvent> {
    match event {
        FlowEvent::Updates { node, messages } => {
            if node == final_node {
                return Vec::new();
            }
            messages
                .iter()
                .flat_map(message_to_items)
                .map(|item| ResponseEvent::OutputItemDone { item })
                .collect()
        }
        FlowEvent::Messages { node, chunk } => {
            if node != final_node || chunk.has_tool_activity() || chunk.content.is_empty() {
                return Vec::new();
            }
            vec![ResponseEvent::OutputTextDelta {
                item_id: chunk.message_id,
                delta: chunk.content,
            }]
        }
    }
}

/// Request/response front end over the routing workflow.
#[derive(Clone)]
pub struct ResponsesAgent {
    executor: FlowExecutor,
    guard: Option<Arc<SafetyGuard>>,
}

impl ResponsesAgent {
    pub fn new(executor: FlowExecutor) -> Self {
        Self {
            executor,
            guard: None,
        }
    }

    pub fn from_context(context: RuntimeContext) -> Result<Self> {
        Ok(Self::new(FlowExecutor::routing(context)?))
    }

    /// Screens the input before the workflow runs.
    pub fn with_guard(mut self, guard: SafetyGuard) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    pub fn predict_stream(&self, request: ResponsesRequest) -> ResponseStream {
        let executor = self.executor.clone();
        let guard = self.guard.clone();
        let start = async move {
            let messages = match request_to_messages(&request.input) {
                Ok(messages) => messages,
                Err(err) => return failed(err),
            };
            if let Some(guard) = guard {
                match guard.assess(&messages).await {
                    Ok(assessment) if !assessment.is_safe() => {
                        let refusal = ResponseEvent::OutputItemDone {
                            item: OutputItem::text(uuid(), REFUSAL_MESSAGE),
                        };
                        return Box::pin(stream::iter(vec![Ok(refusal)])) as ResponseStream;
                    }
                    Ok(_) => {}
                    Err(err) => return failed(err),
                }
            }
            let state = match ConversationState::new(messages) {
                Ok(state) => state,
                Err(err) => return failed(err),
            };

            let final_node = executor.context().final_node().to_string();
            Box::pin(executor.stream(state).flat_map(move |item| {
                let events: Vec<Result<ResponseEvent>> = match item {
                    Ok(event) => translate_event(event, &final_node)
                        .into_iter()
                        .map(Ok)
                        .collect(),
                    Err(err) => vec![Err(err)],
                };
                stream::iter(events)
            })) as ResponseStream
        };
        Box::pin(stream::once(start).flatten())
    }

    /// Buffered form of [`predict_stream`](Self::predict_stream).
    #[instrument(skip_all)]
    pub async fn predict(&self, request: ResponsesRequest) -> Result<ResponsesResponse> {
        let custom_outputs = request.custom_inputs.clone();
        let mut events = self.predict_stream(request);
        let mut accumulator = ResponseAccumulator::new();
        while let Some(event) = events.next().await {
            accumulator.push(event?);
        }
        let response = accumulator.finish(custom_outputs);
        debug!(items = response.output.len(), "prediction finished");
        Ok(response)
    }
}

fn failed(err: crate::error::RouteFlowError) -> ResponseStream {
    Box::pin(stream::iter(vec![Err(err)]))
}
