use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::{Result, RouteFlowError};
use crate::message::Message;

use super::manifest::{FieldType, ToolField, ToolSpec};
use super::tool::{Tool, ToolInvocation};

pub const STRUCTURED_QUERY_TOOL: &str = "structured_query";

/// Natural-language-to-data service. Returns its reply as assistant messages;
/// the first usually restates the query, the last carries the result.
#[async_trait]
pub trait StructuredQueryService: Send + Sync {
    async fn invoke(&self, messages: &[Message]) -> Result<Vec<Message>>;
}

/// The structured worker sends it the whole history through
/// [`query_history`](Self::query_history); registered as a [`Tool`] it answers
/// a single `question`.
pub struct StructuredQueryTool {
    spec: ToolSpec,
    service: Arc<dyn StructuredQueryService>,
}

impl StructuredQueryTool {
    pub fn new(service: Arc<dyn StructuredQueryService>, description: Option<&str>) -> Self {
        let spec = ToolSpec::builder(STRUCTURED_QUERY_TOOL)
            .description(description.unwrap_or(
                "Answers questions over structured business data such as tables and metrics.",
            ))
            .input(
                ToolField::new("question", FieldType::String)
                    .required()
                    .with_description("Question to answer from structured data"),
            )
            .build();
        Self { spec, service }
    }

    /// Sends the whole history and returns the service's first and last reply
    /// contents. An empty reply is an error.
    #[instrument(skip_all, fields(history = messages.len()))]
    pub async fn query_history(&self, messages: &[Message]) -> Result<(String, String)> {
        let replies = self.service.invoke(messages).await?;
        match (replies.first(), replies.last()) {
            (Some(first), Some(last)) => {
                Ok((first.content().to_string(), last.content().to_string()))
            }
            _ => Err(RouteFlowError::Service(
                "structured query service returned no messages".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Tool for StructuredQueryTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, invocation: ToolInvocation) -> Result<String> {
        let question = invocation.str_arg("question").ok_or_else(|| {
            RouteFlowError::InvalidArguments {
                tool: self.spec.name.clone(),
                reason: "missing `question`".to_string(),
            }
        })?;
        let (first, last) = self.query_history(&[Message::user(question)]).await?;
        Ok(format!("{first}\n\n{last}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Replies(Vec<Message>);

    #[async_trait]
    impl StructuredQueryService for Replies {
        async fn invoke(&self, _messages: &[Message]) -> Result<Vec<Message>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn returns_first_and_last_reply() {
        let tool = StructuredQueryTool::new(Arc::new(Replies(vec![
            Message::assistant("SELECT region, revenue FROM kpi"),
            Message::assistant("interim"),
            Message::assistant("EMEA 4.2M"),
        ])), None);
        let (first, last) = tool
            .query_history(&[Message::user("Revenue by region?")])
            .await
            .unwrap();
        assert_eq!(first, "SELECT region, revenue FROM kpi");
        assert_eq!(last, "EMEA 4.2M");
    }

    #[tokio::test]
    async fn empty_reply_is_a_service_error() {
        let tool = StructuredQueryTool::new(Arc::new(Replies(Vec::new())), None);
        let err = tool
            .query_history(&[Message::user("Revenue by region?")])
            .await
            .unwrap_err();
        assert!(matches!(err, RouteFlowError::Service(_)));
    }

    #[tokio::test]
    async fn invoke_requires_question() {
        let tool = StructuredQueryTool::new(Arc::new(Replies(Vec::new())), Some("Sales data"));
        assert_eq!(tool.spec().description, "Sales data");
        let err = tool
            .invoke(ToolInvocation::new(STRUCTURED_QUERY_TOOL, Default::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, RouteFlowError::InvalidArguments { .. }));
    }
}
