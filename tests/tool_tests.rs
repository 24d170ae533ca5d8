mod common;

use std::sync::Arc;

use serde_json::json;

use agentroute::tools::{execute_call, VectorSearchTool, STRUCTURED_QUERY_TOOL};
use agentroute::{
    Agent, AgentContext, ConversationState, Message, ScriptedChatModel, Tool, ToolCall, ToolNode,
    ToolRegistry, UNSTRUCTURED_TOOLS,
};

use common::{config, context, FakeIndex, SEARCH_TOOL};

fn search(id: &str, query: &str) -> ToolCall {
    ToolCall::new(id, SEARCH_TOOL, &json!({"query": query}))
}

#[tokio::test]
async fn blank_search_row_yields_single_fact() -> anyhow::Result<()> {
    let settings = config(3)
        .vector_search_tool()
        .cloned()
        .expect("tool configured");
    let index = Arc::new(FakeIndex::new());
    let tool = VectorSearchTool::new(&settings, Default::default(), index.clone());

    let hits = tool.retrieve("returns").await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "doc-1");

    let call = search("c1", "returns");
    let runtime = context(&ScriptedChatModel::new(), 3);
    let output = execute_call(&runtime.tools, &call).await;
    let facts: serde_json::Value = serde_json::from_str(&output)?;
    assert_eq!(facts, json!({"fact_1": "Returns are accepted within 30 days."}));
    assert_eq!(tool.name(), SEARCH_TOOL);
    Ok(())
}

#[tokio::test]
async fn one_result_per_call_in_order() -> anyhow::Result<()> {
    let runtime = context(&ScriptedChatModel::new(), 3);
    let state = ConversationState::new(vec![
        Message::user("compare policies"),
        Message::assistant_with_tools(
            "",
            vec![
                search("a", "returns"),
                ToolCall::new("b", "no_such_tool", &json!({})),
                search("c", "shipping"),
            ],
        ),
    ])?;

    let ctx = AgentContext::new(UNSTRUCTURED_TOOLS, &runtime, None);
    let update = ToolNode::new(UNSTRUCTURED_TOOLS).run(&state, &ctx).await?;

    let ids: Vec<&str> = update
        .messages
        .iter()
        .map(|m| match m {
            Message::Tool { tool_call_id, .. } => tool_call_id.as_str(),
            _ => "",
        })
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(update.messages[1].content().starts_with("Error:"));
    assert!(update.messages[2].content().contains("fact_1"));

    let mut state = state;
    state.append(update.messages)?;
    Ok(())
}

#[tokio::test]
async fn duplicate_call_ids_are_answered_once() -> anyhow::Result<()> {
    let runtime = context(&ScriptedChatModel::new(), 3);
    let state = ConversationState::new(vec![
        Message::user("returns"),
        Message::assistant_with_tools("", vec![search("dup", "returns"), search("dup", "again")]),
    ])?;

    let ctx = AgentContext::new(UNSTRUCTURED_TOOLS, &runtime, None);
    let update = ToolNode::new(UNSTRUCTURED_TOOLS).run(&state, &ctx).await?;
    assert_eq!(update.messages.len(), 1);
    Ok(())
}

#[tokio::test]
async fn bad_arguments_become_error_messages() -> anyhow::Result<()> {
    let runtime = context(&ScriptedChatModel::new(), 3);

    let malformed = ToolCall {
        id: "m".into(),
        name: SEARCH_TOOL.into(),
        arguments: "{not json".into(),
    };
    assert!(execute_call(&runtime.tools, &malformed).await.starts_with("Error:"));

    let missing = ToolCall::new("q", SEARCH_TOOL, &json!({"text": "returns"}));
    assert!(execute_call(&runtime.tools, &missing).await.starts_with("Error:"));
    Ok(())
}

#[tokio::test]
async fn registered_structured_query_tool_answers_question() -> anyhow::Result<()> {
    let runtime = context(&ScriptedChatModel::new(), 3);
    let tool = runtime.structured.clone().expect("structured service bound");

    let mut registry = ToolRegistry::new();
    registry.register(tool)?;
    assert!(registry.contains(STRUCTURED_QUERY_TOOL));

    let call = ToolCall::new("s1", STRUCTURED_QUERY_TOOL, &json!({"question": "Q1 revenue?"}));
    let output = execute_call(&registry, &call).await;
    assert_eq!(
        output,
        "SELECT sum(revenue) FROM sales WHERE quarter = 'Q1'\n\nQ1 revenue: 4.2M"
    );

    let missing = ToolCall::new("s2", STRUCTURED_QUERY_TOOL, &json!({}));
    assert!(execute_call(&registry, &missing).await.starts_with("Error:"));
    Ok(())
}

#[test]
fn orphan_tool_result_is_rejected() {
    let result = ConversationState::new(vec![
        Message::user("hi"),
        Message::tool("never-issued", "output"),
    ]);
    assert!(result.is_err());
}
