mod common;

use std::io::Write;

use serde_json::json;

use agentroute::{AgentConfig, RouteFlowError, WorkerId};

use common::config_value;

#[test]
fn loads_config_from_file() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, "{}", config_value(5))?;

    let config = AgentConfig::from_path(file.path())?;
    assert_eq!(config.agents_max_iterations, 5);
    assert_eq!(config.final_node, "response_agent");
    assert_eq!(config.vector_search_parameters.num_results, 5);

    let roster = config.roster()?;
    let workers: Vec<WorkerId> = roster.iter().collect();
    assert_eq!(
        workers,
        vec![
            WorkerId::StructuredAgent,
            WorkerId::UnstructuredAgent,
            WorkerId::ResponseAgent
        ]
    );
    Ok(())
}

#[test]
fn shipped_sample_config_is_valid() -> anyhow::Result<()> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/agent.json");
    let config = AgentConfig::from_path(path)?;
    assert!(config.endpoints.chat.is_some());
    assert!(!config.guard.enabled);
    Ok(())
}

#[test]
fn unknown_worker_fails_fast() {
    let mut value = config_value(3);
    value["agents"]["weather_agent"] = json!({"system_prompt": "forecast"});
    let err = AgentConfig::from_json(&value.to_string()).unwrap_err();
    assert!(matches!(err, RouteFlowError::UnknownWorker(_) | RouteFlowError::Config(_)));
}

#[test]
fn unstructured_worker_requires_search_tool() {
    let mut value = config_value(3);
    value["agents"]["unstructured_agent"] = json!({"system_prompt": "search"});
    assert!(AgentConfig::from_json(&value.to_string()).is_err());
}

#[test]
fn final_node_must_be_a_worker() {
    let mut value = config_value(3);
    value["final_node"] = json!("supervisor");
    assert!(AgentConfig::from_json(&value.to_string()).is_err());
}

#[test]
fn missing_file_is_config_error() {
    let err = AgentConfig::from_path("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, RouteFlowError::Config(_)));
}
