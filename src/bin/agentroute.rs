use std::path::PathBuf;

use agentroute::logging::LoggingConfig;
use agentroute::AgentConfig;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agentroute", version, about = "Supervisor-routed assistant CLI", author)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a configuration file and print the routing graph.
    Check {
        #[arg(long, default_value = "configs/agent.json")]
        config: PathBuf,
    },
    /// Run one turn against the configured HTTP endpoints.
    Chat {
        #[arg(long, default_value = "configs/agent.json")]
        config: PathBuf,
        #[arg(long)]
        message: String,
        /// Print events as they arrive instead of the buffered response.
        #[arg(long)]
        stream: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check { config } => handle_check(config)?,
        Command::Chat {
            config,
            message,
            stream,
        } => handle_chat(config, message, stream).await?,
    }
    Ok(())
}

fn handle_check(path: PathBuf) -> anyhow::Result<()> {
    let config = AgentConfig::from_path(&path)?;
    let roster = config.roster()?;
    let flow = agentroute::build_routing_flow(&roster)?;
    println!("{} is valid", path.display());
    println!("workers: {}", roster.names().join(", "));
    println!("max iterations: {}", config.agents_max_iterations);
    let mut names: Vec<&String> = flow.nodes.keys().collect();
    names.sort();
    for name in names {
        for transition in flow.transitions(name) {
            match &transition.name {
                Some(label) => println!("  {} -[{}]-> {}", name, label, transition.to),
                None => println!("  {} -> {}", name, transition.to),
            }
        }
    }
    Ok(())
}

#[cfg(feature = "http-client")]
async fn handle_chat(path: PathBuf, message: String, stream: bool) -> anyhow::Result<()> {
    use std::sync::Arc;

    use agentroute::llm::ChatModel;
    use agentroute::tools::{
        load_remote_tools, HttpStructuredQueryService, HttpVectorSearchService,
    };
    use agentroute::{
        OpenAiCompatClient, ResponseEvent, ResponsesAgent, ResponsesRequest, RuntimeContext,
        SafetyGuard,
    };
    use anyhow::Context;
    use futures::StreamExt;

    let config = AgentConfig::from_path(&path)?;
    let endpoints = config.endpoints.clone();
    let chat = endpoints
        .chat
        .as_ref()
        .context("`endpoints.chat` is required for chat")?;
    let model = OpenAiCompatClient::from_endpoint(chat)?;

    let guard = if config.guard.enabled {
        let safety = endpoints.safety.as_ref().unwrap_or(chat);
        let guard_model = OpenAiCompatClient::from_endpoint(safety)?;
        Some(SafetyGuard::from_settings(
            guard_model.clone_dyn(),
            &config.guard,
        ))
    } else {
        None
    };

    let mut context = RuntimeContext::new(config, model.clone_dyn())?;
    if let Some(endpoint) = &endpoints.structured_query {
        context = context.with_structured_query(Arc::new(
            HttpStructuredQueryService::from_endpoint(endpoint)?,
        ));
    }
    if let Some(endpoint) = &endpoints.vector_search {
        context = context.with_vector_search(Arc::new(HttpVectorSearchService::from_endpoint(
            endpoint,
        )?))?;
    }
    for tool in load_remote_tools(&endpoints.tool_servers).await {
        context = context.with_tool(tool)?;
    }

    let mut agent = ResponsesAgent::from_context(context)?;
    if let Some(guard) = guard {
        agent = agent.with_guard(guard);
    }

    let request = ResponsesRequest::from_text(&message);
    if stream {
        let mut events = agent.predict_stream(request);
        while let Some(event) = events.next().await {
            match event? {
                ResponseEvent::OutputTextDelta { delta, .. } => print!("{delta}"),
                ResponseEvent::OutputItemDone { item } => {
                    println!("{}", serde_json::to_string(&item)?)
                }
            }
        }
        println!();
    } else {
        let response = agent.predict(request).await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}

#[cfg(not(feature = "http-client"))]
async fn handle_chat(_path: PathBuf, _message: String, _stream: bool) -> anyhow::Result<()> {
    anyhow::bail!("`chat` needs the `http-client` feature: cargo run --features http-client")
}
