use std::path::PathBuf;
use std::sync::Arc;

use mcp_toolbridge::{
    register_tools, Registrar, RegistrationOutcome, StdioConnector, ToolBox, ToolService,
};
use tracing_subscriber::EnvFilter;

// Usage: cargo run --example register_servers -- mcp.json [tool] [json-args]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let config = args.next().map(PathBuf::from);

    // ============================================================================================
    // Step 1: Discover and register
    // ============================================================================================
    let registrar = Registrar::from_config(config.as_deref(), Arc::new(StdioConnector::new()))?;
    let toolbox = Arc::new(ToolBox::new());

    match register_tools(registrar, toolbox.clone()) {
        RegistrationOutcome::Completed { registered } => println!("Registered {registered} tools"),
        RegistrationOutcome::Scheduled(task) => println!("Registered {} tools (scheduled)", task.await?),
        RegistrationOutcome::Abandoned => println!("Registration abandoned"),
    }

    for function in toolbox.functions() {
        println!("- {}{}  [{}]", function.name(), function.signature(), function.service());
    }

    // ============================================================================================
    // Step 2: Optionally call one tool
    // ============================================================================================
    if let Some(tool) = args.next() {
        let call_args = match args.next() {
            Some(raw) => serde_json::from_str(&raw)?,
            None => serde_json::Value::Null,
        };
        let result = toolbox.call_tool(tool, call_args).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
