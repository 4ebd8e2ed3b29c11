//! Catalog fetching: which tools does each configured server offer?

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ServiceDescriptor;
use crate::session::{Connector, Session, SessionError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("unexpected tools/list response: expected an object with `tools` or an array, got {0}")]
    UnexpectedShape(String),
    #[error("invalid tool descriptor: {0}")]
    InvalidTool(#[source] serde_json::Error),
}

/// One tool as advertised by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Map<String, Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        }
    }
}

/// A tool paired with the server it must be called on.
///
/// Tool names are only unique per server, so the binding is the smallest
/// unit that can actually be executed.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolBinding {
    pub tool: ToolDescriptor,
    pub service: Arc<ServiceDescriptor>,
}

impl ToolBinding {
    pub fn new(tool: ToolDescriptor, service: Arc<ServiceDescriptor>) -> Self {
        Self { tool, service }
    }
}

/// Normalize a `tools/list` response into tool descriptors.
pub fn parse_catalog(response: Value) -> Result<Vec<ToolDescriptor>, CatalogError> {
    let entries = match response {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("tools") {
            Some(Value::Array(entries)) => entries,
            Some(other) => return Err(CatalogError::UnexpectedShape(kind_of(&other).to_string())),
            None => return Err(CatalogError::UnexpectedShape("an object without `tools`".to_string())),
        },
        other => return Err(CatalogError::UnexpectedShape(kind_of(&other).to_string())),
    };

    entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).map_err(CatalogError::InvalidTool))
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

async fn list_catalog(session: &mut dyn Session) -> Result<Value, SessionError> {
    session.initialize().await?;
    session.list_tools().await
}

/// Fetch the catalog of a single server.
///
/// The session is closed before the response is inspected, whether or not
/// listing succeeded.
pub async fn fetch_service_tools(
    connector: &dyn Connector,
    service: &ServiceDescriptor,
) -> Result<Vec<ToolDescriptor>, CatalogError> {
    let mut session = connector.connect(service).await?;
    debug!(server = %service, "connected, fetching tools");

    let response = list_catalog(session.as_mut()).await;
    if let Err(e) = session.close().await {
        warn!(server = %service, error = %e, "failed to close MCP session");
    }

    parse_catalog(response?)
}

/// Fetch the catalogs of all servers, one after another.
///
/// A server that cannot be reached or answers with garbage contributes no
/// tools; the others are unaffected.
pub async fn fetch_all_tools(
    connector: &dyn Connector,
    services: &[ServiceDescriptor],
) -> Vec<ToolBinding> {
    let mut bindings = Vec::new();

    for service in services {
        info!(server = %service, name = %service.name, "initializing MCP session");
        match fetch_service_tools(connector, service).await {
            Ok(tools) => {
                info!(server = %service, count = tools.len(), "fetched tools");
                let service = Arc::new(service.clone());
                bindings.extend(
                    tools
                        .into_iter()
                        .map(|tool| ToolBinding::new(tool, Arc::clone(&service))),
                );
            }
            Err(CatalogError::Session(e)) if e.is_connection_refused() => {
                warn!(server = %service, "connection refused by MCP server, skipping");
            }
            Err(e) => {
                warn!(server = %service, error = %e, "failed to fetch tools from MCP server, skipping");
            }
        }
    }

    bindings
}
