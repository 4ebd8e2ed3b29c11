//! [`Connector`] backed by `rmcp` over a child process's stdin/stdout.

use async_trait::async_trait;
use rmcp::model::CallToolRequestParam;
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::TokioChildProcess;
use rmcp::ServiceExt;
use serde_json::{json, Map, Value};
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ServiceDescriptor;
use crate::session::{Connector, Session, SessionError};

/// Launches each server as a child process speaking MCP over stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdioConnector;

impl StdioConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for StdioConnector {
    async fn connect(&self, service: &ServiceDescriptor) -> Result<Box<dyn Session>, SessionError> {
        let mut command = Command::new(&service.command);
        command.args(&service.args);
        if let Some(env) = &service.env {
            command.envs(env);
        }

        let transport =
            TokioChildProcess::new(command).map_err(|e| SessionError::spawn(service, e))?;

        let session = StdioSession {
            id: Uuid::new_v4(),
            server: service.to_string(),
            state: State::Spawned(transport),
        };
        debug!(session = %session.id, server = %session.server, "spawned MCP server");
        Ok(Box::new(session))
    }
}

enum State {
    Spawned(TokioChildProcess),
    Running(RunningService<RoleClient, ()>),
    Closed,
}

struct StdioSession {
    id: Uuid,
    server: String,
    state: State,
}

impl StdioSession {
    fn running(&self) -> Result<&RunningService<RoleClient, ()>, SessionError> {
        match &self.state {
            State::Running(service) => Ok(service),
            State::Spawned(_) => Err(SessionError::NotInitialized),
            State::Closed => Err(SessionError::Closed),
        }
    }
}

#[async_trait]
impl Session for StdioSession {
    async fn initialize(&mut self) -> Result<(), SessionError> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Spawned(transport) => {
                let service = ().serve(transport).await.map_err(|e| SessionError::Initialize {
                    server: self.server.clone(),
                    message: e.to_string(),
                })?;
                debug!(session = %self.id, server = %self.server, "MCP session initialized");
                self.state = State::Running(service);
                Ok(())
            }
            State::Running(service) => {
                self.state = State::Running(service);
                Ok(())
            }
            State::Closed => Err(SessionError::Closed),
        }
    }

    async fn list_tools(&mut self) -> Result<Value, SessionError> {
        let tools = self
            .running()?
            .list_all_tools()
            .await
            .map_err(|e| SessionError::Service(e.to_string()))?;
        Ok(json!({ "tools": tools }))
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, SessionError> {
        let params = CallToolRequestParam {
            name: name.to_string().into(),
            arguments: Some(arguments),
        };
        let result = self
            .running()?
            .call_tool(params)
            .await
            .map_err(|e| SessionError::Service(e.to_string()))?;
        Ok(serde_json::to_value(result)?)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Running(service) => {
                let reason = service.cancel().await.map_err(|e| {
                    warn!(session = %self.id, server = %self.server, error = %e, "MCP session did not shut down cleanly");
                    SessionError::Service(e.to_string())
                })?;
                debug!(session = %self.id, server = %self.server, ?reason, "MCP session closed");
            }
            // Dropping the transport kills the child.
            State::Spawned(transport) => drop(transport),
            State::Closed => {}
        }
        Ok(())
    }
}
