//! Locally callable functions backed by a remote MCP tool.

use itertools::Itertools;
use rmcp::model::Tool;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::ToolBinding;
use crate::config::ServiceDescriptor;
use crate::session::{Connector, Session, SessionError};
use crate::signature::{synthesize, BindError, CallArgs, Signature};

/// The supplied arguments do not fit the function's signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("argument mismatch for {function}{signature}: {reason}")]
pub struct ArgumentError {
    pub function: String,
    pub signature: String,
    #[source]
    pub reason: BindError,
}

/// The tool call itself failed.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("calling tool '{tool}' on '{server}' failed: {source}")]
    Transport {
        tool: String,
        server: String,
        #[source]
        source: SessionError,
    },
    #[error("tool '{tool}' on '{server}' reported an error: {message}")]
    Remote {
        tool: String,
        server: String,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// A remote tool exposed as a function with a synthesized signature.
///
/// No session is kept between calls: every [`invoke`](Self::invoke) opens a
/// fresh one to the server the tool was discovered on and closes it before
/// returning.
#[derive(Clone)]
pub struct SynthesizedFunction {
    binding: ToolBinding,
    signature: Signature,
    connector: Arc<dyn Connector>,
}

impl std::fmt::Debug for SynthesizedFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesizedFunction")
            .field("name", &self.name())
            .field("signature", &self.signature.to_string())
            .field("server", &self.binding.service.to_string())
            .finish()
    }
}

impl SynthesizedFunction {
    pub fn new(binding: ToolBinding, connector: Arc<dyn Connector>) -> Self {
        let signature = synthesize(&binding.tool);
        Self {
            binding,
            signature,
            connector,
        }
    }

    pub fn name(&self) -> &str {
        &self.binding.tool.name
    }

    pub fn description(&self) -> &str {
        self.binding.tool.description.as_deref().unwrap_or_default()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn input_schema(&self) -> &Map<String, Value> {
        &self.binding.tool.input_schema
    }

    pub fn service(&self) -> &ServiceDescriptor {
        &self.binding.service
    }

    pub fn binding(&self) -> &ToolBinding {
        &self.binding
    }

    /// Describe this function as an MCP tool for hosts that dispatch on
    /// JSON schemas.
    pub fn to_tool(&self) -> Tool {
        Tool::new(
            self.name().to_string(),
            self.description().to_string(),
            Arc::new(self.input_schema().clone()),
        )
    }

    /// Bind `args` against the signature and apply defaults, without
    /// calling anything.
    pub fn bind(&self, args: CallArgs) -> Result<Map<String, Value>, ArgumentError> {
        self.signature.bind(args).map_err(|reason| ArgumentError {
            function: self.name().to_string(),
            signature: self.signature.to_string(),
            reason,
        })
    }

    /// Call the remote tool.
    ///
    /// Returns the `content` payload of the response when present, the raw
    /// response otherwise.
    pub async fn invoke(&self, args: CallArgs) -> Result<Value, ToolCallError> {
        let arguments = self.bind(args)?;
        debug!(tool = %self.name(), server = %self.service(), ?arguments, "calling tool");

        let mut session = self
            .connector
            .connect(self.service())
            .await
            .map_err(|e| self.transport_error(e))?;

        let outcome = call_once(session.as_mut(), self.name(), arguments).await;
        if let Err(e) = session.close().await {
            warn!(tool = %self.name(), server = %self.service(), error = %e, "failed to close MCP session");
        }

        let response = outcome.map_err(|e| self.transport_error(e))?;
        Ok(self.unwrap_response(response)?)
    }

    fn transport_error(&self, source: SessionError) -> ExecutionError {
        ExecutionError::Transport {
            tool: self.name().to_string(),
            server: self.service().to_string(),
            source,
        }
    }

    fn unwrap_response(&self, response: Value) -> Result<Value, ExecutionError> {
        let Value::Object(mut object) = response else {
            return Ok(response);
        };

        let is_error = object
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        match object.remove("content") {
            Some(content) if is_error => Err(ExecutionError::Remote {
                tool: self.name().to_string(),
                server: self.service().to_string(),
                message: content_text(&content),
            }),
            Some(content) => Ok(content),
            None if is_error => Err(ExecutionError::Remote {
                tool: self.name().to_string(),
                server: self.service().to_string(),
                message: "no details".to_string(),
            }),
            None => Ok(Value::Object(object)),
        }
    }
}

async fn call_once(
    session: &mut dyn Session,
    name: &str,
    arguments: Map<String, Value>,
) -> Result<Value, SessionError> {
    session.initialize().await?;
    session.call_tool(name, arguments).await
}

/// Collapse the text blocks of a content payload into one message.
fn content_text(content: &Value) -> String {
    let text = content
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .join("\n");

    if text.is_empty() {
        content.to_string()
    } else {
        text
    }
}
