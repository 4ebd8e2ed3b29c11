//! Transport boundary: a duplex request/response channel to one MCP server.
//!
//! Framing and encoding live behind these traits. The rest of the crate only
//! ever opens a session, initializes it, issues one or two requests and
//! closes it again.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::ServiceDescriptor;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to spawn MCP server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("connection refused by MCP server '{server}'")]
    ConnectionRefused { server: String },
    #[error("MCP handshake with '{server}' failed: {message}")]
    Initialize { server: String, message: String },
    #[error("session used before initialize")]
    NotInitialized,
    #[error("session already closed")]
    Closed,
    #[error("MCP service error: {0}")]
    Service(String),
    #[error("failed to decode MCP response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SessionError {
    /// Build a spawn error, folding `ConnectionRefused` into its own variant.
    pub fn spawn(service: &ServiceDescriptor, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::ConnectionRefused {
            SessionError::ConnectionRefused {
                server: service.to_string(),
            }
        } else {
            SessionError::Spawn {
                server: service.to_string(),
                source,
            }
        }
    }

    pub fn is_connection_refused(&self) -> bool {
        matches!(self, SessionError::ConnectionRefused { .. })
    }
}

/// An open channel to one server.
///
/// `close` must be safe to call more than once and in any state.
#[async_trait]
pub trait Session: Send {
    /// Perform the protocol handshake.
    async fn initialize(&mut self) -> Result<(), SessionError>;

    /// Request the tool catalog. The raw response is returned; callers
    /// normalize its shape.
    async fn list_tools(&mut self) -> Result<Value, SessionError>;

    /// Call one tool with a bound argument mapping.
    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, SessionError>;

    /// Release the channel and the child process behind it.
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Opens sessions to servers described by a [`ServiceDescriptor`].
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, service: &ServiceDescriptor) -> Result<Box<dyn Session>, SessionError>;
}
