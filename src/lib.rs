//! # mcp-toolbridge
//!
//! Discover the tools exposed by stdio MCP servers and expose each one as a
//! locally callable function whose signature is derived from the tool's
//! JSON input schema.
//!
//! ## Pipeline
//!
//! 1. **Config**: `mcpServers` entries become [`ServiceDescriptor`]s.
//! 2. **Catalog**: each server is started, asked for its tools and shut
//!    down again. A server that fails contributes no tools.
//! 3. **Signature**: each tool's `inputSchema.properties` becomes an ordered
//!    parameter list; properties with a `default` or a nullable type are
//!    optional.
//! 4. **Invocation**: a [`SynthesizedFunction`] binds positional/named
//!    arguments, starts a fresh session to its server and calls the tool.
//! 5. **Registration**: [`register_tools`] drives the above and hands every
//!    function to a [`ToolRegistry`].
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use mcp_toolbridge::{register_tools, Registrar, StdioConnector, ToolBox};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registrar = Registrar::from_env(Arc::new(StdioConnector::new()))?;
//!     let toolbox = Arc::new(ToolBox::new());
//!     register_tools(registrar, toolbox.clone());
//!     println!("{:?}", toolbox.names());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod function;
pub mod registration;
pub mod session;
pub mod signature;
pub mod stdio;
pub mod tools;

pub use catalog::{fetch_all_tools, CatalogError, ToolBinding, ToolDescriptor};
pub use config::{load_services, ConfigError, ServiceDescriptor};
pub use function::{ArgumentError, ExecutionError, SynthesizedFunction, ToolCallError};
pub use registration::{register_tools, Registrar, RegistrationOutcome, RegistrationPhase};
pub use session::{Connector, Session, SessionError};
pub use signature::{synthesize, BindError, CallArgs, Parameter, Signature};
pub use stdio::StdioConnector;
pub use tools::{Tool, ToolBox, ToolError, ToolRegistry, ToolService};

// Re-export rmcp for convenience
pub use rmcp;
