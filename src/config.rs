//! Server registry: launch descriptors for stdio MCP servers.
//!
//! The configuration file follows the de-facto `mcpServers` layout:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "time": { "command": "uvx", "args": ["mcp-server-time"] },
//!     "files": { "command": "npx", "args": ["-y", "@modelcontextprotocol/server-filesystem", "/tmp"], "env": { "DEBUG": "1" } }
//!   }
//! }
//! ```

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable consulted for the configuration path.
pub const CONFIG_ENV_VAR: &str = "MCP_SERVERS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read MCP server config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed MCP server config: {0}")]
    Parse(String),
    #[error("invalid entry for MCP server '{server}': {message}")]
    InvalidEntry { server: String, message: String },
}

/// Everything needed to launch one backing MCP server.
///
/// `env` is `None` when the child should inherit the parent environment
/// unchanged; it is never `Some` of an empty map.
///
/// Equality covers the launch fields only; `name` is ignored.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Key of the entry under `mcpServers`. Only used to label log lines.
    #[serde(skip)]
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Option<HashMap<String, String>>,
}

impl ServiceDescriptor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            command: command.into(),
            args: Vec::new(),
            env: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add an environment override. The first override turns inheritance
    /// into "inherit plus overrides".
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

impl PartialEq for ServiceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.command == other.command && self.args == other.args && self.env == other.env
    }
}

impl Eq for ServiceDescriptor {}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.command)
        } else {
            write!(f, "{} {}", self.command, self.args.iter().join(" "))
        }
    }
}

/// Read the configuration path from [`CONFIG_ENV_VAR`]. Unset or empty
/// means "no servers configured".
pub fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Load service descriptors from a config file.
///
/// A missing or empty path yields no services; tool registration then
/// becomes a no-op.
pub fn load_services(path: Option<&Path>) -> Result<Vec<ServiceDescriptor>, ConfigError> {
    let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(Vec::new());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_services(&raw)
}

/// Parse service descriptors from an in-memory config document.
pub fn parse_services(raw: &str) -> Result<Vec<ServiceDescriptor>, ConfigError> {
    let document: Value =
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let Value::Object(mut root) = document else {
        return Err(ConfigError::Parse(
            "top-level value must be an object".to_string(),
        ));
    };

    let servers = match root.remove("mcpServers") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(servers)) => servers,
        Some(_) => {
            return Err(ConfigError::Parse(
                "`mcpServers` must be an object".to_string(),
            ))
        }
    };

    servers
        .into_iter()
        .map(|(name, entry)| parse_entry(name, entry))
        .collect()
}

fn parse_entry(name: String, entry: Value) -> Result<ServiceDescriptor, ConfigError> {
    let mut descriptor: ServiceDescriptor =
        serde_json::from_value(entry).map_err(|e| ConfigError::InvalidEntry {
            server: name.clone(),
            message: e.to_string(),
        })?;

    if descriptor.command.trim().is_empty() {
        return Err(ConfigError::InvalidEntry {
            server: name,
            message: "`command` must not be empty".to_string(),
        });
    }

    // Some transports read an empty map as "clear the environment".
    if descriptor.env.as_ref().is_some_and(HashMap::is_empty) {
        descriptor.env = None;
    }

    descriptor.name = name;
    Ok(descriptor)
}
