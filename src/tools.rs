//! Host-facing tool registry and dispatch.

use async_trait::async_trait;
pub use rmcp::model::Tool;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::warn;

use crate::function::{SynthesizedFunction, ToolCallError};
use crate::signature::CallArgs;

/// Error type for tool dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Call(#[from] ToolCallError),
}

/// Entry point through which discovered functions are handed to the host,
/// one call per tool.
pub trait ToolRegistry: Send + Sync {
    fn register(&self, function: SynthesizedFunction);
}

impl<F> ToolRegistry for F
where
    F: Fn(SynthesizedFunction) + Send + Sync,
{
    fn register(&self, function: SynthesizedFunction) {
        self(function)
    }
}

/// Trait for tools that can be called by name.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// List available tools.
    async fn list_tools(&self) -> Result<Vec<Tool>, ToolError>;

    /// Execute a tool.
    async fn call_tool(&self, name: String, args: Value) -> Result<Value, ToolError>;
}

/// Registry of synthesized functions, filled once during registration and
/// read afterwards.
#[derive(Debug, Default)]
pub struct ToolBox {
    functions: RwLock<Vec<Arc<SynthesizedFunction>>>,
}

impl ToolBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Look up a function by name. If two servers offer the same name the
    /// first one registered wins.
    pub fn get(&self, name: &str) -> Option<Arc<SynthesizedFunction>> {
        self.read().iter().find(|f| f.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.read().iter().map(|f| f.name().to_string()).collect()
    }

    pub fn functions(&self) -> Vec<Arc<SynthesizedFunction>> {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<SynthesizedFunction>>> {
        self.functions.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ToolRegistry for ToolBox {
    fn register(&self, function: SynthesizedFunction) {
        let mut functions = self
            .functions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if functions.iter().any(|f| f.name() == function.name()) {
            warn!(
                tool = %function.name(),
                server = %function.service(),
                "tool name already registered by another server; lookups by name resolve to the first"
            );
        }
        functions.push(Arc::new(function));
    }
}

#[async_trait]
impl ToolService for ToolBox {
    async fn list_tools(&self) -> Result<Vec<Tool>, ToolError> {
        Ok(self.read().iter().map(|f| f.to_tool()).collect())
    }

    async fn call_tool(&self, name: String, args: Value) -> Result<Value, ToolError> {
        let function = self.get(&name).ok_or(ToolError::NotFound(name))?;
        Ok(function.invoke(CallArgs::from(args)).await?)
    }
}
