//! Discovery-to-registration pipeline.
//!
//! The host calls [`register_tools`] from a synchronous hook. That hook may
//! run on a plain thread or from inside an already running tokio runtime, so
//! the driver picks how to execute the async pipeline at call time:
//!
//! | caller context              | strategy                                  |
//! |-----------------------------|-------------------------------------------|
//! | no runtime                  | build a current-thread runtime and block  |
//! | multi-thread runtime        | `block_in_place` + `Handle::block_on`     |
//! | current-thread runtime      | spawn onto it, return the join handle     |
//!
//! In the last case registration finishes *after* `register_tools` has
//! returned. Tools called immediately afterwards may not be registered yet;
//! await the returned handle before relying on them.

use std::path::Path;
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::fetch_all_tools;
use crate::config::{config_path_from_env, load_services, ConfigError, ServiceDescriptor};
use crate::function::SynthesizedFunction;
use crate::session::Connector;
use crate::tools::ToolRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationPhase {
    NotStarted,
    Fetching,
    Registering,
    Done,
}

/// How a synchronous [`register_tools`] call was carried out.
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// Registration ran to completion before returning.
    Completed { registered: usize },
    /// A current-thread runtime was already active; registration was
    /// spawned onto it and finishes when the handle resolves.
    Scheduled(JoinHandle<usize>),
    /// No runtime could be started or attached to. Nothing was registered.
    Abandoned,
}

/// Runs catalog fetching and function synthesis for a fixed set of servers.
pub struct Registrar {
    services: Vec<ServiceDescriptor>,
    connector: Arc<dyn Connector>,
    phase: RegistrationPhase,
}

impl Registrar {
    pub fn new(services: Vec<ServiceDescriptor>, connector: Arc<dyn Connector>) -> Self {
        Self {
            services,
            connector,
            phase: RegistrationPhase::NotStarted,
        }
    }

    /// Load servers from a config file. See [`load_services`].
    pub fn from_config(
        path: Option<&Path>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(load_services(path)?, connector))
    }

    /// Load servers from the file named by `MCP_SERVERS_CONFIG`.
    pub fn from_env(connector: Arc<dyn Connector>) -> Result<Self, ConfigError> {
        Self::from_config(config_path_from_env().as_deref(), connector)
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    pub fn phase(&self) -> RegistrationPhase {
        self.phase
    }

    /// Discover every tool and hand one function per tool to `registry`.
    /// Returns the number of functions registered.
    pub async fn run<R: ToolRegistry + ?Sized>(&mut self, registry: &R) -> usize {
        self.phase = RegistrationPhase::Fetching;
        debug!(servers = self.services.len(), "fetching MCP tool catalogs");
        let bindings = fetch_all_tools(self.connector.as_ref(), &self.services).await;

        self.phase = RegistrationPhase::Registering;
        if bindings.is_empty() {
            info!("no tools found or all MCP servers failed to connect");
        }

        let mut registered = 0;
        for binding in bindings {
            let function = SynthesizedFunction::new(binding, Arc::clone(&self.connector));
            info!(
                tool = %function.name(),
                signature = %function.signature(),
                server = %function.service(),
                "registered tool"
            );
            registry.register(function);
            registered += 1;
        }

        self.phase = RegistrationPhase::Done;
        registered
    }
}

/// Run `registrar` from a synchronous context, whatever runtime (if any)
/// the caller is on.
pub fn register_tools<R>(mut registrar: Registrar, registry: Arc<R>) -> RegistrationOutcome
where
    R: ToolRegistry + 'static,
{
    let Ok(handle) = Handle::try_current() else {
        return match Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => {
                let registered = runtime.block_on(registrar.run(registry.as_ref()));
                RegistrationOutcome::Completed { registered }
            }
            Err(e) => {
                warn!(error = %e, "could not start a runtime; MCP tools will not be registered");
                RegistrationOutcome::Abandoned
            }
        };
    };

    match handle.runtime_flavor() {
        RuntimeFlavor::MultiThread => {
            debug!("runtime already active, blocking in place");
            let registered = tokio::task::block_in_place(|| {
                handle.block_on(registrar.run(registry.as_ref()))
            });
            RegistrationOutcome::Completed { registered }
        }
        _ => {
            warn!(
                "current-thread runtime already active; registration scheduled and may complete after this call returns"
            );
            let task = handle.spawn(async move { registrar.run(registry.as_ref()).await });
            RegistrationOutcome::Scheduled(task)
        }
    }
}
