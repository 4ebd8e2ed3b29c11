#![allow(dead_code)]

use async_trait::async_trait;
use mcp_toolbridge::{Connector, ServiceDescriptor, Session, SessionError};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What a mock server does when asked for something.
#[derive(Clone)]
pub enum MockServer {
    /// `connect` fails with a refusal.
    Refuse,
    /// `connect` works, `list_tools` returns this value verbatim.
    Catalog(Value),
    /// `connect` works, `list_tools` fails.
    BrokenCatalog,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connected { server: String, session: usize },
    Initialized { session: usize },
    Listed { session: usize },
    Called { session: usize, tool: String, arguments: Map<String, Value> },
    Closed { session: usize },
}

#[derive(Clone, Default)]
pub struct MockConnector {
    servers: Arc<Mutex<HashMap<String, MockServer>>>,
    call_results: Arc<Mutex<HashMap<String, Result<Value, String>>>>,
    events: Arc<Mutex<Vec<Event>>>,
    next_session: Arc<Mutex<usize>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(self, command: &str, server: MockServer) -> Self {
        self.servers.lock().unwrap().insert(command.to_string(), server);
        self
    }

    /// Response returned by `call_tool` for `tool`. `Err` is a transport
    /// failure. Tools without an entry echo their arguments inside a text
    /// content block.
    pub fn with_call_result(self, tool: &str, result: Result<Value, String>) -> Self {
        self.call_results.lock().unwrap().insert(tool.to_string(), result);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Called { tool, arguments, .. } => Some((tool, arguments)),
                _ => None,
            })
            .collect()
    }

    pub fn opened(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Connected { session, .. } => Some(session),
                _ => None,
            })
            .collect()
    }

    pub fn closed(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Closed { session } => Some(session),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, service: &ServiceDescriptor) -> Result<Box<dyn Session>, SessionError> {
        let server = self
            .servers
            .lock()
            .unwrap()
            .get(&service.command)
            .cloned()
            .ok_or_else(|| SessionError::spawn(service, std::io::ErrorKind::NotFound.into()))?;

        if let MockServer::Refuse = server {
            return Err(SessionError::spawn(
                service,
                std::io::ErrorKind::ConnectionRefused.into(),
            ));
        }

        let session = {
            let mut next = self.next_session.lock().unwrap();
            *next += 1;
            *next
        };
        self.events.lock().unwrap().push(Event::Connected {
            server: service.command.clone(),
            session,
        });

        Ok(Box::new(MockSession {
            id: session,
            server,
            initialized: false,
            closed: false,
            call_results: self.call_results.clone(),
            events: self.events.clone(),
        }))
    }
}

struct MockSession {
    id: usize,
    server: MockServer,
    initialized: bool,
    closed: bool,
    call_results: Arc<Mutex<HashMap<String, Result<Value, String>>>>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl MockSession {
    fn ready(&self) -> Result<(), SessionError> {
        if self.closed {
            Err(SessionError::Closed)
        } else if !self.initialized {
            Err(SessionError::NotInitialized)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Session for MockSession {
    async fn initialize(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        self.initialized = true;
        self.events
            .lock()
            .unwrap()
            .push(Event::Initialized { session: self.id });
        Ok(())
    }

    async fn list_tools(&mut self) -> Result<Value, SessionError> {
        self.ready()?;
        self.events
            .lock()
            .unwrap()
            .push(Event::Listed { session: self.id });
        match &self.server {
            MockServer::Catalog(catalog) => Ok(catalog.clone()),
            _ => Err(SessionError::Service("tools/list failed".to_string())),
        }
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, SessionError> {
        self.ready()?;
        self.events.lock().unwrap().push(Event::Called {
            session: self.id,
            tool: name.to_string(),
            arguments: arguments.clone(),
        });
        match self.call_results.lock().unwrap().get(name).cloned() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(SessionError::Service(message)),
            None => Ok(json!({
                "content": [{ "type": "text", "text": Value::Object(arguments).to_string() }],
                "isError": false
            })),
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if !self.closed {
            self.closed = true;
            self.events
                .lock()
                .unwrap()
                .push(Event::Closed { session: self.id });
        }
        Ok(())
    }
}

/// Catalog of a server offering `add(a: int, b: int = 0)`.
pub fn add_catalog() -> Value {
    json!({
        "tools": [{
            "name": "add",
            "description": "Add two integers",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "a": { "type": "integer" },
                    "b": { "type": "integer", "default": 0 }
                },
                "required": ["a"]
            }
        }]
    })
}

pub fn tool(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name} tool"),
        "inputSchema": { "type": "object", "properties": {} }
    })
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
