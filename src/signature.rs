//! Call signatures derived from a tool's JSON input schema.
//!
//! A [`Signature`] is an ordered list of parameters, each either required or
//! carrying a default. Every parameter may be bound positionally or by name,
//! following the usual positional-then-named rules.

use itertools::Itertools;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::catalog::ToolDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("takes {expected} positional arguments but {given} were given")]
    TooManyPositional { expected: usize, given: usize },
    #[error("got an unexpected argument '{0}'")]
    UnexpectedArgument(String),
    #[error("got multiple values for argument '{0}'")]
    MultipleValues(String),
    #[error("missing a required argument: '{0}'")]
    MissingArgument(String),
}

/// One synthesized parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// `None` for required parameters.
    pub default: Option<Value>,
}

impl Parameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Derive a parameter from one entry of a schema's `properties`.
    pub fn from_property(name: &str, property: &Value) -> Self {
        match property.get("default") {
            Some(default) => Parameter::optional(name, default.clone()),
            None if is_nullable(property) => Parameter::optional(name, Value::Null),
            None => Parameter::required(name),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(default) => write!(f, "{}={}", self.name, default),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A type union is nullable when one of its members is `null`.
fn is_nullable(property: &Value) -> bool {
    let union_has_null = |key: &str| {
        property
            .get(key)
            .and_then(Value::as_array)
            .is_some_and(|variants| {
                variants
                    .iter()
                    .any(|variant| variant.get("type").and_then(Value::as_str) == Some("null"))
            })
    };

    let type_list_has_null = property
        .get("type")
        .and_then(Value::as_array)
        .is_some_and(|types| types.iter().any(|t| t.as_str() == Some("null")));

    union_has_null("anyOf") || union_has_null("oneOf") || type_list_has_null
}

/// Ordered parameter list for one tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Parameter>,
}

impl Signature {
    pub fn new(params: Vec<Parameter>) -> Self {
        Self { params }
    }

    /// Build a signature from a JSON schema object. Schemas without an
    /// object-valued `properties` have no parameters.
    pub fn from_schema(schema: &Map<String, Value>) -> Self {
        let params = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .map(|(name, property)| Parameter::from_property(name, property))
                    .collect()
            })
            .unwrap_or_default();
        Self { params }
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Bind call arguments and fill in defaults.
    ///
    /// The returned mapping lists parameters in signature order.
    pub fn bind(&self, args: CallArgs) -> Result<Map<String, Value>, BindError> {
        let CallArgs {
            positional,
            mut named,
        } = args;

        if positional.len() > self.params.len() {
            return Err(BindError::TooManyPositional {
                expected: self.params.len(),
                given: positional.len(),
            });
        }

        if let Some(unknown) = named.keys().find(|key| self.get(key).is_none()) {
            return Err(BindError::UnexpectedArgument(unknown.clone()));
        }

        let mut positional = positional.into_iter();
        let mut bound = Map::new();
        for param in &self.params {
            let value = match (positional.next(), named.remove(&param.name)) {
                (Some(_), Some(_)) => return Err(BindError::MultipleValues(param.name.clone())),
                (Some(value), None) | (None, Some(value)) => value,
                (None, None) => match &param.default {
                    Some(default) => default.clone(),
                    None => return Err(BindError::MissingArgument(param.name.clone())),
                },
            };
            bound.insert(param.name.clone(), value);
        }

        Ok(bound)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.params.iter().join(", "))
    }
}

/// Synthesize the call signature of a tool.
pub fn synthesize(tool: &ToolDescriptor) -> Signature {
    Signature::from_schema(&tool.input_schema)
}

/// Arguments supplied by a caller, before binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub named: Map<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a named argument.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }
}

impl From<Map<String, Value>> for CallArgs {
    fn from(named: Map<String, Value>) -> Self {
        Self {
            positional: Vec::new(),
            named,
        }
    }
}

impl From<Vec<Value>> for CallArgs {
    fn from(positional: Vec<Value>) -> Self {
        Self {
            positional,
            named: Map::new(),
        }
    }
}

/// Objects bind by name, arrays by position, `null` binds nothing and any
/// other scalar is a single positional argument.
impl From<Value> for CallArgs {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(named) => named.into(),
            Value::Array(positional) => positional.into(),
            Value::Null => CallArgs::new(),
            scalar => CallArgs::new().arg(scalar),
        }
    }
}
