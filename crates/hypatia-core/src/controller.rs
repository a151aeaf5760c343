//! Controller invocation contract.

use anyhow::Context as _;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::response::ResponseInfo;

/// Values of a controller's own route variables, passed to its activator.
pub type ConstructorArgs = IndexMap<String, Value>;

/// Bound input arguments of one invocation, in declaration order.
///
/// # Example
///
/// ```
/// use hypatia_core::Arguments;
/// use serde_json::json;
///
/// let mut arguments = Arguments::new();
/// arguments.push("operandA", json!(1));
/// arguments.push("operandB", json!(2));
///
/// let a: i64 = arguments.value("operandA").unwrap();
/// assert_eq!(a, 1);
/// assert_eq!(arguments.at(1), Some(&json!(2)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

impl Arguments {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Returns an argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns an argument by position.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get_index(index).map(|(_, value)| value)
    }

    /// Deserializes an argument. A missing argument reads as `null`, so
    /// `Option<T>` targets accept it.
    pub fn value<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<T> {
        let value = self.values.get(name).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).with_context(|| format!("argument '{name}'"))
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// What an operation produced: its return value and output parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    result: Value,
    outputs: IndexMap<String, Value>,
}

impl Invocation {
    /// A unit result.
    #[must_use]
    pub fn unit() -> Self {
        Self::default()
    }

    /// A result value.
    #[must_use]
    pub fn value(result: Value) -> Self {
        Self {
            result,
            outputs: IndexMap::new(),
        }
    }

    /// Serializes a result.
    pub fn from_serialize<T: Serialize>(result: &T) -> anyhow::Result<Self> {
        Ok(Self::value(
            serde_json::to_value(result).context("serializing operation result")?,
        ))
    }

    /// Adds an output parameter value.
    #[must_use]
    pub fn with_output(mut self, name: impl Into<String>, value: Value) -> Self {
        self.outputs.insert(name.into(), value);
        self
    }

    /// Returns the result value.
    #[must_use]
    pub fn result(&self) -> &Value {
        &self.result
    }

    /// Returns an output parameter value.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Returns all output parameters.
    #[must_use]
    pub fn outputs(&self) -> &IndexMap<String, Value> {
        &self.outputs
    }
}

/// A controller instance that executes operations by method name.
///
/// The response is handed over mutably; a controller that sets the status
/// or body itself keeps control of them and only headers are merged
/// afterwards.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use hypatia_core::{Arguments, Controller, Invocation, ResponseInfo};
/// use serde_json::json;
///
/// struct TestController;
///
/// #[async_trait]
/// impl Controller for TestController {
///     async fn invoke(
///         &self,
///         method: &str,
///         arguments: Arguments,
///         _response: &mut ResponseInfo,
///     ) -> anyhow::Result<Invocation> {
///         match method {
///             "Add" => {
///                 let a: i64 = arguments.value("operandA")?;
///                 let b: i64 = arguments.value("operandB")?;
///                 Ok(Invocation::value(json!(a + b)))
///             }
///             other => anyhow::bail!("unknown method {other}"),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Controller: Send + Sync {
    /// Invokes `method` with bound `arguments`.
    async fn invoke(
        &self,
        method: &str,
        arguments: Arguments,
        response: &mut ResponseInfo,
    ) -> anyhow::Result<Invocation>;
}
