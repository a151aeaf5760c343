//! Sample controllers for Hypatia development and testing.
//!
//! Each controller comes with the metadata it registers with and, where it
//! keeps state, a store that tests can inspect.
//!
//! # Example
//!
//! ```
//! use hypatia_core::fixtures;
//! use hypatia_core::ControllerActivator;
//!
//! let metadata = fixtures::TestController::metadata();
//! assert!(metadata.method("Add").is_some());
//!
//! let factories = fixtures::factories();
//! assert!(factories.contains("PersonController"));
//! assert!(factories.create_instance("TestController", &Default::default()).is_ok());
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::activator::ControllerFactories;
use crate::controller::{Arguments, ConstructorArgs, Controller, Invocation};
use crate::crud::{ReadController, ReadWrite, WriteController, WriteOutcome};
use crate::metadata::{ControllerMetadata, MethodMetadata, ParameterMetadata, ResultMetadata};
use crate::response::ResponseInfo;
use crate::types::TypeDescriptor;

/// Arithmetic and echo operations, routed entirely by convention under
/// `/api/test`.
///
/// - `Add` - `GET /api/test/add?operandA=&operandB=`
/// - `GetGreeting` - `GET /api/test/greeting?name=`
/// - `GetEcho` - `GET /api/test/echo`, reads `X-Client`, answers in `X-Echo`
/// - `PostSum` - `POST /api/test/sum`, JSON array body
/// - `Fail` - `GET /api/test/fail`, always errors
#[derive(Debug, Default, Clone, Copy)]
pub struct TestController;

impl TestController {
    /// Registration metadata.
    #[must_use]
    pub fn metadata() -> ControllerMetadata {
        ControllerMetadata::builder("TestController")
            .method(
                MethodMetadata::builder("Add")
                    .param(ParameterMetadata::new("operandA", TypeDescriptor::integer()))
                    .param(ParameterMetadata::new("operandB", TypeDescriptor::integer()))
                    .returns(TypeDescriptor::integer())
                    .build(),
            )
            .method(
                MethodMetadata::builder("GetGreeting")
                    .param(ParameterMetadata::new("name", TypeDescriptor::string()))
                    .returns(TypeDescriptor::string())
                    .build(),
            )
            .method(
                MethodMetadata::builder("GetEcho")
                    .param(ParameterMetadata::new("client", TypeDescriptor::string()).header("X-Client"))
                    .result(ResultMetadata::new(TypeDescriptor::string()).header_target("X-Echo"))
                    .build(),
            )
            .method(
                MethodMetadata::builder("PostSum")
                    .param(
                        ParameterMetadata::new("values", TypeDescriptor::array(TypeDescriptor::integer()))
                            .body(),
                    )
                    .returns(TypeDescriptor::integer())
                    .build(),
            )
            .method(MethodMetadata::builder("Fail").build())
            .build()
    }
}

#[async_trait]
impl Controller for TestController {
    async fn invoke(
        &self,
        method: &str,
        arguments: Arguments,
        _response: &mut ResponseInfo,
    ) -> anyhow::Result<Invocation> {
        match method {
            "Add" => {
                let a: i64 = arguments.value("operandA")?;
                let b: i64 = arguments.value("operandB")?;
                Ok(Invocation::value(json!(a + b)))
            }
            "GetGreeting" => {
                let name: String = arguments.value("name")?;
                Ok(Invocation::value(json!(format!("Hello, {name}"))))
            }
            "GetEcho" => {
                let client: Option<String> = arguments.value("client")?;
                Ok(Invocation::value(json!(client.unwrap_or_default())))
            }
            "PostSum" => {
                let values: Vec<i64> = arguments.value("values")?;
                Ok(Invocation::value(json!(values.iter().sum::<i64>())))
            }
            "Fail" => anyhow::bail!("operation failed"),
            other => anyhow::bail!("TestController has no method '{other}'"),
        }
    }
}

/// A person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Display name, unique within a store.
    pub name: String,
}

/// In-memory person store keyed by sequential integers.
#[derive(Debug, Default)]
pub struct PersonStore {
    rows: Mutex<BTreeMap<i64, Person>>,
}

impl PersonStore {
    /// Returns the number of stored people.
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

#[async_trait]
impl ReadController for PersonStore {
    type Entity = Person;
    type Key = i64;

    fn entity_type() -> TypeDescriptor {
        TypeDescriptor::object("Person")
    }

    async fn list(&self) -> anyhow::Result<Vec<Person>> {
        Ok(self.rows.lock().values().cloned().collect())
    }

    async fn get(&self, key: i64) -> anyhow::Result<Option<Person>> {
        Ok(self.rows.lock().get(&key).cloned())
    }
}

#[async_trait]
impl WriteController for PersonStore {
    async fn create(&self, entity: Person) -> anyhow::Result<WriteOutcome<i64>> {
        let mut rows = self.rows.lock();
        if rows.values().any(|person| person.name == entity.name) {
            return Ok(WriteOutcome::Conflict);
        }
        let key = rows.keys().next_back().map_or(1, |last| last + 1);
        rows.insert(key, entity);
        Ok(WriteOutcome::Done(key))
    }

    async fn update(&self, key: i64, entity: Person) -> anyhow::Result<WriteOutcome> {
        let mut rows = self.rows.lock();
        match rows.get_mut(&key) {
            Some(row) => {
                *row = entity;
                Ok(WriteOutcome::Done(()))
            }
            None => Ok(WriteOutcome::NotFound),
        }
    }

    async fn delete(&self, key: i64) -> anyhow::Result<WriteOutcome> {
        Ok(match self.rows.lock().remove(&key) {
            Some(_) => WriteOutcome::Done(()),
            None => WriteOutcome::NotFound,
        })
    }
}

/// Metadata of the `PersonController`, a read/write controller over
/// [`PersonStore`] at `/api/person`.
#[must_use]
pub fn person_controller_metadata() -> ControllerMetadata {
    ReadWrite::<PersonStore>::metadata("PersonController")
}

/// Addresses of one person, nested under `/api/person/{personId}/address`.
///
/// `personId` is a controller route variable and reaches the controller
/// through its constructor arguments.
#[derive(Debug, Clone)]
pub struct AddressController {
    person_id: String,
}

impl AddressController {
    /// Registration metadata.
    #[must_use]
    pub fn metadata() -> ControllerMetadata {
        ControllerMetadata::builder("AddressController")
            .route("/api/person/{personId}/address")
            .method(
                MethodMetadata::builder("List")
                    .verb(Method::GET)
                    .route("")
                    .returns(TypeDescriptor::array(TypeDescriptor::string()))
                    .build(),
            )
            .build()
    }

    /// Creates the controller from its constructor arguments.
    pub fn from_args(args: &ConstructorArgs) -> anyhow::Result<Self> {
        let person_id = match args.get("personId") {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => anyhow::bail!("missing constructor argument 'personId'"),
        };
        Ok(Self { person_id })
    }
}

#[async_trait]
impl Controller for AddressController {
    async fn invoke(
        &self,
        method: &str,
        _arguments: Arguments,
        _response: &mut ResponseInfo,
    ) -> anyhow::Result<Invocation> {
        match method {
            "List" => Ok(Invocation::value(json!([format!(
                "person {} main street",
                self.person_id
            )]))),
            other => anyhow::bail!("AddressController has no method '{other}'"),
        }
    }
}

/// Joins any number of string body fields, in declaration order.
///
/// `POST /api/concat/join` with `count` body parameters named `field0`,
/// `field1` and so on.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcatController;

impl ConcatController {
    /// Registration metadata for a `Join` method taking `count` body fields.
    #[must_use]
    pub fn metadata(count: usize) -> ControllerMetadata {
        let join = (0..count).fold(
            MethodMetadata::builder("Join").verb(Method::POST),
            |method, index| {
                method.param(ParameterMetadata::new(format!("field{index}"), TypeDescriptor::string()).body())
            },
        );
        ControllerMetadata::builder("ConcatController")
            .method(join.returns(TypeDescriptor::string()).build())
            .build()
    }
}

#[async_trait]
impl Controller for ConcatController {
    async fn invoke(
        &self,
        method: &str,
        arguments: Arguments,
        _response: &mut ResponseInfo,
    ) -> anyhow::Result<Invocation> {
        if method != "Join" {
            anyhow::bail!("ConcatController has no method '{method}'");
        }
        let joined = arguments
            .iter()
            .map(|(_, value)| value.as_str().map_or_else(|| value.to_string(), str::to_string))
            .collect::<Vec<_>>()
            .join(",");
        Ok(Invocation::value(Value::String(joined)))
    }
}

/// Factories for every sample controller. The person store is shared, so
/// state survives between requests.
#[must_use]
pub fn factories() -> ControllerFactories {
    factories_with_store(Arc::new(ReadWrite(PersonStore::default())))
}

/// Like [`factories`], with a caller-provided person controller.
#[must_use]
pub fn factories_with_store(people: Arc<ReadWrite<PersonStore>>) -> ControllerFactories {
    let mut factories = ControllerFactories::new();
    factories.register_instance("TestController", Arc::new(TestController));
    factories.register_instance("ConcatController", Arc::new(ConcatController));
    factories.register_instance("PersonController", people);
    factories.register("AddressController", |args: &ConstructorArgs| {
        Ok(Arc::new(AddressController::from_args(args)?) as Arc<dyn Controller>)
    });
    factories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestInfo;
    use hypatia_url::UrlParserRegistry;

    fn response() -> ResponseInfo {
        let url = UrlParserRegistry::with_defaults().parse("/api/test").unwrap();
        ResponseInfo::new(Arc::new(RequestInfo::new(Method::GET, url)))
    }

    #[tokio::test]
    async fn test_add() {
        let mut arguments = Arguments::new();
        arguments.push("operandA", json!(1));
        arguments.push("operandB", json!(2));
        let invocation = TestController
            .invoke("Add", arguments, &mut response())
            .await
            .unwrap();
        assert_eq!(invocation.result(), &json!(3));
    }

    #[tokio::test]
    async fn test_concat_keeps_declaration_order() {
        let arguments: Arguments = [
            ("field0".to_string(), json!("a")),
            ("field1".to_string(), json!("b")),
        ]
        .into_iter()
        .collect();
        let invocation = ConcatController
            .invoke("Join", arguments, &mut response())
            .await
            .unwrap();
        assert_eq!(invocation.result(), &json!("a,b"));
        assert_eq!(ConcatController::metadata(3).methods()[0].parameters().len(), 3);
    }

    #[test]
    fn test_address_requires_person_id() {
        assert!(AddressController::from_args(&ConstructorArgs::new()).is_err());

        let mut args = ConstructorArgs::new();
        args.insert("personId".into(), json!("7"));
        assert_eq!(AddressController::from_args(&args).unwrap().person_id, "7");
    }
}
