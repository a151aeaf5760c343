//! Typed read and read/write controllers.
//!
//! [`ReadController`] and [`WriteController`] describe an entity store in
//! plain Rust types. Wrapping an implementation in [`ReadOnly`] or
//! [`ReadWrite`] turns it into a [`Controller`] whose methods follow the CRUD
//! conventions declared by [`ControllerMetadataBuilder::read`] and
//! [`ControllerMetadataBuilder::read_write`].
//!
//! [`ControllerMetadataBuilder::read`]: crate::ControllerMetadataBuilder::read
//! [`ControllerMetadataBuilder::read_write`]: crate::ControllerMetadataBuilder::read_write

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::controller::{Arguments, Controller, Invocation};
use crate::metadata::{ControllerMetadata, CrudRole};
use crate::response::ResponseInfo;
use crate::types::TypeDescriptor;

/// Outcome of a write operation.
///
/// Maps onto the `Option<bool>` result convention: `Done` is `true`,
/// `Conflict` is `false` and `NotFound` is `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome<K = ()> {
    /// The write happened; carries the entity key for creates.
    Done(K),
    /// The write conflicts with existing state.
    Conflict,
    /// The target entity does not exist.
    NotFound,
}

/// A store that lists entities and fetches them by key.
#[async_trait]
pub trait ReadController: Send + Sync + 'static {
    /// The entity type.
    type Entity: Serialize + DeserializeOwned + Send + Sync;
    /// The key type.
    type Key: Serialize + DeserializeOwned + Send + Sync;

    /// Declared entity type.
    fn entity_type() -> TypeDescriptor;

    /// Declared key type.
    fn key_type() -> TypeDescriptor {
        TypeDescriptor::integer()
    }

    /// Returns every entity.
    async fn list(&self) -> anyhow::Result<Vec<Self::Entity>>;

    /// Returns one entity, `None` when it does not exist.
    async fn get(&self, key: Self::Key) -> anyhow::Result<Option<Self::Entity>>;
}

/// A store that also creates, updates and deletes entities.
#[async_trait]
pub trait WriteController: ReadController {
    /// Stores a new entity and returns its key.
    async fn create(&self, entity: Self::Entity) -> anyhow::Result<WriteOutcome<Self::Key>>;

    /// Replaces an entity.
    async fn update(&self, key: Self::Key, entity: Self::Entity) -> anyhow::Result<WriteOutcome>;

    /// Removes an entity.
    async fn delete(&self, key: Self::Key) -> anyhow::Result<WriteOutcome>;
}

/// Exposes a [`ReadController`] as a [`Controller`].
#[derive(Debug, Clone)]
pub struct ReadOnly<C>(pub C);

impl<C: ReadController> ReadOnly<C> {
    /// Builds the metadata for this controller under `type_name`.
    #[must_use]
    pub fn metadata(type_name: impl Into<String>) -> ControllerMetadata {
        ControllerMetadata::builder(type_name)
            .read(C::entity_type(), C::key_type())
            .build()
    }
}

/// Exposes a [`WriteController`] as a [`Controller`].
#[derive(Debug, Clone)]
pub struct ReadWrite<C>(pub C);

impl<C: WriteController> ReadWrite<C> {
    /// Builds the metadata for this controller under `type_name`.
    #[must_use]
    pub fn metadata(type_name: impl Into<String>) -> ControllerMetadata {
        ControllerMetadata::builder(type_name)
            .read_write(C::entity_type(), C::key_type())
            .build()
    }
}

fn role_of(method: &str) -> Option<CrudRole> {
    [
        CrudRole::List,
        CrudRole::Get,
        CrudRole::Create,
        CrudRole::Update,
        CrudRole::Delete,
    ]
    .into_iter()
    .find(|role| role.method_name() == method)
}

fn outcome_value<K>(outcome: &WriteOutcome<K>) -> Value {
    match outcome {
        WriteOutcome::Done(_) => Value::Bool(true),
        WriteOutcome::Conflict => Value::Bool(false),
        WriteOutcome::NotFound => Value::Null,
    }
}

async fn invoke_read<C: ReadController>(
    controller: &C,
    role: CrudRole,
    arguments: &Arguments,
) -> anyhow::Result<Invocation> {
    match role {
        CrudRole::List => Invocation::from_serialize(&controller.list().await?),
        CrudRole::Get => {
            let key = arguments.value("id")?;
            Invocation::from_serialize(&controller.get(key).await?)
        }
        other => anyhow::bail!(
            "'{}' is not supported by a read controller",
            other.method_name()
        ),
    }
}

fn role_for(method: &str) -> anyhow::Result<CrudRole> {
    role_of(method).ok_or_else(|| anyhow::anyhow!("unknown method '{method}'"))
}

#[async_trait]
impl<C: ReadController> Controller for ReadOnly<C> {
    async fn invoke(
        &self,
        method: &str,
        arguments: Arguments,
        _response: &mut ResponseInfo,
    ) -> anyhow::Result<Invocation> {
        invoke_read(&self.0, role_for(method)?, &arguments).await
    }
}

#[async_trait]
impl<C: WriteController> Controller for ReadWrite<C> {
    async fn invoke(
        &self,
        method: &str,
        arguments: Arguments,
        _response: &mut ResponseInfo,
    ) -> anyhow::Result<Invocation> {
        match role_for(method)? {
            role @ (CrudRole::List | CrudRole::Get) => {
                invoke_read(&self.0, role, &arguments).await
            }
            CrudRole::Create => {
                let outcome = self.0.create(arguments.value("entity")?).await?;
                let invocation = Invocation::value(outcome_value(&outcome));
                Ok(match outcome {
                    WriteOutcome::Done(key) => {
                        invocation.with_output("id", serde_json::to_value(key)?)
                    }
                    _ => invocation,
                })
            }
            CrudRole::Update => {
                let outcome = self
                    .0
                    .update(arguments.value("id")?, arguments.value("entity")?)
                    .await?;
                Ok(Invocation::value(outcome_value(&outcome)))
            }
            CrudRole::Delete => {
                let outcome = self.0.delete(arguments.value("id")?).await?;
                Ok(Invocation::value(outcome_value(&outcome)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestInfo;
    use http::Method;
    use hypatia_url::UrlParserRegistry;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Person {
        name: String,
    }

    #[derive(Default)]
    struct People {
        rows: Mutex<BTreeMap<i64, Person>>,
    }

    #[async_trait]
    impl ReadController for People {
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
    impl WriteController for People {
        async fn create(&self, entity: Person) -> anyhow::Result<WriteOutcome<i64>> {
            let mut rows = self.rows.lock();
            if rows.values().any(|p| p.name == entity.name) {
                return Ok(WriteOutcome::Conflict);
            }
            let key = rows.keys().last().copied().unwrap_or(0) + 1;
            rows.insert(key, entity);
            Ok(WriteOutcome::Done(key))
        }

        async fn update(&self, key: i64, entity: Person) -> anyhow::Result<WriteOutcome> {
            match self.rows.lock().get_mut(&key) {
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

    fn response() -> ResponseInfo {
        let url = UrlParserRegistry::with_defaults().parse("/api/person").unwrap();
        ResponseInfo::new(Arc::new(RequestInfo::new(Method::POST, url)))
    }

    fn args(pairs: &[(&str, Value)]) -> Arguments {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_then_conflict() {
        let controller = ReadWrite(People::default());
        let entity = json!({"name": "Jan"});

        let created = controller
            .invoke("Create", args(&[("entity", entity.clone())]), &mut response())
            .await
            .unwrap();
        assert_eq!(created.result(), &json!(true));
        assert_eq!(created.output("id"), Some(&json!(1)));

        let conflict = controller
            .invoke("Create", args(&[("entity", entity)]), &mut response())
            .await
            .unwrap();
        assert_eq!(conflict.result(), &json!(false));
        assert!(conflict.output("id").is_none());
    }

    #[tokio::test]
    async fn test_get_missing_is_null() {
        let controller = ReadWrite(People::default());
        let found = controller
            .invoke("Get", args(&[("id", json!(9))]), &mut response())
            .await
            .unwrap();
        assert_eq!(found.result(), &Value::Null);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_are_null() {
        let controller = ReadWrite(People::default());
        let updated = controller
            .invoke(
                "Update",
                args(&[("id", json!(3)), ("entity", json!({"name": "Ola"}))]),
                &mut response(),
            )
            .await
            .unwrap();
        assert_eq!(updated.result(), &Value::Null);

        let deleted = controller
            .invoke("Delete", args(&[("id", json!(3))]), &mut response())
            .await
            .unwrap();
        assert_eq!(deleted.result(), &Value::Null);
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let controller = ReadOnly(People::default());
        let err = controller
            .invoke("Delete", args(&[("id", json!(1))]), &mut response())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_metadata() {
        let metadata = ReadWrite::<People>::metadata("PersonController");
        assert_eq!(metadata.methods().len(), 5);
        assert_eq!(
            metadata.method("Get").unwrap().result().ty(),
            &TypeDescriptor::optional(TypeDescriptor::object("Person"))
        );
        assert_eq!(ReadOnly::<People>::metadata("PersonController").methods().len(), 2);
    }
}
