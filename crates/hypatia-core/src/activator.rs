//! Controller activation.
//!
//! Controllers are created per request by a [`ControllerActivator`], which
//! receives the controller type name and the values of the controller's own
//! route variables. [`ControllerFactories`] is the in-process implementation:
//! a map from type name to factory closure, filled at startup.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use hypatia_core::{
//!     Arguments, ConstructorArgs, Controller, ControllerActivator, ControllerFactories,
//!     Invocation, ResponseInfo,
//! };
//!
//! struct AddressController {
//!     person_id: i64,
//! }
//!
//! #[async_trait]
//! impl Controller for AddressController {
//!     async fn invoke(&self, _: &str, _: Arguments, _: &mut ResponseInfo) -> anyhow::Result<Invocation> {
//!         Ok(Invocation::value(self.person_id.into()))
//!     }
//! }
//!
//! let mut factories = ControllerFactories::new();
//! factories.register("AddressController", |args: &ConstructorArgs| {
//!     let person_id = args.get("personId").and_then(|v| v.as_i64()).unwrap_or_default();
//!     Ok(Arc::new(AddressController { person_id }) as Arc<dyn Controller>)
//! });
//!
//! let mut args = ConstructorArgs::new();
//! args.insert("personId".into(), 7.into());
//! assert!(factories.create_instance("AddressController", &args).is_ok());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::controller::{ConstructorArgs, Controller};
use crate::error::ActivationError;

/// Creates controller instances.
pub trait ControllerActivator: Send + Sync {
    /// Creates an instance of `type_name`.
    fn create_instance(
        &self,
        type_name: &str,
        constructor_args: &ConstructorArgs,
    ) -> Result<Arc<dyn Controller>, ActivationError>;
}

type Factory = Arc<dyn Fn(&ConstructorArgs) -> anyhow::Result<Arc<dyn Controller>> + Send + Sync>;

/// Factory closures keyed by controller type name.
///
/// Registered once at startup and shared read-only between requests.
#[derive(Default, Clone)]
pub struct ControllerFactories {
    factories: HashMap<String, Factory>,
}

impl ControllerFactories {
    /// Creates an empty set of factories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory. A later registration for the same name replaces
    /// the earlier one.
    pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&ConstructorArgs) -> anyhow::Result<Arc<dyn Controller>> + Send + Sync + 'static,
    {
        self.factories.insert(type_name.into(), Arc::new(factory));
    }

    /// Registers a shared instance returned for every request.
    pub fn register_instance(&mut self, type_name: impl Into<String>, instance: Arc<dyn Controller>) {
        self.register(type_name, move |_| Ok(Arc::clone(&instance)));
    }

    /// Returns `true` if a factory is registered for `type_name`.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Returns the number of registered factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ControllerActivator for ControllerFactories {
    fn create_instance(
        &self,
        type_name: &str,
        constructor_args: &ConstructorArgs,
    ) -> Result<Arc<dyn Controller>, ActivationError> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| ActivationError::UnknownController(type_name.to_string()))?;

        factory(constructor_args).map_err(|source| ActivationError::Failed {
            controller: type_name.to_string(),
            source,
        })
    }
}

impl fmt::Debug for ControllerFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ControllerFactories")
            .field("controllers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Arguments, Invocation};
    use crate::response::ResponseInfo;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo(i64);

    #[async_trait]
    impl Controller for Echo {
        async fn invoke(
            &self,
            _method: &str,
            _arguments: Arguments,
            _response: &mut ResponseInfo,
        ) -> anyhow::Result<Invocation> {
            Ok(Invocation::value(json!(self.0)))
        }
    }

    #[test]
    fn test_unknown_controller() {
        let factories = ControllerFactories::new();
        let err = factories
            .create_instance("MissingController", &ConstructorArgs::new())
            .err()
            .unwrap();
        assert!(matches!(err, ActivationError::UnknownController(name) if name == "MissingController"));
    }

    #[test]
    fn test_factory_receives_constructor_args() {
        let mut factories = ControllerFactories::new();
        factories.register("EchoController", |args: &ConstructorArgs| {
            let value = args.get("value").and_then(serde_json::Value::as_i64).unwrap_or(0);
            Ok(Arc::new(Echo(value)) as Arc<dyn Controller>)
        });

        let mut args = ConstructorArgs::new();
        args.insert("value".into(), json!(5));
        assert!(factories.create_instance("EchoController", &args).is_ok());
        assert!(factories.contains("EchoController"));
        assert_eq!(factories.len(), 1);
    }

    #[test]
    fn test_factory_failure() {
        let mut factories = ControllerFactories::new();
        factories.register("BrokenController", |_: &ConstructorArgs| {
            anyhow::bail!("database unavailable")
        });

        let err = factories
            .create_instance("BrokenController", &ConstructorArgs::new())
            .err()
            .unwrap();
        assert!(err.to_string().contains("database unavailable"));
    }

    #[test]
    fn test_register_instance_is_shared() {
        let mut factories = ControllerFactories::new();
        let instance: Arc<dyn Controller> = Arc::new(Echo(1));
        factories.register_instance("EchoController", Arc::clone(&instance));

        let created = factories
            .create_instance("EchoController", &ConstructorArgs::new())
            .unwrap();
        assert!(Arc::ptr_eq(&created, &instance));
    }
}
