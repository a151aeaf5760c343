//! Request to operation mapping.

use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::sync::Arc;

use http::Method;
use hypatia_core::{ActivationError, ConstructorArgs, Controller, ControllerActivator, RequestInfo};
use serde_json::Value;

use crate::description::{ControllerInfo, OperationInfo};
use crate::params::RouteValues;

/// What a request was mapped to.
#[derive(Debug, Clone)]
pub enum MappingTarget {
    /// A controller operation.
    Operation(Arc<OperationInfo>),
    /// A synthesized `OPTIONS` answer.
    Options {
        /// Verbs to advertise in the `Allow` header.
        allow: Vec<Method>,
    },
}

/// The outcome of mapping one request: the controller instance, the
/// target and the route values captured from the URL.
pub struct RequestMapping {
    instance: Arc<dyn Controller>,
    controller: Arc<ControllerInfo>,
    target: MappingTarget,
    route_values: RouteValues,
    constructor_args: ConstructorArgs,
}

impl RequestMapping {
    /// The controller instance that will serve the request.
    #[must_use]
    pub fn instance(&self) -> &Arc<dyn Controller> {
        &self.instance
    }

    /// The matched controller description.
    #[must_use]
    pub fn controller(&self) -> &Arc<ControllerInfo> {
        &self.controller
    }

    /// The mapping target.
    #[must_use]
    pub fn target(&self) -> &MappingTarget {
        &self.target
    }

    /// The matched operation, unless this is an `OPTIONS` mapping.
    #[must_use]
    pub fn operation(&self) -> Option<&Arc<OperationInfo>> {
        match &self.target {
            MappingTarget::Operation(operation) => Some(operation),
            MappingTarget::Options { .. } => None,
        }
    }

    /// Returns `true` for an `OPTIONS` mapping.
    #[must_use]
    pub fn is_options(&self) -> bool {
        matches!(self.target, MappingTarget::Options { .. })
    }

    /// Decoded values of every template variable in the matched route.
    #[must_use]
    pub fn route_values(&self) -> &RouteValues {
        &self.route_values
    }

    /// Values of the controller's own route variables.
    #[must_use]
    pub fn constructor_args(&self) -> &ConstructorArgs {
        &self.constructor_args
    }
}

impl fmt::Debug for RequestMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestMapping")
            .field("controller", &self.controller.type_name())
            .field("target", &self.target)
            .field("route_values", &self.route_values)
            .field("constructor_args", &self.constructor_args)
            .finish_non_exhaustive()
    }
}

/// Finds the controller operation that serves a request.
///
/// Every operation whose verb equals the request method and whose template
/// matches the URL is a candidate. The most specific template wins: longest
/// literal text first, then fewest variables, then registration order.
///
/// `OPTIONS` requests map to the first controller whose base route or any
/// operation template matches, whatever the operations' verbs.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use hypatia_core::fixtures;
/// use hypatia_router::{ControllerDescriptionBuilder, DelegateMapper};
/// use hypatia_core::RequestInfo;
/// use hypatia_url::UrlParserRegistry;
/// use http::Method;
///
/// let builder = ControllerDescriptionBuilder::new();
/// let mut mapper = DelegateMapper::new(Arc::new(fixtures::factories()));
/// mapper.register(Arc::new(builder.build(&fixtures::TestController::metadata()).unwrap()));
///
/// let url = UrlParserRegistry::with_defaults().parse("/api/test/add?operandA=1&operandB=2").unwrap();
/// let mapping = mapper.map_request(&RequestInfo::new(Method::GET, url)).unwrap().unwrap();
/// assert_eq!(mapping.operation().unwrap().method_name(), "Add");
/// ```
pub struct DelegateMapper {
    controllers: Vec<Arc<ControllerInfo>>,
    activator: Arc<dyn ControllerActivator>,
}

impl DelegateMapper {
    /// Creates a mapper with no controllers.
    #[must_use]
    pub fn new(activator: Arc<dyn ControllerActivator>) -> Self {
        Self {
            controllers: Vec::new(),
            activator,
        }
    }

    /// Registers a described controller. Registration order breaks
    /// specificity ties.
    pub fn register(&mut self, controller: Arc<ControllerInfo>) {
        self.controllers.push(controller);
    }

    /// Returns the registered controllers.
    #[must_use]
    pub fn controllers(&self) -> &[Arc<ControllerInfo>] {
        &self.controllers
    }

    /// Maps a request. `Ok(None)` means no route matches.
    pub fn map_request(&self, request: &RequestInfo) -> Result<Option<RequestMapping>, ActivationError> {
        let path = request.url().path_and_query();
        if request.method() == Method::OPTIONS {
            return self.map_options(&path);
        }

        let best = self
            .controllers
            .iter()
            .flat_map(|controller| {
                controller
                    .operations()
                    .iter()
                    .map(move |operation| (controller, operation))
            })
            .filter(|(_, operation)| operation.verb() == request.method())
            .filter_map(|(controller, operation)| {
                operation
                    .regex()
                    .captures(&path)
                    .map(|values| (controller, operation, values))
            })
            .min_by(|(_, left, _), (_, right, _)| Self::specificity(left, right));

        let Some((controller, operation, route_values)) = best else {
            tracing::debug!(method = %request.method(), path = %path, "no matching route");
            return Ok(None);
        };

        tracing::debug!(
            controller = controller.type_name(),
            method = operation.method_name(),
            template = %operation.template(),
            "mapped request"
        );
        self.activate(
            controller,
            MappingTarget::Operation(Arc::clone(operation)),
            route_values,
        )
        .map(Some)
    }

    fn specificity(left: &OperationInfo, right: &OperationInfo) -> Ordering {
        let key = |op: &OperationInfo| {
            (
                Reverse(op.template().literal_len()),
                op.template().variable_count(),
            )
        };
        key(left).cmp(&key(right))
    }

    fn map_options(&self, path: &str) -> Result<Option<RequestMapping>, ActivationError> {
        for controller in &self.controllers {
            // Allow always lists the whole controller; the values come from
            // the first operation route that matches, else the base route
            let route_values = controller
                .operations()
                .iter()
                .find_map(|operation| operation.regex().captures(path))
                .or_else(|| controller.base_regex().captures(path));
            let Some(route_values) = route_values else {
                continue;
            };

            let mut allow = controller.verbs();
            if !allow.contains(&Method::OPTIONS) {
                allow.push(Method::OPTIONS);
            }
            allow.sort_by_key(verb_rank);

            tracing::debug!(controller = controller.type_name(), ?allow, "mapped options request");
            return self
                .activate(controller, MappingTarget::Options { allow }, route_values)
                .map(Some);
        }

        tracing::debug!(path = %path, "no controller for options request");
        Ok(None)
    }

    fn activate(
        &self,
        controller: &Arc<ControllerInfo>,
        target: MappingTarget,
        route_values: RouteValues,
    ) -> Result<RequestMapping, ActivationError> {
        let constructor_args: ConstructorArgs = controller
            .base()
            .path_variables()
            .filter_map(|name| {
                route_values
                    .get(name)
                    .map(|value| (name.to_string(), Value::String(value.to_string())))
            })
            .collect();

        let instance = self
            .activator
            .create_instance(controller.type_name(), &constructor_args)?;

        Ok(RequestMapping {
            instance,
            controller: Arc::clone(controller),
            target,
            route_values,
            constructor_args,
        })
    }
}

impl fmt::Debug for DelegateMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.controllers.iter().map(|c| c.type_name()).collect();
        f.debug_struct("DelegateMapper")
            .field("controllers", &names)
            .finish_non_exhaustive()
    }
}

fn verb_rank(verb: &Method) -> usize {
    const ORDER: [Method; 8] = [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
        Method::TRACE,
    ];
    ORDER.iter().position(|known| known == verb).unwrap_or(ORDER.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::ControllerDescriptionBuilder;
    use hypatia_core::{fixtures, ControllerMetadata, MethodMetadata};
    use hypatia_url::UrlParserRegistry;

    fn mapper(metadata: &[ControllerMetadata]) -> DelegateMapper {
        let builder = ControllerDescriptionBuilder::new();
        let mut factories = fixtures::factories();
        factories.register_instance("ItemController", Arc::new(fixtures::TestController));
        let mut mapper = DelegateMapper::new(Arc::new(factories));
        for metadata in metadata {
            mapper.register(Arc::new(builder.build(metadata).unwrap()));
        }
        mapper
    }

    fn request(method: Method, url: &str) -> RequestInfo {
        RequestInfo::new(method, UrlParserRegistry::with_defaults().parse(url).unwrap())
    }

    fn mapped_method(mapper: &DelegateMapper, method: Method, url: &str) -> Option<String> {
        mapper
            .map_request(&request(method, url))
            .unwrap()
            .and_then(|mapping| mapping.operation().map(|op| op.method_name().to_string()))
    }

    #[test]
    fn test_verb_selects_among_equal_templates() {
        let mapper = mapper(&[fixtures::person_controller_metadata()]);
        assert_eq!(mapped_method(&mapper, Method::GET, "/api/person").as_deref(), Some("List"));
        assert_eq!(mapped_method(&mapper, Method::POST, "/api/person").as_deref(), Some("Create"));
        assert_eq!(mapped_method(&mapper, Method::GET, "/api/person/3").as_deref(), Some("Get"));
        assert_eq!(mapped_method(&mapper, Method::DELETE, "/API/PERSON/3/").as_deref(), Some("Delete"));
        assert_eq!(mapped_method(&mapper, Method::PATCH, "/api/person/3"), None);
        assert_eq!(mapped_method(&mapper, Method::GET, "/api/people"), None);
    }

    #[test]
    fn test_literal_beats_variable() {
        let metadata = ControllerMetadata::builder("ItemController")
            .method(MethodMetadata::builder("GetOne").route("/{name}").build())
            .method(MethodMetadata::builder("GetLatest").route("/latest").build())
            .build();
        let mapper = mapper(&[metadata]);
        assert_eq!(mapped_method(&mapper, Method::GET, "/api/item/latest").as_deref(), Some("GetLatest"));
        assert_eq!(mapped_method(&mapper, Method::GET, "/api/item/other").as_deref(), Some("GetOne"));
    }

    #[test]
    fn test_constructor_args_from_base_route() {
        let mapper = mapper(&[fixtures::AddressController::metadata()]);
        let mapping = mapper
            .map_request(&request(Method::GET, "/api/person/7/address"))
            .unwrap()
            .unwrap();
        assert_eq!(mapping.constructor_args().get("personId"), Some(&Value::String("7".into())));
        assert_eq!(mapping.route_values().get("personId"), Some("7"));
    }

    #[test]
    fn test_options_lists_controller_verbs() {
        let mapper = mapper(&[fixtures::TestController::metadata(), fixtures::person_controller_metadata()]);

        let mapping = mapper
            .map_request(&request(Method::OPTIONS, "/api/person"))
            .unwrap()
            .unwrap();
        assert!(mapping.is_options());
        assert_eq!(mapping.controller().type_name(), "PersonController");
        match mapping.target() {
            MappingTarget::Options { allow } => {
                assert_eq!(
                    allow,
                    &[Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS]
                );
            }
            MappingTarget::Operation(_) => panic!("expected an options mapping"),
        }

        // an item route still lists every verb of the controller
        let mapping = mapper
            .map_request(&request(Method::OPTIONS, "/api/person/7"))
            .unwrap()
            .unwrap();
        assert_eq!(mapping.route_values().get("id"), Some("7"));
        match mapping.target() {
            MappingTarget::Options { allow } => {
                assert_eq!(
                    allow,
                    &[Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS]
                );
            }
            MappingTarget::Operation(_) => panic!("expected an options mapping"),
        }

        // the bare base route of a controller without a root operation
        let mapping = mapper
            .map_request(&request(Method::OPTIONS, "/api/test"))
            .unwrap()
            .unwrap();
        assert!(mapping.is_options());
        assert_eq!(mapping.controller().type_name(), "TestController");

        assert!(mapper
            .map_request(&request(Method::OPTIONS, "/api/unknown"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_activation_failure_surfaces() {
        let metadata = ControllerMetadata::builder("GhostController")
            .method(MethodMetadata::builder("GetAll").build())
            .build();
        let mapper = mapper(&[metadata]);
        let err = mapper
            .map_request(&request(Method::GET, "/api/ghost/all"))
            .unwrap_err();
        assert!(matches!(err, ActivationError::UnknownController(name) if name == "GhostController"));
    }
}
