//! Operation descriptions built from controller metadata.
//!
//! [`ControllerDescriptionBuilder`] resolves everything the metadata leaves
//! open: the controller base route, each method's verb and route, every
//! parameter's source and every result's target. The outcome is an
//! immutable [`ControllerInfo`] holding one [`OperationInfo`] per method,
//! each with its full [`UriTemplate`] and compiled matcher.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use hypatia_core::{
    ControllerKind, ControllerMetadata, CrudRole, MethodMetadata, ParameterMetadata, ParameterSource,
    ResultMetadata, ResultTarget, TypeDescriptor,
};
use hypatia_url::{HttpUrlParser, Url, UrlParser};

use crate::conventions::{deduce_verb, default_controller_route, default_method_route};
use crate::error::DescriptionError;
use crate::selector::{ConventionSelector, DefaultValueRelationSelector};
use crate::template::{TemplateRegex, UriTemplate};

/// A method parameter with its resolved source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentInfo {
    parameter: ParameterMetadata,
    source: ParameterSource,
    fragment: String,
}

impl ArgumentInfo {
    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.parameter.name()
    }

    /// Declared type.
    #[must_use]
    pub fn ty(&self) -> &TypeDescriptor {
        self.parameter.ty()
    }

    /// Where the value is read from.
    #[must_use]
    pub fn source(&self) -> &ParameterSource {
        &self.source
    }

    /// The template fragment that carries this argument in a URL: `{name}`
    /// for path variables, `{?name}` for query parameters, empty otherwise.
    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// The declared metadata.
    #[must_use]
    pub fn parameter(&self) -> &ParameterMetadata {
        &self.parameter
    }
}

/// A return value or output parameter with its resolved target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultInfo {
    name: Option<String>,
    ty: TypeDescriptor,
    target: ResultTarget,
}

impl ResultInfo {
    /// Output parameter name; `None` for the return value.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` for the return value.
    #[must_use]
    pub fn is_return_value(&self) -> bool {
        self.name.is_none()
    }

    /// Declared type.
    #[must_use]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Where the value goes.
    #[must_use]
    pub fn target(&self) -> &ResultTarget {
        &self.target
    }
}

/// Everything needed to match, bind and answer one controller method.
#[derive(Debug)]
pub struct OperationInfo {
    controller: String,
    method: MethodMetadata,
    verb: Method,
    url: Url,
    template: UriTemplate,
    regex: TemplateRegex,
    arguments: Vec<ArgumentInfo>,
    results: Vec<ResultInfo>,
}

impl OperationInfo {
    /// Controller type name.
    #[must_use]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// Method name passed to [`Controller::invoke`](hypatia_core::Controller::invoke).
    #[must_use]
    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    /// The declared method metadata.
    #[must_use]
    pub fn metadata(&self) -> &MethodMetadata {
        &self.method
    }

    /// HTTP verb.
    #[must_use]
    pub fn verb(&self) -> &Method {
        &self.verb
    }

    /// The route path as a relative URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Full route template, including the query placeholder.
    #[must_use]
    pub fn template(&self) -> &UriTemplate {
        &self.template
    }

    /// Compiled matcher of [`template`](Self::template).
    #[must_use]
    pub fn regex(&self) -> &TemplateRegex {
        &self.regex
    }

    /// Input arguments in declaration order.
    #[must_use]
    pub fn arguments(&self) -> &[ArgumentInfo] {
        &self.arguments
    }

    /// The return value first, when not unit, then output parameters.
    #[must_use]
    pub fn results(&self) -> &[ResultInfo] {
        &self.results
    }

    /// The declared return type.
    #[must_use]
    pub fn return_type(&self) -> &TypeDescriptor {
        self.method.result().ty()
    }

    /// CRUD role, for read and read/write controllers.
    #[must_use]
    pub fn role(&self) -> Option<CrudRole> {
        self.method.role()
    }
}

/// The described form of one controller type.
#[derive(Debug)]
pub struct ControllerInfo {
    metadata: ControllerMetadata,
    base: UriTemplate,
    base_regex: TemplateRegex,
    operations: Vec<Arc<OperationInfo>>,
}

impl ControllerInfo {
    /// Controller type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.metadata.type_name()
    }

    /// CRUD behaviour.
    #[must_use]
    pub fn kind(&self) -> ControllerKind {
        self.metadata.kind()
    }

    /// The declared metadata.
    #[must_use]
    pub fn metadata(&self) -> &ControllerMetadata {
        &self.metadata
    }

    /// Base route template. Its variables are constructor arguments.
    #[must_use]
    pub fn base(&self) -> &UriTemplate {
        &self.base
    }

    /// Matcher of the bare base route.
    #[must_use]
    pub fn base_regex(&self) -> &TemplateRegex {
        &self.base_regex
    }

    /// Operations in declaration order.
    #[must_use]
    pub fn operations(&self) -> &[Arc<OperationInfo>] {
        &self.operations
    }

    /// Finds an operation by method name.
    #[must_use]
    pub fn operation(&self, method_name: &str) -> Option<&Arc<OperationInfo>> {
        self.operations.iter().find(|op| op.method_name() == method_name)
    }

    /// Finds the operation playing a CRUD role.
    #[must_use]
    pub fn operation_for(&self, role: CrudRole) -> Option<&Arc<OperationInfo>> {
        self.operations.iter().find(|op| op.role() == Some(role))
    }

    /// Distinct verbs of all operations, in declaration order.
    #[must_use]
    pub fn verbs(&self) -> Vec<Method> {
        let mut verbs: Vec<Method> = Vec::new();
        for operation in &self.operations {
            if !verbs.contains(operation.verb()) {
                verbs.push(operation.verb().clone());
            }
        }
        verbs
    }
}

/// Builds [`ControllerInfo`] from [`ControllerMetadata`].
///
/// # Example
///
/// ```rust
/// use hypatia_core::{ControllerMetadata, MethodMetadata, ParameterMetadata, ParameterSource, TypeDescriptor};
/// use hypatia_router::ControllerDescriptionBuilder;
/// use http::Method;
///
/// let metadata = ControllerMetadata::builder("TestController")
///     .method(
///         MethodMetadata::builder("Add")
///             .param(ParameterMetadata::new("operandA", TypeDescriptor::integer()))
///             .param(ParameterMetadata::new("operandB", TypeDescriptor::integer()))
///             .returns(TypeDescriptor::integer())
///             .build(),
///     )
///     .build();
///
/// let info = ControllerDescriptionBuilder::new().build(&metadata).unwrap();
/// let add = info.operation("Add").unwrap();
/// assert_eq!(add.verb(), &Method::GET);
/// assert_eq!(add.template().as_str(), "/api/test/add{?operandA,operandB}");
/// assert_eq!(add.arguments()[0].source(), &ParameterSource::Query);
/// ```
#[derive(Debug, Clone)]
pub struct ControllerDescriptionBuilder {
    api_prefix: String,
    selector: Arc<dyn DefaultValueRelationSelector>,
}

impl Default for ControllerDescriptionBuilder {
    fn default() -> Self {
        Self {
            api_prefix: "api".to_string(),
            selector: Arc::new(ConventionSelector),
        }
    }
}

impl ControllerDescriptionBuilder {
    /// Creates a builder with the `api` prefix and [`ConventionSelector`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix of conventional controller routes.
    #[must_use]
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Replaces the default source and target selector.
    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn DefaultValueRelationSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Returns the prefix of conventional controller routes.
    #[must_use]
    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// Describes a controller.
    pub fn build(&self, metadata: &ControllerMetadata) -> Result<ControllerInfo, DescriptionError> {
        let base_route = metadata
            .route()
            .map_or_else(|| default_controller_route(metadata.type_name(), &self.api_prefix), str::to_string);
        let base = UriTemplate::parse(&base_route)?;
        let base_regex = base.compile()?;

        let mut seen: HashMap<(Method, String), String> = HashMap::new();
        let mut operations = Vec::with_capacity(metadata.methods().len());
        for method in metadata.methods() {
            let operation = self.describe(metadata.type_name(), &base, method)?;

            let key = (operation.verb.clone(), operation.template.pattern_key());
            if let Some(first) = seen.get(&key) {
                return Err(DescriptionError::AmbiguousRoute {
                    controller: metadata.type_name().to_string(),
                    verb: key.0.to_string(),
                    route: operation.template.path().to_string(),
                    first: first.clone(),
                    second: method.name().to_string(),
                });
            }
            seen.insert(key, method.name().to_string());

            tracing::debug!(
                controller = metadata.type_name(),
                method = method.name(),
                verb = %operation.verb,
                template = %operation.template,
                "described operation"
            );
            operations.push(Arc::new(operation));
        }

        Ok(ControllerInfo {
            metadata: metadata.clone(),
            base,
            base_regex,
            operations,
        })
    }

    fn describe(
        &self,
        controller: &str,
        base: &UriTemplate,
        method: &MethodMetadata,
    ) -> Result<OperationInfo, DescriptionError> {
        let verb = method
            .verb()
            .cloned()
            .unwrap_or_else(|| deduce_verb(method.name()).verb);
        let route = method
            .route()
            .map_or_else(|| default_method_route(method.name()), str::to_string);
        let declared = UriTemplate::parse(&UriTemplate::join(base.path(), &route))?;

        let mut path = declared.path().trim_end_matches('/').to_string();
        let mut query: Vec<String> = declared.query_variables().to_vec();
        let mut arguments = Vec::new();
        let mut results = Vec::new();

        if !method.result().ty().is_unit() {
            results.push(ResultInfo {
                name: None,
                ty: method.result().ty().clone(),
                target: self.result_target(method.result()),
            });
        }

        for parameter in method.parameters() {
            if parameter.is_output() {
                let target = parameter.target().cloned().unwrap_or_else(|| {
                    self.selector
                        .provide_default_result(&ResultMetadata::new(parameter.ty().clone()))
                });
                results.push(ResultInfo {
                    name: Some(parameter.name().to_string()),
                    ty: parameter.ty().clone(),
                    target,
                });
                continue;
            }

            let source = parameter
                .source()
                .cloned()
                .unwrap_or_else(|| self.selector.provide_default(parameter, &verb));
            let fragment = match &source {
                ParameterSource::Url => {
                    if !declared.has_path_variable(parameter.name()) {
                        path.push_str(&format!("/{{{}}}", parameter.name()));
                    }
                    format!("{{{}}}", parameter.name())
                }
                ParameterSource::Query => {
                    if !query.iter().any(|name| name.eq_ignore_ascii_case(parameter.name())) {
                        query.push(parameter.name().to_string());
                    }
                    format!("{{?{}}}", parameter.name())
                }
                ParameterSource::Body | ParameterSource::Header(_) => String::new(),
            };
            arguments.push(ArgumentInfo {
                parameter: parameter.clone(),
                source,
                fragment,
            });
        }

        if path.is_empty() {
            path.push('/');
        }
        if !query.is_empty() {
            path.push_str(&format!("{{?{}}}", query.join(",")));
        }
        let template = UriTemplate::parse(&path)?;
        let regex = template.compile()?;
        let url = HttpUrlParser
            .parse_relative(template.path())
            .map_err(|err| DescriptionError::invalid_template(template.as_str(), err.to_string()))?;

        Ok(OperationInfo {
            controller: controller.to_string(),
            method: method.clone(),
            verb,
            url,
            template,
            regex,
            arguments,
            results,
        })
    }

    fn result_target(&self, result: &ResultMetadata) -> ResultTarget {
        result
            .target()
            .cloned()
            .unwrap_or_else(|| self.selector.provide_default_result(result))
    }
}
