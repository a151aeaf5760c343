//! Static controller metadata.
//!
//! Controllers declare their operations once, at registration, through a
//! [`ControllerMetadata`] table: method names, parameter and result types,
//! and whatever routing facts they want to pin down explicitly. Anything left
//! unspecified is deduced by naming conventions when the controller
//! description is built.
//!
//! # Example
//!
//! ```
//! use hypatia_core::{ControllerMetadata, MethodMetadata, ParameterMetadata, TypeDescriptor};
//! use http::Method;
//!
//! let metadata = ControllerMetadata::builder("TestController")
//!     .method(
//!         MethodMetadata::builder("Add")
//!             .verb(Method::GET)
//!             .param(ParameterMetadata::new("operandA", TypeDescriptor::integer()).query())
//!             .param(ParameterMetadata::new("operandB", TypeDescriptor::integer()).query())
//!             .returns(TypeDescriptor::integer())
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(metadata.type_name(), "TestController");
//! assert_eq!(metadata.methods()[0].parameters().len(), 2);
//! ```

use http::Method;

use crate::types::TypeDescriptor;

/// Where a parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterSource {
    /// A path variable of the route template.
    Url,
    /// A query string parameter.
    Query,
    /// The request body.
    Body,
    /// A request header.
    Header(String),
}

/// Where a result or output parameter goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResultTarget {
    /// The response body.
    Body,
    /// A response header.
    Header(String),
}

/// Whether a parameter is passed in or produced by the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Passed to the operation.
    #[default]
    In,
    /// Produced by the operation, like an out parameter.
    Out,
}

/// Built-in CRUD behaviour of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControllerKind {
    /// No CRUD conventions.
    #[default]
    Plain,
    /// `List` and `Get`.
    Read,
    /// `List`, `Get`, `Create`, `Update` and `Delete`.
    ReadWrite,
}

/// The CRUD role of a method on a read or read/write controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudRole {
    /// All entities.
    List,
    /// One entity by key; `null` means not found.
    Get,
    /// New entity; `Option<bool>` result with the new key as output.
    Create,
    /// Replace an entity; `Option<bool>` result.
    Update,
    /// Remove an entity; `Option<bool>` result.
    Delete,
}

impl CrudRole {
    /// The method name used for this role.
    #[must_use]
    pub const fn method_name(&self) -> &'static str {
        match self {
            Self::List => "List",
            Self::Get => "Get",
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMetadata {
    name: String,
    ty: TypeDescriptor,
    source: Option<ParameterSource>,
    target: Option<ResultTarget>,
    direction: Direction,
}

impl ParameterMetadata {
    /// An input parameter whose source is deduced by convention.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            source: None,
            target: None,
            direction: Direction::In,
        }
    }

    /// An output parameter written to the response body unless redirected.
    #[must_use]
    pub fn output(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            direction: Direction::Out,
            ..Self::new(name, ty)
        }
    }

    /// Binds from a path variable.
    #[must_use]
    pub fn url(mut self) -> Self {
        self.source = Some(ParameterSource::Url);
        self
    }

    /// Binds from the query string.
    #[must_use]
    pub fn query(mut self) -> Self {
        self.source = Some(ParameterSource::Query);
        self
    }

    /// Binds from the body.
    #[must_use]
    pub fn body(mut self) -> Self {
        self.source = Some(ParameterSource::Body);
        self
    }

    /// Binds from a request header.
    #[must_use]
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.source = Some(ParameterSource::Header(header.into()));
        self
    }

    /// Writes an output parameter to a response header.
    #[must_use]
    pub fn header_target(mut self, header: impl Into<String>) -> Self {
        self.target = Some(ResultTarget::Header(header.into()));
        self
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Returns the explicit source, if any.
    #[must_use]
    pub fn source(&self) -> Option<&ParameterSource> {
        self.source.as_ref()
    }

    /// Returns the explicit output target, if any.
    #[must_use]
    pub fn target(&self) -> Option<&ResultTarget> {
        self.target.as_ref()
    }

    /// Returns the direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns `true` for output parameters.
    #[must_use]
    pub fn is_output(&self) -> bool {
        self.direction == Direction::Out
    }
}

/// A declared return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMetadata {
    ty: TypeDescriptor,
    target: Option<ResultTarget>,
}

impl ResultMetadata {
    /// A result whose target is deduced by convention.
    #[must_use]
    pub fn new(ty: TypeDescriptor) -> Self {
        Self { ty, target: None }
    }

    /// Writes the result to a response header.
    #[must_use]
    pub fn header_target(mut self, header: impl Into<String>) -> Self {
        self.target = Some(ResultTarget::Header(header.into()));
        self
    }

    /// Returns the declared type.
    #[must_use]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Returns the explicit target, if any.
    #[must_use]
    pub fn target(&self) -> Option<&ResultTarget> {
        self.target.as_ref()
    }
}

/// A declared controller method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMetadata {
    name: String,
    verb: Option<Method>,
    route: Option<String>,
    parameters: Vec<ParameterMetadata>,
    result: ResultMetadata,
    role: Option<CrudRole>,
}

impl MethodMetadata {
    /// Starts building a method.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> MethodMetadataBuilder {
        MethodMetadataBuilder::new(name)
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the explicit verb, if any.
    #[must_use]
    pub fn verb(&self) -> Option<&Method> {
        self.verb.as_ref()
    }

    /// Returns the explicit route relative to the controller, if any.
    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterMetadata] {
        &self.parameters
    }

    /// Returns the return value.
    #[must_use]
    pub fn result(&self) -> &ResultMetadata {
        &self.result
    }

    /// Returns the CRUD role, if this is a built-in CRUD method.
    #[must_use]
    pub fn role(&self) -> Option<CrudRole> {
        self.role
    }
}

/// Builder for [`MethodMetadata`].
#[derive(Debug)]
pub struct MethodMetadataBuilder {
    method: MethodMetadata,
}

impl MethodMetadataBuilder {
    /// Creates a builder for a method returning unit.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            method: MethodMetadata {
                name: name.into(),
                verb: None,
                route: None,
                parameters: Vec::new(),
                result: ResultMetadata::new(TypeDescriptor::Unit),
                role: None,
            },
        }
    }

    /// Pins the HTTP verb.
    #[must_use]
    pub fn verb(mut self, verb: Method) -> Self {
        self.method.verb = Some(verb);
        self
    }

    /// Pins the route, relative to the controller route. May contain
    /// `{name}` path variables and a `{?a,b}` query part.
    #[must_use]
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.method.route = Some(route.into());
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, parameter: ParameterMetadata) -> Self {
        self.method.parameters.push(parameter);
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn returns(mut self, ty: TypeDescriptor) -> Self {
        self.method.result = ResultMetadata::new(ty);
        self
    }

    /// Sets the return value metadata.
    #[must_use]
    pub fn result(mut self, result: ResultMetadata) -> Self {
        self.method.result = result;
        self
    }

    /// Marks the method with a CRUD role.
    #[must_use]
    pub fn role(mut self, role: CrudRole) -> Self {
        self.method.role = Some(role);
        self
    }

    /// Builds the method.
    #[must_use]
    pub fn build(self) -> MethodMetadata {
        self.method
    }
}

/// The metadata table of a controller type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerMetadata {
    type_name: String,
    route: Option<String>,
    kind: ControllerKind,
    methods: Vec<MethodMetadata>,
}

impl ControllerMetadata {
    /// Starts building the metadata of `type_name`.
    #[must_use]
    pub fn builder(type_name: impl Into<String>) -> ControllerMetadataBuilder {
        ControllerMetadataBuilder::new(type_name)
    }

    /// Returns the controller type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the explicit base route, if any.
    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Returns the CRUD kind.
    #[must_use]
    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    /// Returns the methods in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodMetadata] {
        &self.methods
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodMetadata> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Builder for [`ControllerMetadata`].
#[derive(Debug)]
pub struct ControllerMetadataBuilder {
    metadata: ControllerMetadata,
}

impl ControllerMetadataBuilder {
    /// Creates a builder with no methods.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            metadata: ControllerMetadata {
                type_name: type_name.into(),
                route: None,
                kind: ControllerKind::Plain,
                methods: Vec::new(),
            },
        }
    }

    /// Pins the base route, for example `/api/person/{personId}/address`.
    #[must_use]
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.metadata.route = Some(route.into());
        self
    }

    /// Appends a method.
    #[must_use]
    pub fn method(mut self, method: MethodMetadata) -> Self {
        self.metadata.methods.push(method);
        self
    }

    /// Adds the `List` and `Get` methods for `entity` keyed by `key`.
    #[must_use]
    pub fn read(mut self, entity: TypeDescriptor, key: TypeDescriptor) -> Self {
        self.metadata.kind = ControllerKind::Read;
        self.add_read_methods(&entity, &key);
        self
    }

    /// Adds the `List`, `Get`, `Create`, `Update` and `Delete` methods.
    #[must_use]
    pub fn read_write(mut self, entity: TypeDescriptor, key: TypeDescriptor) -> Self {
        self.metadata.kind = ControllerKind::ReadWrite;
        self.add_read_methods(&entity, &key);

        let outcome = TypeDescriptor::optional(TypeDescriptor::boolean());
        self.metadata.methods.extend([
            MethodMetadata::builder(CrudRole::Create.method_name())
                .verb(Method::POST)
                .route("")
                .param(ParameterMetadata::new("entity", entity.clone()).body())
                .param(ParameterMetadata::output("id", key.clone()))
                .returns(outcome.clone())
                .role(CrudRole::Create)
                .build(),
            MethodMetadata::builder(CrudRole::Update.method_name())
                .verb(Method::PUT)
                .route("/{id}")
                .param(ParameterMetadata::new("id", key.clone()).url())
                .param(ParameterMetadata::new("entity", entity).body())
                .returns(outcome.clone())
                .role(CrudRole::Update)
                .build(),
            MethodMetadata::builder(CrudRole::Delete.method_name())
                .verb(Method::DELETE)
                .route("/{id}")
                .param(ParameterMetadata::new("id", key).url())
                .returns(outcome)
                .role(CrudRole::Delete)
                .build(),
        ]);
        self
    }

    fn add_read_methods(&mut self, entity: &TypeDescriptor, key: &TypeDescriptor) {
        self.metadata.methods.extend([
            MethodMetadata::builder(CrudRole::List.method_name())
                .verb(Method::GET)
                .route("")
                .returns(TypeDescriptor::array(entity.clone()))
                .role(CrudRole::List)
                .build(),
            MethodMetadata::builder(CrudRole::Get.method_name())
                .verb(Method::GET)
                .route("/{id}")
                .param(ParameterMetadata::new("id", key.clone()).url())
                .returns(TypeDescriptor::optional(entity.clone()))
                .role(CrudRole::Get)
                .build(),
        ]);
    }

    /// Builds the metadata.
    #[must_use]
    pub fn build(self) -> ControllerMetadata {
        self.metadata
    }
}
