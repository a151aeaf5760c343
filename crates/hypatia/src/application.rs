//! Application assembly.
//!
//! [`ApplicationBuilder`] turns a [`HypatiaConfig`] plus a list of
//! controllers into a ready [`RequestHandler`]. Registries, the converter
//! provider and the description cache are built once here and shared by
//! `Arc`; nothing is global.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use hypatia_config::HypatiaConfig;
use hypatia_core::{
    converter_by_name, ConstructorArgs, Controller, ControllerActivator, ControllerFactories,
    ControllerMetadata, Converter, ConverterProvider,
};
use hypatia_extract::BindingLimits;
use hypatia_router::{ControllerDescriptionBuilder, ControllerInfo, DelegateMapper, DescriptionCache};
use hypatia_server::{PostRequestHandler, PreRequestHandler, RequestHandler};
use hypatia_telemetry::{init_telemetry, MetricsRegistry};
use hypatia_url::{UrlParser, UrlParserRegistry};

use crate::error::ApplicationError;

/// An assembled application: configuration plus the request pipeline.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use hypatia::core::fixtures::TestController;
/// use hypatia::Application;
///
/// let app = Application::builder()
///     .controller_instance(TestController::metadata(), Arc::new(TestController))
///     .build()
///     .unwrap();
///
/// let request = http::Request::get("/api/test/add?operandA=1&operandB=2")
///     .body(bytes::Bytes::new())
///     .unwrap();
/// let response = tokio_test::block_on(app.handle(request));
/// assert_eq!(response.status(), 200);
/// assert_eq!(response.body().as_ref(), b"3");
/// ```
#[derive(Debug, Clone)]
pub struct Application {
    config: HypatiaConfig,
    handler: Arc<RequestHandler>,
}

impl Application {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Returns the configuration the application was built from.
    #[must_use]
    pub fn config(&self) -> &HypatiaConfig {
        &self.config
    }

    /// Returns the request pipeline.
    #[must_use]
    pub fn handler(&self) -> &Arc<RequestHandler> {
        &self.handler
    }

    /// Returns the described controllers in registration order.
    #[must_use]
    pub fn controllers(&self) -> &[Arc<ControllerInfo>] {
        self.handler.mapper().controllers()
    }

    /// Handles one HTTP request.
    pub async fn handle(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        self.handler.handle_http(request).await
    }

    /// Installs logging and metrics from the telemetry section.
    ///
    /// Returns the metrics registry when metrics are enabled. Call once per
    /// process; a second call fails because the global subscriber is taken.
    pub fn init_telemetry(&self) -> Result<Option<MetricsRegistry>, ApplicationError> {
        Ok(init_telemetry(&self.config.telemetry.to_telemetry_config())?)
    }
}

/// Builder for [`Application`].
#[must_use]
pub struct ApplicationBuilder {
    config: HypatiaConfig,
    factories: ControllerFactories,
    activator: Option<Arc<dyn ControllerActivator>>,
    controllers: Vec<ControllerMetadata>,
    url_parsers: Vec<Arc<dyn UrlParser>>,
    converters: Vec<Arc<dyn Converter>>,
    pre: Vec<Arc<dyn PreRequestHandler>>,
    post: Vec<Arc<dyn PostRequestHandler>>,
}

impl ApplicationBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: HypatiaConfig::default(),
            factories: ControllerFactories::new(),
            activator: None,
            controllers: Vec::new(),
            url_parsers: Vec::new(),
            converters: Vec::new(),
            pre: Vec::new(),
            post: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn config(mut self, config: HypatiaConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a controller with a per-request factory.
    ///
    /// The factory receives the values of the controller's own route
    /// variables.
    pub fn controller<F>(mut self, metadata: ControllerMetadata, factory: F) -> Self
    where
        F: Fn(&ConstructorArgs) -> anyhow::Result<Arc<dyn Controller>> + Send + Sync + 'static,
    {
        self.factories.register(metadata.type_name(), factory);
        self.controllers.push(metadata);
        self
    }

    /// Registers a controller served by one shared instance.
    pub fn controller_instance(mut self, metadata: ControllerMetadata, instance: Arc<dyn Controller>) -> Self {
        self.factories.register_instance(metadata.type_name(), instance);
        self.controllers.push(metadata);
        self
    }

    /// Registers controller metadata whose instances come from the
    /// activator set with [`activator`](Self::activator).
    pub fn describe(mut self, metadata: ControllerMetadata) -> Self {
        self.controllers.push(metadata);
        self
    }

    /// Uses a custom activator instead of the registered factories.
    pub fn activator(mut self, activator: Arc<dyn ControllerActivator>) -> Self {
        self.activator = Some(activator);
        self
    }

    /// Adds a URL parser next to the configured built-in ones.
    pub fn url_parser(mut self, parser: Arc<dyn UrlParser>) -> Self {
        self.url_parsers.push(parser);
        self
    }

    /// Adds a converter after the configured built-in ones.
    pub fn converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converters.push(converter);
        self
    }

    /// Adds a pre-request handler.
    pub fn pre_handler(mut self, handler: Arc<dyn PreRequestHandler>) -> Self {
        self.pre.push(handler);
        self
    }

    /// Adds a post-request handler.
    pub fn post_handler(mut self, handler: Arc<dyn PostRequestHandler>) -> Self {
        self.post.push(handler);
        self
    }

    /// Validates the configuration, describes every controller and builds
    /// the pipeline.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, on a controller whose metadata does
    /// not describe, on a controller registered twice, or on a controller
    /// without a factory when no custom activator is set.
    pub fn build(self) -> Result<Application, ApplicationError> {
        let Self {
            config,
            factories,
            activator,
            controllers,
            url_parsers,
            converters,
            pre,
            post,
        } = self;

        config.validate()?;

        let mut parsers = UrlParserRegistry::from_names(&config.routing.url_parsers)?;
        for parser in url_parsers {
            parsers.register_parser(parser);
        }

        let provider = ConverterProvider::new();
        provider.initialize(converter_set(&config, converters)?)?;

        let activator: Arc<dyn ControllerActivator> = match activator {
            Some(activator) => activator,
            None => {
                if let Some(missing) = controllers.iter().find(|m| !factories.contains(m.type_name())) {
                    return Err(ApplicationError::MissingFactory(missing.type_name().to_string()));
                }
                Arc::new(factories)
            }
        };

        let cache = DescriptionCache::new(
            ControllerDescriptionBuilder::new().with_api_prefix(config.routing.api_prefix.clone()),
        );
        let mut mapper = DelegateMapper::new(activator);
        let mut seen = HashSet::new();
        for metadata in &controllers {
            if !seen.insert(metadata.type_name()) {
                return Err(ApplicationError::DuplicateController(metadata.type_name().to_string()));
            }
            let info = cache.get_or_build(metadata)?;
            tracing::info!(
                controller = info.type_name(),
                base = %info.base(),
                operations = info.operations().len(),
                "controller registered"
            );
            mapper.register(info);
        }

        let limits = BindingLimits::new()
            .max_body_bytes(config.binding.max_body_bytes)
            .max_multipart_fields(config.binding.max_multipart_fields);

        let mut builder = RequestHandler::builder(Arc::new(mapper), Arc::new(provider))
            .url_parsers(Arc::new(parsers))
            .limits(limits)
            .expose_internal_errors(config.errors.expose_internal);
        for handler in pre {
            builder = builder.pre_handler(handler);
        }
        for handler in post {
            builder = builder.post_handler(handler);
        }

        Ok(Application {
            config,
            handler: Arc::new(builder.build()),
        })
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let controllers: Vec<_> = self.controllers.iter().map(ControllerMetadata::type_name).collect();
        f.debug_struct("ApplicationBuilder")
            .field("config", &self.config)
            .field("controllers", &controllers)
            .field("custom_activator", &self.activator.is_some())
            .field("url_parsers", &self.url_parsers)
            .field("converters", &self.converters)
            .field("pre", &self.pre)
            .field("post", &self.post)
            .finish()
    }
}

/// Configured built-in converters, duplicates dropped, followed by the
/// extra ones.
fn converter_set(
    config: &HypatiaConfig,
    extra: Vec<Arc<dyn Converter>>,
) -> Result<Vec<Arc<dyn Converter>>, ApplicationError> {
    let mut seen = HashSet::new();
    let mut converters = Vec::with_capacity(config.converters.enabled.len() + extra.len());
    for name in &config.converters.enabled {
        if seen.insert(name.to_ascii_lowercase()) {
            converters.push(converter_by_name(name)?);
        }
    }
    converters.extend(extra);
    Ok(converters)
}
