use std::collections::HashMap;
use std::path::Path;

use axopen_openapi::{
    Contact, Document, ExternalDocs, License, MediaType, Parameter, Ref, Reflect, Reflector,
    RequestBody, Response, Schema, SchemaRegistry, SchemaType, SecurityRequirement,
    SecurityScheme, Server, Tag, TagFilter,
};
use axum::handler::Handler;
use axum::http::Method;
use axum::Router;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::binder::RecordedType;
use crate::config::{ApiConfig, DEFAULT_BODY_LIMIT};
use crate::docs::{self, DocsRoute, SpecError, SpecFormat};
use crate::error::{default_error_handler, ApiError, ErrorHandler};
use crate::group::{GroupBuilder, Scope};
use crate::layers;
use crate::pipeline::{mime_essence, BodyFormat, ParamCheck};
use crate::route::{method_shortcuts, BodyBinders, RouteBuilder};
use crate::security::{SchemeCheck, SecurityCheck};

/// Default Swagger UI asset version served by [`ApiWrapper::serve_swagger_ui`].
pub const SWAGGER_UI_VERSION: &str = "5.17.14";

/// An axum router paired with the OpenAPI document describing it.
///
/// Routes are registered through [`RouteBuilder`]s; each one adds an
/// operation to the document and a validated route to the router.
///
/// ```ignore
/// let mut api = ApiWrapper::new("Petstore", "1.0.0")
///     .with_tag(Tag::new("pets"))
///     .with_security_scheme("api_key", SecurityScheme::api_key("X-API-Key", ApiKeyLocation::Header));
///
/// api.get("/pets/:id", get_pet)
///     .tags(["pets"])
///     .path_parameter::<i64>("id", "Pet id")
///     .response_body::<Pet>("200", "The pet")
///     .register();
///
/// api.serve_yaml_spec("/openapi.yml", &[]);
/// api.serve("0.0.0.0:3000").await?;
/// ```
pub struct ApiWrapper<S = ()> {
    pub(crate) document: Document,
    pub(crate) registry: SchemaRegistry,
    pub(crate) router: Router<S>,
    pub(crate) base_url: String,
    pub(crate) body_limit: usize,
    pub(crate) error_handler: ErrorHandler,
    /// Binders of reusable request bodies, by component name.
    pub(crate) body_binders: HashMap<String, BodyBinders>,
    docs: Vec<DocsRoute>,
    trace_requests: bool,
}

impl<S> ApiWrapper<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            document: Document::new(title, version),
            registry: SchemaRegistry::new(),
            router: Router::new(),
            base_url: String::new(),
            body_limit: DEFAULT_BODY_LIMIT,
            error_handler: default_error_handler(),
            body_binders: HashMap::new(),
            docs: Vec::new(),
            trace_requests: false,
        }
    }

    pub fn from_config(config: ApiConfig) -> Self {
        let mut api = Self::new(&config.title, &config.version);
        api.document.openapi = config.openapi;
        api.document.info.description = config.description;
        api.document.info.terms_of_service = config.terms_of_service;
        api.document.info.contact = config.contact;
        api.document.info.license = config.license;
        api.document.servers = config.servers;
        api.document.tags = config.tags;
        api.document.external_docs = config.external_docs;
        api.base_url = config.base_url.unwrap_or_default();
        api.body_limit = config.body_limit;
        api
    }

    // ── Document metadata ───────────────────────────────────────────────

    pub fn with_description(mut self, description: &str) -> Self {
        self.document.info.description = Some(description.trim().to_string());
        self
    }

    pub fn with_terms_of_service(mut self, url: &str) -> Self {
        self.document.info.terms_of_service = Some(url.to_string());
        self
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.document.info.contact = Some(contact);
        self
    }

    pub fn with_license(mut self, license: License) -> Self {
        self.document.info.license = Some(license);
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.add_server(server);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.add_tag(tag);
        self
    }

    pub fn with_external_docs(mut self, docs: ExternalDocs) -> Self {
        self.document.external_docs = Some(docs);
        self
    }

    pub fn with_security_scheme(mut self, name: &str, scheme: SecurityScheme) -> Self {
        self.add_security_scheme(name, scheme);
        self
    }

    // ── Runtime settings ────────────────────────────────────────────────

    /// Prefix for every live route, e.g. `/api/v1`. Document paths stay
    /// unprefixed; [`spec`](Self::spec) advertises the prefix as a server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Largest request body the pipeline will buffer for binding.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Replace the response produced for pipeline rejections.
    ///
    /// Routes capture the handler when they are registered, so call this
    /// before registering routes.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(ApiError) -> axum::response::Response + Send + Sync + 'static,
    {
        self.error_handler = std::sync::Arc::new(handler);
        self
    }

    /// Install the global `tracing` subscriber and wrap the router in a
    /// tower-http `TraceLayer`.
    pub fn with_tracing(mut self) -> Self {
        layers::init_tracing();
        self.trace_requests = true;
        self
    }

    // ── Components ──────────────────────────────────────────────────────

    pub fn add_tag(&mut self, tag: Tag) {
        match self.document.tags.iter_mut().find(|t| t.name == tag.name) {
            Some(existing) => *existing = tag,
            None => self.document.tags.push(tag),
        }
    }

    pub fn add_server(&mut self, server: Server) {
        self.document.servers.push(server);
    }

    pub fn add_security_scheme(&mut self, name: &str, scheme: SecurityScheme) {
        self.document
            .components
            .security_schemes
            .insert(name.to_string(), scheme);
    }

    /// Reflect `T` into the component table. Named structs become
    /// `#/components/schemas/<name>` references.
    pub fn add_schema<T: Reflect>(&mut self) -> Ref<Schema> {
        self.reflector().schema_ref::<T>()
    }

    /// Store a hand-built schema under `name`.
    ///
    /// # Panics
    ///
    /// When a schema called `name` already exists, reflected or hand-built.
    pub fn add_schema_as(&mut self, name: &str, schema: Schema) -> Ref<Schema> {
        if self.document.components.schemas.contains_key(name) {
            panic!("axopen: schema name `{name}` is already registered");
        }
        self.registry.reserve_manual(name);
        self.document
            .components
            .schemas
            .insert(name.to_string(), schema);
        Ref::component("schemas", name)
    }

    pub fn add_response(&mut self, name: &str, response: Response) -> Ref<Response> {
        self.document
            .components
            .responses
            .insert(name.to_string(), response);
        Ref::component("responses", name)
    }

    /// Reusable `application/json` response carrying `T`.
    pub fn add_json_response<T: Reflect>(&mut self, name: &str, description: &str) -> Ref<Response> {
        let schema = self.add_schema::<T>();
        self.add_response(
            name,
            Response::new(description).with_content("application/json", MediaType::new(schema)),
        )
    }

    pub fn add_parameter(&mut self, name: &str, parameter: Parameter) -> Ref<Parameter> {
        self.document
            .components
            .parameters
            .insert(name.to_string(), parameter);
        Ref::component("parameters", name)
    }

    /// Reusable request body whose content passes through unbound.
    pub fn add_request_body(&mut self, name: &str, body: RequestBody) -> Ref<RequestBody> {
        self.body_binders.remove(name);
        self.document
            .components
            .request_bodies
            .insert(name.to_string(), body);
        Ref::component("requestBodies", name)
    }

    /// Reusable request body with `content[mime]` derived from `T`. Routes
    /// referencing it bind matching bodies into `T`. Calling again with the
    /// same name and another mime adds a content type.
    ///
    /// # Panics
    ///
    /// When `T` is not a struct, or `mime` is neither JSON nor
    /// `application/x-www-form-urlencoded`.
    pub fn add_request_body_struct<T>(
        &mut self,
        name: &str,
        mime: &str,
        description: &str,
    ) -> Ref<RequestBody>
    where
        T: Reflect + DeserializeOwned + garde::Validate + Send + Sync,
        T::Context: Default,
    {
        let shape = T::shape();
        if !shape.is_struct() {
            panic!("axopen: struct expected, received `{}`", shape.type_name);
        }
        let Some(format) = BodyFormat::for_mime(mime) else {
            panic!("axopen: cannot bind `{mime}` request bodies to `{}`", shape.type_name);
        };

        let schema = self.reflector().type_to_schema_ref(&shape);
        let body = self
            .document
            .components
            .request_bodies
            .entry(name.to_string())
            .or_default();
        if !description.is_empty() {
            body.description = Some(description.trim().to_string());
        }
        body.required = true;
        body.content.insert(mime.to_string(), MediaType::new(schema));

        self.body_binders
            .entry(name.to_string())
            .or_default()
            .insert(mime_essence(mime), Some((format, RecordedType::of::<T>())));
        Ref::component("requestBodies", name)
    }

    // ── Registration support ────────────────────────────────────────────

    pub(crate) fn assert_tag(&self, tag: &str) {
        if !self.document.has_tag(tag) {
            panic!("axopen: tag `{tag}` not registered");
        }
    }

    pub(crate) fn assert_security_scheme(&self, name: &str) {
        if !self.document.components.security_schemes.contains_key(name) {
            panic!("axopen: security scheme `{name}` not registered");
        }
    }

    pub(crate) fn reflector(&mut self) -> Reflector<'_> {
        Reflector::new(&mut self.registry, &mut self.document.components.schemas)
    }

    pub(crate) fn security_check(&self, requirements: &[SecurityRequirement]) -> SecurityCheck {
        let schemes = &self.document.components.security_schemes;
        SecurityCheck {
            requirements: requirements
                .iter()
                .map(|requirement| {
                    requirement
                        .iter()
                        .filter_map(|(name, scopes)| {
                            schemes.get(name).map(|scheme| SchemeCheck {
                                name: name.clone(),
                                scheme: scheme.clone(),
                                scopes: scopes.clone(),
                            })
                        })
                        .collect()
                })
                .collect(),
        }
    }

    pub(crate) fn param_checks(&self, parameters: &[Ref<Parameter>]) -> Vec<ParamCheck> {
        let components = &self.document.components;
        parameters
            .iter()
            .filter_map(|param| components.resolve_parameter(param))
            .map(|param| {
                let schema = param
                    .schema
                    .as_ref()
                    .and_then(|s| components.resolve_schema(s))
                    .cloned()
                    .unwrap_or_default();
                let items = schema
                    .is_type(SchemaType::Array)
                    .then(|| schema.items.as_deref())
                    .flatten()
                    .and_then(|items| components.resolve_schema(items))
                    .cloned();
                ParamCheck {
                    name: param.name.clone(),
                    location: param.location,
                    required: param.required,
                    schema,
                    items,
                }
            })
            .collect()
    }

    // ── Routes ──────────────────────────────────────────────────────────

    /// Start configuring a route. Paths use `:name` captures and a trailing
    /// `*name` wildcard.
    ///
    /// # Panics
    ///
    /// When `method` is not one of the eight OpenAPI operation methods.
    pub fn route<H, T>(&mut self, method: Method, path: &str, handler: H) -> RouteBuilder<'_, S>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        RouteBuilder::new(self, method, path, handler, &Scope::default())
    }

    method_shortcuts! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
        head => HEAD,
        options => OPTIONS,
        trace => TRACE,
    }

    /// Routes under `prefix` sharing tags, security and layers.
    pub fn group(&mut self, prefix: &str) -> GroupBuilder<'_, S> {
        let scope = Scope {
            prefix: crate::paths::join_paths("", prefix),
            ..Scope::default()
        };
        GroupBuilder::new(self, scope)
    }

    // ── Documentation ───────────────────────────────────────────────────

    /// Serve the finished document as YAML at `path`, after `filters`.
    pub fn serve_yaml_spec(&mut self, path: &str, filters: &[TagFilter]) -> &mut Self {
        self.docs.push(DocsRoute::Spec {
            path: path.to_string(),
            format: SpecFormat::Yaml,
            filters: filters.to_vec(),
        });
        self
    }

    /// Serve the finished document as JSON at `path`, after `filters`.
    pub fn serve_json_spec(&mut self, path: &str, filters: &[TagFilter]) -> &mut Self {
        self.docs.push(DocsRoute::Spec {
            path: path.to_string(),
            format: SpecFormat::Json,
            filters: filters.to_vec(),
        });
        self
    }

    /// Serve a Swagger UI page at `path` loading the document from `spec_url`.
    /// An empty `version` uses [`SWAGGER_UI_VERSION`].
    pub fn serve_swagger_ui(&mut self, path: &str, spec_url: &str, version: &str) -> &mut Self {
        let version = if version.is_empty() {
            SWAGGER_UI_VERSION
        } else {
            version
        };
        self.docs.push(DocsRoute::Ui {
            path: path.to_string(),
            spec_url: spec_url.to_string(),
            version: version.to_string(),
        });
        self
    }

    /// The document as registered so far.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The published document: as registered, plus the base URL as the
    /// server when no servers were declared.
    pub fn spec(&self) -> Document {
        let mut doc = self.document.clone();
        if doc.servers.is_empty() && !self.base_url.is_empty() {
            doc.servers.push(Server {
                url: self.base_url.clone(),
                description: None,
            });
        }
        doc
    }

    pub fn spec_yaml(&self, filters: &[TagFilter]) -> Result<String, SpecError> {
        docs::render(&self.spec(), SpecFormat::Yaml, filters)
    }

    pub fn spec_json(&self, filters: &[TagFilter]) -> Result<String, SpecError> {
        docs::render(&self.spec(), SpecFormat::Json, filters)
    }

    pub fn write_yaml_spec(&self, path: impl AsRef<Path>, filters: &[TagFilter]) -> Result<(), SpecError> {
        docs::write(&self.spec(), SpecFormat::Yaml, filters, path.as_ref())
    }

    pub fn write_json_spec(&self, path: impl AsRef<Path>, filters: &[TagFilter]) -> Result<(), SpecError> {
        docs::write(&self.spec(), SpecFormat::Json, filters, path.as_ref())
    }

    // ── Finalize ────────────────────────────────────────────────────────

    /// The router with every registered route and documentation route.
    pub fn into_router(self) -> Router<S> {
        let doc = self.spec();
        let router = docs::install(self.router, self.docs, &doc);
        if self.trace_requests {
            router.layer(layers::default_trace())
        } else {
            router
        }
    }
}

impl ApiWrapper<()> {
    /// Bind `addr` and serve until Ctrl-C or SIGTERM.
    pub async fn serve(self, addr: &str) -> std::io::Result<()> {
        let title = self.document.info.title.clone();
        let router = self.into_router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, api = %title, "axopen server listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(layers::shutdown_signal())
            .await
    }
}
