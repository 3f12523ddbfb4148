use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use axopen_openapi::{
    Kind, MediaType, Parameter, ParameterLocation, PathItem, Primitive, Ref, Reflect, RequestBody,
    Response, Schema, SchemaType, SecurityRequirement,
};
use axum::extract::Request;
use axum::handler::Handler;
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::{on, MethodFilter, MethodRouter, Route};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower::{Layer, Service};
use tracing::debug;

use crate::api::ApiWrapper;
use crate::binder::RecordedType;
use crate::group::{RouteLayer, Scope};
use crate::params;
use crate::paths::{generate_operation_id, join_paths, to_document_path, to_router_path};
use crate::pipeline::{mime_essence, BodyFormat, Pipeline};

/// Generates the per-method shortcuts on types exposing
/// `route(method, path, handler)`.
macro_rules! method_shortcuts {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            pub fn $name<H, T>(&mut self, path: &str, handler: H) -> $crate::route::RouteBuilder<'_, S>
            where
                H: ::axum::handler::Handler<T, S>,
                T: 'static,
            {
                self.route(::axum::http::Method::$method, path, handler)
            }
        )*
    };
}

pub(crate) use method_shortcuts;

/// Body mime essence to its binder; `None` passes the body through.
pub(crate) type BodyBinders = BTreeMap<String, Option<(BodyFormat, RecordedType)>>;

/// Configures one operation. Methods apply in call order; nothing is added
/// to the router or the document until [`register`](Self::register).
///
/// Configuration mistakes (unknown tag, unknown security scheme, unknown
/// component, non-struct type) panic with an `axopen:` message.
#[must_use = "call `register()` to add the route"]
pub struct RouteBuilder<'a, S> {
    api: &'a mut ApiWrapper<S>,
    method: Method,
    path: String,
    method_router: MethodRouter<S>,
    operation: axopen_openapi::Operation,
    path_struct: Option<RecordedType>,
    query_struct: Option<RecordedType>,
    body: BodyBinders,
    layers: Vec<RouteLayer<S>>,
    scope_layers: Vec<RouteLayer<S>>,
}

impl<'a, S> RouteBuilder<'a, S>
where
    S: Clone + Send + Sync + 'static,
{
    pub(crate) fn new<H, T>(
        api: &'a mut ApiWrapper<S>,
        method: Method,
        path: &str,
        handler: H,
        scope: &Scope<S>,
    ) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        if !PathItem::supports(&method) {
            panic!("axopen: unknown method {method}");
        }
        let filter = MethodFilter::try_from(method.clone())
            .unwrap_or_else(|_| panic!("axopen: unknown method {method}"));

        let builder = Self {
            api,
            method,
            path: join_paths(&scope.prefix, path),
            method_router: on(filter, handler),
            operation: Default::default(),
            path_struct: None,
            query_struct: None,
            body: BTreeMap::new(),
            layers: Vec::new(),
            scope_layers: scope.layers.clone(),
        };

        let builder = builder.tags(scope.tags.iter().cloned());
        scope
            .security
            .iter()
            .cloned()
            .fold(builder, |b, req| b.add_requirement(req))
    }

    // ── Metadata ────────────────────────────────────────────────────────

    pub fn operation_id(mut self, id: &str) -> Self {
        self.operation.operation_id = Some(id.to_string());
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.operation.summary = Some(summary.trim().to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.operation.description = Some(description.trim().to_string());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.operation.deprecated = true;
        self
    }

    /// Attach document tags.
    ///
    /// # Panics
    ///
    /// When a tag was not registered on the wrapper.
    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            self.api.assert_tag(&tag);
            if !self.operation.has_tag(&tag) {
                self.operation.tags.push(tag);
            }
        }
        self
    }

    // ── Security ────────────────────────────────────────────────────────

    /// Require the registered scheme `name`, with `scopes`. Multiple calls add
    /// alternatives; any one satisfied requirement admits the request.
    ///
    /// # Panics
    ///
    /// When the scheme was not registered.
    pub fn security_requirement(self, name: &str, scopes: &[&str]) -> Self {
        let requirement: SecurityRequirement = [(
            name.to_string(),
            scopes.iter().map(|s| s.to_string()).collect(),
        )]
        .into_iter()
        .collect();
        self.add_requirement(requirement)
    }

    /// Add the empty requirement, making all other requirements optional.
    pub fn optional_security(mut self) -> Self {
        self.operation.security.push(SecurityRequirement::new());
        self
    }

    fn add_requirement(mut self, requirement: SecurityRequirement) -> Self {
        for name in requirement.keys() {
            self.api.assert_security_scheme(name);
        }
        if !self.operation.security.contains(&requirement) {
            self.operation.security.push(requirement);
        }
        self
    }

    // ── Parameters ──────────────────────────────────────────────────────

    /// Declare a parameter whose schema is derived from `T`. A non-zero
    /// `example` is attached to the parameter.
    pub fn parameter<T: Reflect + Serialize>(
        mut self,
        location: ParameterLocation,
        name: &str,
        description: &str,
        required: bool,
        example: Option<T>,
    ) -> Self {
        let schema = self.api.reflector().schema_ref::<T>();
        let mut param = Parameter::new(location, name).with_schema(schema);
        if !description.is_empty() {
            param.description = Some(description.trim().to_string());
        }
        if location != ParameterLocation::Path {
            param.required = required;
        }
        param.example = example
            .and_then(|value| serde_json::to_value(value).ok())
            .filter(|value| !is_zero(value));
        self.operation.parameters.push(Ref::Value(param));
        self
    }

    /// Required path parameter typed as `T`.
    pub fn path_parameter<T: Reflect + Serialize>(self, name: &str, description: &str) -> Self {
        self.parameter::<T>(ParameterLocation::Path, name, description, true, None)
    }

    /// Header parameter typed as `T`. An array `T` accepts one value per header line.
    pub fn header_parameter<T: Reflect + Serialize>(
        self,
        name: &str,
        description: &str,
        required: bool,
    ) -> Self {
        self.parameter::<T>(ParameterLocation::Header, name, description, required, None)
    }

    pub fn cookie_parameter<T: Reflect + Serialize>(
        self,
        name: &str,
        description: &str,
        required: bool,
    ) -> Self {
        self.parameter::<T>(ParameterLocation::Cookie, name, description, required, None)
    }

    /// Scalar query parameter typed as `T`, validated only when the route has
    /// no query struct.
    pub fn query_parameter<T: Reflect + Serialize>(
        self,
        name: &str,
        description: &str,
        required: bool,
    ) -> Self {
        self.parameter::<T>(ParameterLocation::Query, name, description, required, None)
    }

    /// Add a hand-built parameter as is.
    pub fn raw_parameter(mut self, param: Parameter) -> Self {
        self.operation.parameters.push(Ref::Value(param));
        self
    }

    /// Reference a parameter registered with
    /// [`ApiWrapper::add_parameter`](crate::ApiWrapper::add_parameter).
    ///
    /// # Panics
    ///
    /// When the parameter was not registered.
    pub fn parameter_ref(mut self, name: &str) -> Self {
        if !self.api.document.components.parameters.contains_key(name) {
            panic!("axopen: parameter `{name}` not registered");
        }
        self.operation
            .parameters
            .push(Ref::component("parameters", name));
        self
    }

    /// One parameter per field of `T`, named with the location's naming tag.
    ///
    /// # Panics
    ///
    /// When `T` is not a struct.
    pub fn struct_parameters<T: Reflect>(mut self, location: ParameterLocation) -> Self {
        let shape = T::shape();
        let params = params::struct_parameters(&mut self.api.reflector(), &shape, location);
        self.operation
            .parameters
            .extend(params.into_iter().map(Ref::Value));
        self
    }

    /// Document `T`'s fields as path parameters and bind them into a `T`
    /// exposed as `path` (see [`ValidPath`](crate::ValidPath)).
    pub fn path_struct<T>(mut self) -> Self
    where
        T: Reflect + DeserializeOwned + garde::Validate + Send + Sync,
        T::Context: Default,
    {
        self = self.struct_parameters::<T>(ParameterLocation::Path);
        self.path_struct = Some(RecordedType::of::<T>());
        self
    }

    /// Document `T`'s fields as query parameters and bind the query string
    /// into a validated `T` exposed as `query` (see
    /// [`ValidQuery`](crate::ValidQuery)).
    pub fn query_struct<T>(mut self) -> Self
    where
        T: Reflect + DeserializeOwned + garde::Validate + Send + Sync,
        T::Context: Default,
    {
        self = self.struct_parameters::<T>(ParameterLocation::Query);
        self.query_struct = Some(RecordedType::of::<T>());
        self
    }

    // ── Request body ────────────────────────────────────────────────────

    /// Declare `content[mime]` with `T`'s schema and bind matching bodies
    /// into a validated `T` exposed as `body` (see
    /// [`ValidBody`](crate::ValidBody)).
    ///
    /// # Panics
    ///
    /// When `T` is not a struct, or `mime` is neither JSON nor
    /// `application/x-www-form-urlencoded`.
    pub fn request_body_struct<T>(mut self, mime: &str, description: &str) -> Self
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

        let schema = self.api.reflector().type_to_schema_ref(&shape);
        let body = self.inline_request_body();
        if !description.is_empty() {
            body.description = Some(description.trim().to_string());
        }
        body.required = true;
        body.content.insert(mime.to_string(), MediaType::new(schema));

        self.body
            .insert(mime_essence(mime), Some((format, RecordedType::of::<T>())));
        self
    }

    /// Reference a registered request body, binding it the way it was
    /// registered.
    ///
    /// # Panics
    ///
    /// When the request body was not registered.
    pub fn request_body_ref(mut self, name: &str) -> Self {
        let Some(body) = self.api.document.components.request_bodies.get(name) else {
            panic!("axopen: request body `{name}` not registered");
        };
        let binders = self.api.body_binders.get(name);

        self.body = body
            .content
            .keys()
            .map(|mime| {
                let essence = mime_essence(mime);
                let binder = binders.and_then(|b| b.get(&essence)).copied().flatten();
                (essence, binder)
            })
            .collect();
        self.operation.request_body = Some(Ref::component("requestBodies", name));
        self
    }

    /// Declare an unstructured body of type `mime`, passed through unbound.
    pub fn request_body_file(mut self, mime: &str, description: &str) -> Self {
        let body = self.inline_request_body();
        if !description.is_empty() {
            body.description = Some(description.trim().to_string());
        }
        body.required = true;
        body.content
            .insert(mime.to_string(), MediaType::new(binary_schema()));
        self.body.insert(mime_essence(mime), None);
        self
    }

    /// The inline request body. Replacing a referenced body also drops the
    /// binders that came with the reference.
    fn inline_request_body(&mut self) -> &mut RequestBody {
        if matches!(self.operation.request_body, Some(Ref::Ref(_))) {
            self.body.clear();
        }
        self.operation.request_body_mut()
    }

    // ── Responses ───────────────────────────────────────────────────────

    /// Response for a status code (or `default`).
    pub fn response(mut self, code: &str, response: Response) -> Self {
        self.operation
            .responses
            .insert(code.to_string(), Ref::Value(response));
        self
    }

    pub fn response_description(self, code: &str, description: &str) -> Self {
        self.response(code, Response::new(description))
    }

    /// # Panics
    ///
    /// When the response was not registered.
    pub fn response_ref(mut self, code: &str, name: &str) -> Self {
        if !self.api.document.components.responses.contains_key(name) {
            panic!("axopen: response `{name}` not registered");
        }
        self.operation
            .responses
            .insert(code.to_string(), Ref::component("responses", name));
        self
    }

    /// Response with a body of type `T`: `text/plain` when `T` is a plain
    /// string, `application/json` otherwise.
    pub fn response_body<T: Reflect>(self, code: &str, description: &str) -> Self {
        let shape = T::shape();
        let mime = match shape.clone().peel_optional().kind {
            Kind::Primitive(Primitive::String) => "text/plain",
            _ => "application/json",
        };
        let schema = self.api.reflector().type_to_schema_ref(&shape);
        self.response(
            code,
            Response::new(description).with_content(mime, MediaType::new(schema)),
        )
    }

    /// Response carrying a file of type `mime`.
    pub fn response_file(self, code: &str, description: &str, mime: &str) -> Self {
        self.response(
            code,
            Response::new(description).with_content(mime, MediaType::new(binary_schema())),
        )
    }

    // ── Middleware ──────────────────────────────────────────────────────

    /// Route-specific tower layer. Layers run before request validation.
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        let layer: RouteLayer<S> = Arc::new(move |router: MethodRouter<S>| -> MethodRouter<S> {
            router.route_layer(layer.clone())
        });
        self.layers.push(layer);
        self
    }

    // ── Finalize ────────────────────────────────────────────────────────

    /// Add the operation to the document and the route to the router.
    ///
    /// # Panics
    ///
    /// When the same method and path were already registered.
    pub fn register(self) {
        let RouteBuilder {
            api,
            method,
            path,
            mut method_router,
            mut operation,
            path_struct,
            query_struct,
            body,
            layers,
            scope_layers,
        } = self;

        let operation_id = operation
            .operation_id
            .get_or_insert_with(|| generate_operation_id(method.as_str(), &path))
            .clone();

        let pipeline = Arc::new(Pipeline {
            operation_id: operation_id.clone(),
            security: api.security_check(&operation.security),
            params: api.param_checks(&operation.parameters),
            path_struct,
            query_struct,
            body,
            body_limit: api.body_limit,
            error_handler: api.error_handler.clone(),
        });

        // Innermost: the pipeline runs right before the handler, inside any
        // route layers, which sit inside the group layers. Route layers skip
        // the method-not-allowed fallback so a wrong method stays a 405.
        method_router = method_router.route_layer(middleware::from_fn(
            move |req: Request, next: Next| pipeline.clone().run(req, next),
        ));
        for layer in layers.iter().chain(scope_layers.iter()) {
            method_router = layer(method_router);
        }

        let doc_path = to_document_path(&path);
        let item = api.document.paths.entry(doc_path.clone()).or_default();
        if item.operation(&method).is_some() {
            panic!("axopen: {method} {doc_path} is already registered");
        }
        item.set_operation(&method, operation);

        let mut router_path = to_router_path(&join_paths(&api.base_url, &path));
        if router_path.is_empty() {
            router_path.push('/');
        }
        api.router = std::mem::take(&mut api.router).route(&router_path, method_router);

        debug!(method = %method, path = %doc_path, operation_id = %operation_id, "route registered");
    }
}

fn binary_schema() -> Schema {
    Schema::with_format(SchemaType::String, "binary")
}

/// Zero values are not worth showing as examples.
fn is_zero(value: &serde_json::Value) -> bool {
    use serde_json::Value;

    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
