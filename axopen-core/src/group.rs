use std::convert::Infallible;
use std::sync::Arc;

use axopen_openapi::SecurityRequirement;
use axum::extract::Request;
use axum::handler::Handler;
use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::{MethodRouter, Route};
use tower::{Layer, Service};

use crate::api::ApiWrapper;
use crate::paths::join_paths;
use crate::route::{method_shortcuts, RouteBuilder};

/// A tower layer applied to a single route's method router.
pub(crate) type RouteLayer<S> = Arc<dyn Fn(MethodRouter<S>) -> MethodRouter<S> + Send + Sync>;

/// Defaults inherited by every route of a group and its sub-groups.
pub(crate) struct Scope<S> {
    pub prefix: String,
    pub tags: Vec<String>,
    pub security: Vec<SecurityRequirement>,
    pub layers: Vec<RouteLayer<S>>,
}

impl<S> Default for Scope<S> {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            tags: Vec::new(),
            security: Vec::new(),
            layers: Vec::new(),
        }
    }
}

impl<S> Clone for Scope<S> {
    fn clone(&self) -> Self {
        Self {
            prefix: self.prefix.clone(),
            tags: self.tags.clone(),
            security: self.security.clone(),
            layers: self.layers.clone(),
        }
    }
}

/// Routes sharing a path prefix, tags, security requirements and layers.
///
/// ```ignore
/// let mut pets = api.group("/pets")
///     .tags(["pets"])
///     .security_requirement("api_key", &[]);
///
/// pets.get("/:id", get_pet)
///     .path_parameter::<i64>("id", "Pet id")
///     .register();
/// ```
pub struct GroupBuilder<'a, S> {
    api: &'a mut ApiWrapper<S>,
    scope: Scope<S>,
    /// Layers added on this group, stored ahead of the inherited ones so
    /// that parent layers stay outermost.
    own_layers: usize,
}

impl<'a, S> GroupBuilder<'a, S>
where
    S: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(api: &'a mut ApiWrapper<S>, scope: Scope<S>) -> Self {
        Self {
            api,
            scope,
            own_layers: 0,
        }
    }

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
            self.scope.tags.push(tag);
        }
        self
    }

    /// # Panics
    ///
    /// When the scheme was not registered.
    pub fn security_requirement(mut self, name: &str, scopes: &[&str]) -> Self {
        self.api.assert_security_scheme(name);
        self.scope.security.push(
            [(
                name.to_string(),
                scopes.iter().map(|s| s.to_string()).collect(),
            )]
            .into_iter()
            .collect(),
        );
        self
    }

    /// Layer applied to every route of the group, outside route layers and
    /// inside the layers of enclosing groups.
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
        self.scope.layers.insert(self.own_layers, layer);
        self.own_layers += 1;
        self
    }

    /// Nested group; inherits this group's prefix, tags, security and layers.
    pub fn group(&mut self, prefix: &str) -> GroupBuilder<'_, S> {
        let mut scope = self.scope.clone();
        scope.prefix = join_paths(&self.scope.prefix, prefix);
        GroupBuilder::new(&mut *self.api, scope)
    }

    pub fn route<H, T>(&mut self, method: Method, path: &str, handler: H) -> RouteBuilder<'_, S>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        RouteBuilder::new(&mut *self.api, method, path, handler, &self.scope)
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
}
