//! Values the pipeline hands to handlers.
//!
//! Every validated request carries a [`RequestValues`] in its extensions,
//! keyed the same way for all routes:
//!
//! | Key | Content |
//! |-----|---------|
//! | `path.<name>`, `header.<name>`, `cookie.<name>`, `query.<name>` | converted [`ParamValue`] |
//! | `query` | bound query struct |
//! | `path` | bound path struct |
//! | `body` | bound request body |
//! | `security.<scheme>` | credential presented for the scheme |
//! | `security.<scheme>.scopes` | scopes declared by the satisfied requirement |

use std::any::Any;
use std::collections::HashMap;
use std::convert::Infallible;
use std::ops::Deref;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Response;

use crate::binder::Bound;
use crate::error::error_response;
use crate::value::{FromParamValue, ParamValue};

#[derive(Clone)]
pub enum ContextValue {
    Param(ParamValue),
    Scopes(Vec<String>),
    Bound(Bound),
}

impl std::fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextValue::Param(value) => f.debug_tuple("Param").field(value).finish(),
            ContextValue::Scopes(scopes) => f.debug_tuple("Scopes").field(scopes).finish(),
            ContextValue::Bound(_) => f.write_str("Bound(..)"),
        }
    }
}

/// Per-request values extracted and bound by the pipeline.
///
/// Also usable directly as an extractor; a route without a pipeline yields
/// an empty set.
#[derive(Debug, Clone, Default)]
pub struct RequestValues {
    entries: HashMap<String, ContextValue>,
}

impl RequestValues {
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converted parameter value under a full key such as `path.id`.
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        match self.entries.get(key) {
            Some(ContextValue::Param(value)) => Some(value),
            _ => None,
        }
    }

    fn typed<T: FromParamValue>(&self, location: &str, name: &str) -> Option<T> {
        self.param(&format!("{location}.{name}"))
            .and_then(T::from_param_value)
    }

    pub fn path<T: FromParamValue>(&self, name: &str) -> Option<T> {
        self.typed("path", name)
    }

    pub fn header<T: FromParamValue>(&self, name: &str) -> Option<T> {
        self.typed("header", name)
    }

    pub fn cookie<T: FromParamValue>(&self, name: &str) -> Option<T> {
        self.typed("cookie", name)
    }

    pub fn query_param<T: FromParamValue>(&self, name: &str) -> Option<T> {
        self.typed("query", name)
    }

    fn bound<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        match self.entries.get(key) {
            Some(ContextValue::Bound(value)) => value.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn query<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.bound("query")
    }

    pub fn body<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.bound("body")
    }

    pub fn path_struct<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.bound("path")
    }

    /// Credential presented for `scheme`.
    pub fn security(&self, scheme: &str) -> Option<&str> {
        self.param(&format!("security.{scheme}"))
            .and_then(ParamValue::as_str)
    }

    pub fn security_scopes(&self, scheme: &str) -> Option<&[String]> {
        match self.entries.get(&format!("security.{scheme}.scopes")) {
            Some(ContextValue::Scopes(scopes)) => Some(scopes),
            _ => None,
        }
    }

    pub(crate) fn insert_param(&mut self, key: String, value: ParamValue) {
        self.entries.insert(key, ContextValue::Param(value));
    }

    pub(crate) fn insert_bound(&mut self, key: &str, value: Bound) {
        self.entries.insert(key.to_string(), ContextValue::Bound(value));
    }

    pub(crate) fn insert_security(&mut self, scheme: &str, credential: String, scopes: Vec<String>) {
        self.entries.insert(
            format!("security.{scheme}"),
            ContextValue::Param(ParamValue::String(credential)),
        );
        self.entries
            .insert(format!("security.{scheme}.scopes"), ContextValue::Scopes(scopes));
    }
}

impl<S> FromRequestParts<S> for RequestValues
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestValues>()
            .cloned()
            .unwrap_or_default())
    }
}

macro_rules! bound_extractor {
    ($(#[$doc:meta])* $name:ident, $key:literal) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name<T>(pub Arc<T>);

        impl<T> Deref for $name<T> {
            type Target = T;

            fn deref(&self) -> &T {
                &self.0
            }
        }

        impl<T, S> FromRequestParts<S> for $name<T>
        where
            T: Any + Send + Sync,
            S: Send + Sync,
        {
            type Rejection = Response;

            async fn from_request_parts(
                parts: &mut Parts,
                _state: &S,
            ) -> Result<Self, Self::Rejection> {
                parts
                    .extensions
                    .get::<RequestValues>()
                    .and_then(|values| values.bound::<T>($key))
                    .map($name)
                    .ok_or_else(|| {
                        error_response(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            format!(
                                "No {} of type {} was bound for this route",
                                $key,
                                std::any::type_name::<T>()
                            ),
                        )
                    })
            }
        }
    };
}

bound_extractor!(
    /// The query struct bound by the route's `query_struct::<T>()`.
    ValidQuery,
    "query"
);
bound_extractor!(
    /// The request body bound by the route's `request_body_struct::<T>()`.
    ValidBody,
    "body"
);
bound_extractor!(
    /// The path struct bound by the route's `path_struct::<T>()`.
    ValidPath,
    "path"
);
