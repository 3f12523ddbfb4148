//! Route registration, request validation and document assembly over axum.
//!
//! An [`ApiWrapper`] pairs an axum [`Router`](axum::Router) with the OpenAPI
//! 3.1 [`Document`](openapi::Document) describing it. Every route registered
//! through a [`RouteBuilder`] contributes an operation to the document and is
//! guarded by a validation pipeline that checks security requirements,
//! parameters and request bodies before the handler runs. Validated values
//! reach handlers through [`RequestValues`] and the [`ValidQuery`],
//! [`ValidBody`] and [`ValidPath`] extractors.

pub mod api;
mod binder;
pub mod config;
pub mod context;
pub mod docs;
pub mod error;
pub mod group;
pub mod layers;
mod params;
pub mod paths;
mod pipeline;
pub mod prelude;
pub mod route;
mod security;
pub mod validation;
pub mod value;

pub use axopen_openapi as openapi;

/// Derive macro generating the [`Reflect`](openapi::Reflect) field table.
pub use axopen_macros::Reflect;
pub use axopen_openapi::Reflect;

pub use api::{ApiWrapper, SWAGGER_UI_VERSION};
pub use binder::{Bound, RecordedType};
pub use config::{ApiConfig, ConfigError, DEFAULT_BODY_LIMIT};
pub use context::{ContextValue, RequestValues, ValidBody, ValidPath, ValidQuery};
pub use docs::{swagger_ui_html, SpecError, SpecFormat};
pub use error::{error_response, ApiError, ErrorHandler};
pub use group::GroupBuilder;
pub use layers::{default_trace, init_tracing};
pub use params::{parse_cookies, parse_query_string};
pub use paths::{generate_operation_id, join_paths, to_document_path, to_router_path};
pub use route::RouteBuilder;
pub use validation::{validate, FieldError, ValidationErrorResponse};
pub use value::{parse_bool, parse_scalar, FromParamValue, ParamValue};

pub use garde;
