//! Import everything a typical service needs with a single `use`.
//!
//! ```ignore
//! use axopen_core::prelude::*;
//!
//! #[derive(Reflect, Deserialize, Validate)]
//! struct PetQuery {
//!     #[garde(range(min = 1, max = 100))]
//!     limit: i32,
//! }
//!
//! async fn list_pets(ValidQuery(query): ValidQuery<PetQuery>) -> String {
//!     format!("limit={}", query.limit)
//! }
//!
//! let mut api = ApiWrapper::new("Petstore", "1.0.0");
//! api.get("/pets", list_pets)
//!     .query_struct::<PetQuery>()
//!     .register();
//! ```

pub use crate::openapi::{
    ApiKeyLocation, Contact, ExternalDocs, License, MediaType, Parameter, ParameterLocation,
    RequestBody, Response, Schema, SecurityScheme, Server, Tag, TagFilter,
};
pub use crate::{
    ApiConfig, ApiError, ApiWrapper, GroupBuilder, ParamValue, Reflect, RequestValues,
    RouteBuilder, SpecFormat, ValidBody, ValidPath, ValidQuery,
};

pub use garde::Validate;
pub use serde::{Deserialize, Serialize};
