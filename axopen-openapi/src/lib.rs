//! OpenAPI 3.1 document model and type reflection.
//!
//! - [`Document`] and friends mirror the OpenAPI object model with serde.
//! - [`Reflect`] describes a Rust type as a [`Shape`].
//! - [`Reflector`] turns shapes into [`Schema`]s, memoizing named structs in a
//!   [`SchemaRegistry`] and the document's component table.
//! - [`filters`] select operations by tag after the document is built.

mod document;
pub mod filters;
mod operation;
mod reference;
pub mod reflect;
mod registry;
mod schema;
mod security;
pub mod tags;

pub use document::{
    Components, Contact, Document, ExternalDocs, Info, License, PathItem, Server, Tag,
    OPENAPI_VERSION,
};
pub use filters::{apply_filters, exclude_tags, include_tags, TagFilter};
pub use operation::{
    MediaType, Operation, Parameter, ParameterLocation, RequestBody, Response,
    SecurityRequirement,
};
pub use reference::{Ref, Reference};
pub use reflect::{FieldDef, FieldMeta, Kind, NameTag, Primitive, Reflect, Shape, ShapeFn};
pub use registry::{Reflector, SchemaRegistry};
pub use schema::{Schema, SchemaType, SourceType};
pub use security::{ApiKeyLocation, OAuthFlow, OAuthFlows, SecurityScheme, SecuritySchemeType};
