//! axopen: OpenAPI 3.1 documents and request validation for axum.
//!
//! This facade re-exports the axopen sub-crates through a single dependency.
//! Import everything you need with:
//!
//! ```ignore
//! use axopen::prelude::*;
//! ```
//!
//! | Module | Crate |
//! |--------|-------|
//! | top level | `axopen-core` (wrapper, routes, pipeline, config) |
//! | [`openapi`] | `axopen-openapi` (document model, reflection) |
//! | `#[derive(Reflect)]` | `axopen-macros` |

// The derive uses `proc-macro-crate` to detect whether the user depends on
// `axopen` (facade) or the individual crates, and generates the right paths.
pub extern crate axopen_core;
pub extern crate axopen_macros;

pub use axopen_core::*;

/// Unified prelude: import everything with `use axopen::prelude::*`.
pub mod prelude {
    pub use axopen_core::prelude::*;
}
