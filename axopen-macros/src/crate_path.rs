//! Crate path resolution for generated code.
//!
//! Detects whether the user depends on `axopen` (facade), `axopen-openapi` or
//! `axopen-core`, and returns the path under which the reflection types live.

use proc_macro2::{Span, TokenStream};
use proc_macro_crate::{crate_name, FoundCrate};
use quote::quote;

fn ident_for(found: FoundCrate, fallback: &str) -> syn::Ident {
    match found {
        // Integration tests of the crate itself still link it under its name.
        FoundCrate::Itself => syn::Ident::new(fallback, Span::call_site()),
        FoundCrate::Name(name) => syn::Ident::new(&name, Span::call_site()),
    }
}

/// Returns the token stream for accessing `axopen_openapi` types.
///
/// Resolution order:
/// 1. `axopen` facade → `::axopen::openapi`
/// 2. Direct `axopen-openapi` dependency → `::axopen_openapi`
/// 3. `axopen-core` → `::axopen_core::openapi`
pub fn openapi_path() -> TokenStream {
    if let Ok(found) = crate_name("axopen") {
        let ident = ident_for(found, "axopen");
        quote!(::#ident::openapi)
    } else if let Ok(found) = crate_name("axopen-openapi") {
        let ident = ident_for(found, "axopen_openapi");
        quote!(::#ident)
    } else if let Ok(found) = crate_name("axopen-core") {
        let ident = ident_for(found, "axopen_core");
        quote!(::#ident::openapi)
    } else {
        // Fallback - assume axopen_openapi is available (for error messages)
        quote!(::axopen_openapi)
    }
}
