extern crate proc_macro;
use proc_macro::TokenStream;

pub(crate) mod crate_path;
pub(crate) mod reflect_derive;
pub(crate) mod rename_rule;

/// Derive macro generating a `Reflect` implementation from a struct's fields
/// or a unit-only enum's variants.
///
/// The generated field table is what the schema reflector walks, and what the
/// request pipeline uses to bind query strings and form bodies.
///
/// # Container attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[reflect(name = "Pet")]` | Component name (default: the type name) |
/// | `#[reflect(inline)]` | Never register as a component; always inline |
/// | `#[serde(rename_all = "...")]` | Honoured for field and variant names |
///
/// Generic structs are inlined unless `name` is given.
///
/// # Field attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[serde(rename = "x")]` / `#[reflect(rename = "x")]` | JSON name |
/// | `#[reflect(query = "x")]` | Name when bound from a query string |
/// | `#[reflect(path = "x")]` | Name when bound from path parameters |
/// | `#[reflect(form = "x")]` | Name when bound from a form body |
/// | `#[serde(skip_serializing_if = "...")]`, `#[serde(default)]`, `#[reflect(omit_empty)]` | Not required |
/// | `#[serde(flatten)]` / `#[reflect(embed)]` | Compose through `allOf` |
/// | `#[serde(skip)]` / `#[reflect(skip)]` | Leave out of the schema |
/// | `/// doc comment` or `#[reflect(description = "...")]` | Description |
/// | `#[reflect(default = "...")]` | Default value |
/// | `#[reflect(enum_values = "a,b,c")]` | Allowed values |
/// | `#[reflect(example = "...")]` | Example value |
/// | `#[reflect(validate = "min=1,max=10")]` | Documented bounds |
/// | `#[garde(length(min, max))]`, `#[garde(range(min, max))]` | Documented bounds when `validate` is absent |
/// | `#[reflect(nullable)]` | `oneOf: [schema, null]` |
///
/// # Example
///
/// ```ignore
/// use axopen::prelude::*;
///
/// #[derive(Deserialize, Serialize, Validate, Reflect)]
/// pub struct NewPet {
///     /// Name of the pet
///     #[garde(length(min = 1, max = 64))]
///     pub name: String,
///     #[serde(skip_serializing_if = "Option::is_none")]
///     #[garde(skip)]
///     pub tag: Option<String>,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    reflect_derive::expand(input)
}
