//! Explicit type descriptions consumed by the [`Reflector`](crate::Reflector).
//!
//! Every type that appears in a request, response or parameter implements
//! [`Reflect`]. Scalars, containers, `chrono` timestamps and `uuid::Uuid` are
//! covered here; structs use `#[derive(Reflect)]` or a hand-written impl built
//! from [`FieldDef`]s:
//!
//! ```ignore
//! impl Reflect for Pet {
//!     fn shape() -> Shape {
//!         Shape::record::<Pet>("Pet", vec![
//!             FieldDef::of::<i64>("id"),
//!             FieldDef::of::<String>("name").description("Pet name").validate("min=1"),
//!             FieldDef::of::<Option<String>>("tag").omit_empty(),
//!         ])
//!     }
//! }
//! ```

use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::schema::SourceType;

/// Lazily produces a [`Shape`]. Field and element shapes are stored as
/// function pointers so self-referential types do not recurse while building.
pub type ShapeFn = fn() -> Shape;

/// A type that can describe itself to the schema reflector.
pub trait Reflect: 'static {
    fn shape() -> Shape;
}

/// Scalar kinds with a fixed (type, format) mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    /// A single Unicode scalar, documented as a string.
    Char,
    String,
}

#[derive(Debug, Clone)]
pub enum Kind {
    Primitive(Primitive),
    /// RFC 3339 timestamp.
    DateTime,
    Uuid,
    /// Dynamic value (`serde_json::Value`), documented as a bare object.
    Any,
    /// Unit-only enum serialized as one of these strings.
    Enum(Vec<&'static str>),
    Optional(ShapeFn),
    Seq(ShapeFn),
    /// String-keyed map, carrying the value shape.
    Map(ShapeFn),
    Struct(Vec<FieldDef>),
}

/// Description of one Rust type.
#[derive(Debug, Clone)]
pub struct Shape {
    pub type_id: TypeId,
    pub type_name: &'static str,
    /// Component name. Named structs are stored once under
    /// `components.schemas` and referenced; unnamed ones are inlined.
    pub name: Option<&'static str>,
    pub kind: Kind,
}

impl Shape {
    pub fn new<T: 'static>(kind: Kind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
            kind,
        }
    }

    /// Named struct shape.
    pub fn record<T: 'static>(name: &'static str, fields: Vec<FieldDef>) -> Self {
        Self::new::<T>(Kind::Struct(fields)).named(name)
    }

    /// Anonymous struct shape, always inlined.
    pub fn inline_record<T: 'static>(fields: Vec<FieldDef>) -> Self {
        Self::new::<T>(Kind::Struct(fields))
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn source_type(&self) -> SourceType {
        SourceType {
            type_id: self.type_id,
            type_name: self.type_name,
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, Kind::Struct(_))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.kind, Kind::Optional(_))
    }

    pub fn fields(&self) -> &[FieldDef] {
        match &self.kind {
            Kind::Struct(fields) => fields,
            _ => &[],
        }
    }

    /// Strip any number of `Option` layers.
    pub fn peel_optional(self) -> Shape {
        match self.kind {
            Kind::Optional(inner) => inner().peel_optional(),
            _ => self,
        }
    }
}

/// Which field name applies in a binding context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTag {
    Json,
    Query,
    Path,
    Form,
}

/// Per-field documentation and constraint annotations.
#[derive(Debug, Clone, Default)]
pub struct FieldMeta {
    pub description: Option<&'static str>,
    pub default: Option<&'static str>,
    /// Comma-separated allowed values.
    pub enum_values: Option<&'static str>,
    pub example: Option<&'static str>,
    /// Comma-separated `key=value` constraint tokens, e.g. `min=1,max=10`.
    pub validate: Option<&'static str>,
    pub nullable: bool,
}

/// One entry of a struct's field table.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub ident: &'static str,
    /// Serialized (JSON) name.
    pub name: &'static str,
    pub query: Option<&'static str>,
    pub path: Option<&'static str>,
    pub form: Option<&'static str>,
    /// Field may be left out of the payload; never listed as required.
    pub omit_empty: bool,
    /// Flattened base struct, composed through `allOf`.
    pub embedded: bool,
    pub shape: ShapeFn,
    pub meta: FieldMeta,
}

impl FieldDef {
    pub fn of<T: Reflect>(ident: &'static str) -> Self {
        Self {
            ident,
            name: ident,
            query: None,
            path: None,
            form: None,
            omit_empty: false,
            embedded: false,
            shape: T::shape,
            meta: FieldMeta::default(),
        }
    }

    pub fn rename(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn query(mut self, name: &'static str) -> Self {
        self.query = Some(name);
        self
    }

    pub fn path(mut self, name: &'static str) -> Self {
        self.path = Some(name);
        self
    }

    pub fn form(mut self, name: &'static str) -> Self {
        self.form = Some(name);
        self
    }

    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn description(mut self, text: &'static str) -> Self {
        self.meta.description = Some(text);
        self
    }

    pub fn default_value(mut self, value: &'static str) -> Self {
        self.meta.default = Some(value);
        self
    }

    pub fn enum_values(mut self, values: &'static str) -> Self {
        self.meta.enum_values = Some(values);
        self
    }

    pub fn example(mut self, value: &'static str) -> Self {
        self.meta.example = Some(value);
        self
    }

    pub fn validate(mut self, rules: &'static str) -> Self {
        self.meta.validate = Some(rules);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.meta.nullable = true;
        self
    }

    /// Name under `tag`, falling back to the JSON name.
    pub fn name_for(&self, tag: NameTag) -> &'static str {
        let name = match tag {
            NameTag::Json => None,
            NameTag::Query => self.query,
            NameTag::Path => self.path,
            NameTag::Form => self.form,
        };
        name.unwrap_or(self.name)
    }

    pub fn shape(&self) -> Shape {
        (self.shape)()
    }

    pub fn is_optional(&self) -> bool {
        self.shape().is_optional()
    }
}

// ── Implementations ─────────────────────────────────────────────────────────

macro_rules! reflect_primitive {
    ($($ty:ty => $prim:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn shape() -> Shape {
                    Shape::new::<$ty>(Kind::Primitive(Primitive::$prim))
                }
            }
        )*
    };
}

reflect_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    &'static str => String,
}

impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> Shape {
        Shape::new::<Option<T>>(Kind::Optional(T::shape))
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

impl<T: Reflect> Reflect for Arc<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn shape() -> Shape {
        Shape::new::<Vec<T>>(Kind::Seq(T::shape))
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn shape() -> Shape {
        Shape::new::<VecDeque<T>>(Kind::Seq(T::shape))
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn shape() -> Shape {
        Shape::new::<[T; N]>(Kind::Seq(T::shape))
    }
}

impl<T: Reflect, S: 'static> Reflect for HashSet<T, S> {
    fn shape() -> Shape {
        Shape::new::<HashSet<T, S>>(Kind::Seq(T::shape))
    }
}

impl<T: Reflect> Reflect for BTreeSet<T> {
    fn shape() -> Shape {
        Shape::new::<BTreeSet<T>>(Kind::Seq(T::shape))
    }
}

impl<K: 'static, V: Reflect, S: 'static> Reflect for HashMap<K, V, S> {
    fn shape() -> Shape {
        Shape::new::<HashMap<K, V, S>>(Kind::Map(V::shape))
    }
}

impl<K: 'static, V: Reflect> Reflect for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::new::<BTreeMap<K, V>>(Kind::Map(V::shape))
    }
}

impl Reflect for serde_json::Value {
    fn shape() -> Shape {
        Shape::new::<serde_json::Value>(Kind::Any)
    }
}

impl Reflect for serde_json::Map<String, serde_json::Value> {
    fn shape() -> Shape {
        Shape::new::<serde_json::Map<String, serde_json::Value>>(Kind::Map(
            serde_json::Value::shape,
        ))
    }
}

impl Reflect for uuid::Uuid {
    fn shape() -> Shape {
        Shape::new::<uuid::Uuid>(Kind::Uuid)
    }
}

impl<Tz: chrono::TimeZone + 'static> Reflect for chrono::DateTime<Tz> {
    fn shape() -> Shape {
        Shape::new::<chrono::DateTime<Tz>>(Kind::DateTime)
    }
}

impl Reflect for chrono::NaiveDateTime {
    fn shape() -> Shape {
        Shape::new::<chrono::NaiveDateTime>(Kind::DateTime)
    }
}
