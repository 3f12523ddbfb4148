use std::any::TypeId;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::reference::Ref;
use crate::reflect::{FieldDef, Kind, NameTag, Primitive, Reflect, Shape};
use crate::schema::{Schema, SchemaType, SourceType};
use crate::tags;

/// Memo of which named struct types already have a component schema.
///
/// Keyed on type identity. A second type claiming a name that is already
/// taken is a configuration error and panics.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    names: HashMap<TypeId, &'static str>,
    owners: HashMap<&'static str, SourceType>,
    /// Names of hand-built schemas, which no reflected type may take.
    manual: HashSet<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Component name already assigned to `type_id`.
    pub fn lookup(&self, type_id: TypeId) -> Option<&'static str> {
        self.names.get(&type_id).copied()
    }

    /// Assign `name` to `source`.
    ///
    /// # Panics
    ///
    /// When `name` already belongs to a different type.
    pub fn reserve(&mut self, source: SourceType, name: &'static str) {
        if self.manual.contains(name) {
            panic!(
                "axopen: schema name `{name}` is used by both a hand-built schema and `{}`",
                source.type_name
            );
        }
        if let Some(owner) = self.owners.get(name) {
            if owner.type_id != source.type_id {
                panic!(
                    "axopen: schema name `{name}` is used by both `{}` and `{}`",
                    owner.type_name, source.type_name
                );
            }
            return;
        }
        self.owners.insert(name, source);
        self.names.insert(source.type_id, name);
    }

    /// Claim `name` for a hand-built schema.
    ///
    /// # Panics
    ///
    /// When `name` is already taken, by a reflected type or another
    /// hand-built schema.
    pub fn reserve_manual(&mut self, name: &str) {
        if let Some(owner) = self.owners.get(name) {
            panic!(
                "axopen: schema name `{name}` is used by both `{}` and a hand-built schema",
                owner.type_name
            );
        }
        if !self.manual.insert(name.to_string()) {
            panic!("axopen: schema name `{name}` is already registered");
        }
    }

    /// Source type of the component called `name`, if it was reflected.
    pub fn owner(&self, name: &str) -> Option<SourceType> {
        self.owners.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.owners.contains_key(name) || self.manual.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Derives schemas from [`Shape`]s, writing named structs into the shared
/// component table.
pub struct Reflector<'a> {
    registry: &'a mut SchemaRegistry,
    schemas: &'a mut BTreeMap<String, Schema>,
}

impl<'a> Reflector<'a> {
    pub fn new(registry: &'a mut SchemaRegistry, schemas: &'a mut BTreeMap<String, Schema>) -> Self {
        Self { registry, schemas }
    }

    pub fn schema_ref<T: Reflect>(&mut self) -> Ref<Schema> {
        self.type_to_schema_ref(&T::shape())
    }

    pub fn schema<T: Reflect>(&mut self) -> Schema {
        self.type_to_schema(&T::shape())
    }

    /// A reference for named structs, an inline schema for everything else.
    pub fn type_to_schema_ref(&mut self, shape: &Shape) -> Ref<Schema> {
        match (&shape.kind, shape.name) {
            (Kind::Optional(inner), _) => self.type_to_schema_ref(&inner()),
            (Kind::Struct(_), Some(name)) => {
                if let Some(existing) = self.registry.lookup(shape.type_id) {
                    return Ref::component("schemas", existing);
                }

                // The name is claimed and a placeholder stored before the
                // fields are walked, so a self-referencing field resolves to
                // this same reference.
                self.registry.reserve(shape.source_type(), name);
                self.schemas.insert(name.to_string(), Schema::object());

                let schema = self.struct_to_schema(shape, NameTag::Json);
                self.schemas.insert(name.to_string(), schema);

                Ref::component("schemas", name)
            }
            _ => Ref::Value(self.type_to_schema(shape)),
        }
    }

    /// The schema node for `shape` itself, never a reference at the top level.
    pub fn type_to_schema(&mut self, shape: &Shape) -> Schema {
        let mut schema = match &shape.kind {
            Kind::Primitive(p) => primitive_schema(*p),
            Kind::DateTime => Schema::with_format(SchemaType::String, "date-time"),
            Kind::Uuid => Schema::with_format(SchemaType::String, "uuid"),
            Kind::Any => Schema::object(),
            Kind::Enum(variants) => Schema {
                enum_values: Some(variants.iter().map(|v| (*v).into()).collect()),
                ..Schema::string()
            },
            Kind::Optional(inner) => return self.type_to_schema(&inner()),
            Kind::Seq(items) => Schema::array(self.type_to_schema_ref(&items())),
            Kind::Map(value) => {
                let value = value();
                let mut schema = Schema::object();
                if !matches!(value.kind, Kind::Any) {
                    schema.additional_properties = Some(Box::new(self.type_to_schema_ref(&value)));
                }
                schema
            }
            Kind::Struct(_) => return self.struct_to_schema(shape, NameTag::Json),
        };
        schema.source_type = Some(shape.source_type());
        schema
    }

    /// Object schema built from a struct's field table, naming properties
    /// with `tag`. Embedded fields are composed as
    /// `allOf: [embedded..., own fields]`.
    ///
    /// # Panics
    ///
    /// When `shape` is not a struct.
    pub fn struct_to_schema(&mut self, shape: &Shape, tag: NameTag) -> Schema {
        let Kind::Struct(fields) = &shape.kind else {
            panic!("axopen: struct expected, received `{}`", shape.type_name);
        };

        let mut own = Schema::object();
        own.source_type = Some(shape.source_type());
        let mut composed = Vec::new();

        for field in fields {
            let field_ref = self.field_to_schema_ref(field);

            if field.embedded {
                composed.push(field_ref);
                continue;
            }

            let name = field.name_for(tag);
            if !field.omit_empty && !field.is_optional() {
                own.required.push(name.to_string());
            }
            own.properties.insert(name.to_string(), field_ref);
        }

        if composed.is_empty() {
            return own;
        }

        composed.push(Ref::Value(own));
        Schema {
            all_of: composed,
            source_type: Some(shape.source_type()),
            ..Default::default()
        }
    }

    /// Schema for one field, with its annotations applied to inline nodes.
    pub fn field_to_schema_ref(&mut self, field: &FieldDef) -> Ref<Schema> {
        let mut field_ref = self.type_to_schema_ref(&field.shape());

        if let Ref::Value(schema) = &mut field_ref {
            tags::apply_field_meta(&field.meta, schema);
        }

        if field.meta.nullable {
            field_ref = tags::apply_nullable(field_ref);
        }

        field_ref
    }
}

fn primitive_schema(primitive: Primitive) -> Schema {
    use SchemaType::{Boolean, Integer, Number, String};

    match primitive {
        Primitive::Bool => Schema::new(Boolean),
        Primitive::I8 => Schema::with_format(Integer, "int8"),
        Primitive::I16 => Schema::with_format(Integer, "int16"),
        Primitive::I32 => Schema::with_format(Integer, "int32"),
        Primitive::I64 => Schema::with_format(Integer, "int64"),
        Primitive::U8 => Schema::with_format(Integer, "char"),
        Primitive::U16 => Schema::with_format(Integer, "uint16"),
        Primitive::U32 => Schema::with_format(Integer, "uint32"),
        Primitive::U64 => Schema::with_format(Integer, "uint64"),
        Primitive::Isize | Primitive::Usize => Schema::new(Integer),
        Primitive::F32 => Schema::with_format(Number, "float"),
        Primitive::F64 => Schema::with_format(Number, "double"),
        Primitive::Char | Primitive::String => Schema::new(String),
    }
}
