//! Type-erased binders recorded per route for query strings, path captures
//! and request bodies.
//!
//! String pairs are coerced field by field into a JSON object using the
//! type's [`Shape`], then deserialized with serde and validated with garde.
//! Fields without a matching key receive their zero value.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use axopen_openapi::{FieldDef, Kind, NameTag, Primitive, Reflect, Shape, ShapeFn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::validation;
use crate::value::parse_bool;

/// A bound, validated instance of a recorded type.
pub type Bound = Arc<dyn Any + Send + Sync>;

/// A native type recorded at registration time, able to produce a live,
/// validated value from request data.
#[derive(Clone, Copy)]
pub struct RecordedType {
    type_name: &'static str,
    shape: ShapeFn,
    finish: fn(Value) -> Result<Bound, ApiError>,
}

impl RecordedType {
    pub fn of<T>() -> Self
    where
        T: Reflect + DeserializeOwned + garde::Validate + Send + Sync,
        T::Context: Default,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            shape: T::shape,
            finish: finish::<T>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Bind from repeated `name=value` pairs, matching field names under `tag`.
    pub fn bind_pairs(&self, pairs: &[(String, String)], tag: NameTag) -> Result<Bound, ApiError> {
        let mut grouped: HashMap<&str, Vec<&str>> = HashMap::new();
        for (name, value) in pairs {
            grouped.entry(name.as_str()).or_default().push(value.as_str());
        }

        let shape = (self.shape)();
        let mut object = Map::new();
        fill_object(shape.fields(), &grouped, tag, &mut object)?;
        (self.finish)(Value::Object(object))
    }

    /// Bind an `application/x-www-form-urlencoded` body.
    pub fn bind_form(&self, body: &[u8]) -> Result<Bound, ApiError> {
        let pairs: Vec<(String, String)> = form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        self.bind_pairs(&pairs, NameTag::Form)
    }

    /// Bind a JSON body.
    pub fn bind_json(&self, body: &[u8]) -> Result<Bound, ApiError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| ApiError::Bind(e.to_string()))?;
        (self.finish)(value)
    }
}

impl std::fmt::Debug for RecordedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RecordedType").field(&self.type_name).finish()
    }
}

fn finish<T>(value: Value) -> Result<Bound, ApiError>
where
    T: DeserializeOwned + garde::Validate + Send + Sync + 'static,
    T::Context: Default,
{
    let bound: T = serde_json::from_value(value).map_err(|e| ApiError::Bind(e.to_string()))?;
    validation::validate(&bound)?;
    Ok(Arc::new(bound))
}

fn fill_object(
    fields: &[FieldDef],
    grouped: &HashMap<&str, Vec<&str>>,
    tag: NameTag,
    out: &mut Map<String, Value>,
) -> Result<(), ApiError> {
    for field in fields {
        let shape = field.shape();

        // Flattened fields live at the same level in the serialized form.
        if field.embedded {
            let inner = shape.peel_optional();
            fill_object(inner.fields(), grouped, tag, out)?;
            continue;
        }

        let key = field.name_for(tag);
        let value = match grouped.get(key) {
            Some(raws) => coerce(&shape, raws)
                .map_err(|msg| ApiError::Bind(format!("field '{key}': {msg}")))?,
            None => zero_value(&shape),
        };
        if let Some(value) = value {
            out.insert(field.name.to_string(), value);
        }
    }
    Ok(())
}

fn coerce(shape: &Shape, raws: &[&str]) -> Result<Option<Value>, String> {
    match &shape.kind {
        Kind::Optional(inner) => coerce(&inner(), raws),
        Kind::Seq(items) => {
            let items = items();
            raws.iter()
                .map(|raw| coerce_scalar(&items, raw))
                .collect::<Result<Vec<_>, _>>()
                .map(|values| Some(Value::Array(values)))
        }
        _ => match raws.first() {
            Some(raw) => coerce_scalar(shape, raw).map(Some),
            None => Ok(zero_value(shape)),
        },
    }
}

fn coerce_scalar(shape: &Shape, raw: &str) -> Result<Value, String> {
    match &shape.kind {
        Kind::Primitive(Primitive::String | Primitive::Char) => {
            Ok(Value::String(raw.to_string()))
        }
        Kind::Primitive(_) if raw.is_empty() => Ok(zero_value(shape).unwrap_or(Value::Null)),
        Kind::Primitive(primitive) => primitive_value(*primitive, raw)
            .ok_or_else(|| format!("invalid value '{raw}' for {}", shape.type_name)),
        Kind::DateTime | Kind::Uuid | Kind::Enum(_) | Kind::Any => {
            Ok(Value::String(raw.to_string()))
        }
        Kind::Optional(inner) => coerce_scalar(&inner(), raw),
        Kind::Seq(_) | Kind::Map(_) | Kind::Struct(_) => {
            Err(format!("cannot bind {} from a single value", shape.type_name))
        }
    }
}

fn primitive_value(primitive: Primitive, raw: &str) -> Option<Value> {
    match primitive {
        Primitive::Bool => parse_bool(raw).map(Value::from),
        Primitive::I8 => raw.parse::<i8>().ok().map(Value::from),
        Primitive::I16 => raw.parse::<i16>().ok().map(Value::from),
        Primitive::I32 => raw.parse::<i32>().ok().map(Value::from),
        Primitive::I64 => raw.parse::<i64>().ok().map(Value::from),
        Primitive::Isize => raw.parse::<isize>().ok().map(Value::from),
        Primitive::U8 => raw.parse::<u8>().ok().map(Value::from),
        Primitive::U16 => raw.parse::<u16>().ok().map(Value::from),
        Primitive::U32 => raw.parse::<u32>().ok().map(Value::from),
        Primitive::U64 => raw.parse::<u64>().ok().map(Value::from),
        Primitive::Usize => raw.parse::<usize>().ok().map(Value::from),
        Primitive::F32 => raw.parse::<f32>().ok().map(Value::from),
        Primitive::F64 => raw.parse::<f64>().ok().map(Value::from),
        Primitive::Char | Primitive::String => Some(Value::String(raw.to_string())),
    }
}

/// Value an absent field takes. `None` leaves the key out, which serde
/// accepts for `Option` fields and rejects for required ones.
fn zero_value(shape: &Shape) -> Option<Value> {
    let value = match &shape.kind {
        Kind::Primitive(Primitive::Bool) => Value::Bool(false),
        Kind::Primitive(Primitive::String) => Value::String(String::new()),
        Kind::Primitive(Primitive::Char) => Value::String('\0'.to_string()),
        Kind::Primitive(Primitive::F32 | Primitive::F64) => Value::from(0.0),
        Kind::Primitive(_) => Value::from(0),
        Kind::Uuid => Value::String(uuid::Uuid::nil().to_string()),
        Kind::Any => Value::Null,
        Kind::Seq(_) => Value::Array(Vec::new()),
        Kind::Map(_) => Value::Object(Map::new()),
        Kind::Struct(fields) => {
            let mut object = Map::new();
            zero_object(fields, &mut object);
            Value::Object(object)
        }
        Kind::Optional(_) | Kind::DateTime | Kind::Enum(_) => return None,
    };
    Some(value)
}

fn zero_object(fields: &[FieldDef], out: &mut Map<String, Value>) {
    for field in fields {
        let shape = field.shape();
        if field.embedded {
            zero_object(shape.peel_optional().fields(), out);
        } else if let Some(value) = zero_value(&shape) {
            out.insert(field.name.to_string(), value);
        }
    }
}
