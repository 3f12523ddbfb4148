//! Typed values produced from raw path, header, cookie and query strings.

use axopen_openapi::{Schema, SchemaType};
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A parameter value converted according to its schema's type and format.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Integer schema without a recognized format.
    Int(i64),
    F32(f32),
    F64(f64),
    DateTime(DateTime<FixedOffset>),
    Uuid(Uuid),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_i128(&self) -> Option<i128> {
        let n = match *self {
            ParamValue::I8(n) => n as i128,
            ParamValue::I16(n) => n as i128,
            ParamValue::I32(n) => n as i128,
            ParamValue::I64(n) | ParamValue::Int(n) => n as i128,
            ParamValue::U8(n) => n as i128,
            ParamValue::U16(n) => n as i128,
            ParamValue::U32(n) => n as i128,
            ParamValue::U64(n) => n as i128,
            _ => return None,
        };
        Some(n)
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            ParamValue::F32(n) => Some(n as f64),
            ParamValue::F64(n) => Some(n),
            _ => self.as_i128().map(|n| n as f64),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::String(s) => Value::String(s.clone()),
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::I8(n) => Value::from(*n),
            ParamValue::I16(n) => Value::from(*n),
            ParamValue::I32(n) => Value::from(*n),
            ParamValue::I64(n) | ParamValue::Int(n) => Value::from(*n),
            ParamValue::U8(n) => Value::from(*n),
            ParamValue::U16(n) => Value::from(*n),
            ParamValue::U32(n) => Value::from(*n),
            ParamValue::U64(n) => Value::from(*n),
            ParamValue::F32(n) => Value::from(*n),
            ParamValue::F64(n) => Value::from(*n),
            ParamValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
            ParamValue::Uuid(id) => Value::String(id.to_string()),
            ParamValue::Array(items) => Value::Array(items.iter().map(ParamValue::to_json).collect()),
        }
    }
}

/// Boolean literals accepted in parameters: `1 t T TRUE true True` and
/// `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Convert one raw string using `schema`'s type and format.
///
/// Returns `None` when the value does not parse, is out of range for the
/// format, or the schema is not a scalar. A schema without a type accepts
/// any string.
pub fn parse_scalar(schema: &Schema, raw: &str) -> Option<ParamValue> {
    let Some(schema_type) = schema.schema_type else {
        return Some(ParamValue::String(raw.to_string()));
    };

    match schema_type {
        SchemaType::String => match schema.format() {
            Some("date-time") => DateTime::parse_from_rfc3339(raw).ok().map(ParamValue::DateTime),
            Some("uuid") => Uuid::parse_str(raw).ok().map(ParamValue::Uuid),
            _ => Some(ParamValue::String(raw.to_string())),
        },
        SchemaType::Boolean => parse_bool(raw).map(ParamValue::Bool),
        SchemaType::Integer => match schema.format() {
            Some("int8") => raw.parse().ok().map(ParamValue::I8),
            Some("int16") => raw.parse().ok().map(ParamValue::I16),
            Some("int32") => raw.parse().ok().map(ParamValue::I32),
            Some("int64") => raw.parse().ok().map(ParamValue::I64),
            Some("char") => raw.parse().ok().map(ParamValue::U8),
            Some("uint16") => raw.parse().ok().map(ParamValue::U16),
            Some("uint32") => raw.parse().ok().map(ParamValue::U32),
            Some("uint64") => raw.parse().ok().map(ParamValue::U64),
            _ => raw.parse().ok().map(ParamValue::Int),
        },
        SchemaType::Number => match schema.format() {
            Some("float") => raw.parse().ok().map(ParamValue::F32),
            _ => raw.parse().ok().map(ParamValue::F64),
        },
        SchemaType::Array | SchemaType::Object | SchemaType::Null => None,
    }
}

/// Conversion out of a [`ParamValue`] for the typed accessors on
/// [`RequestValues`](crate::RequestValues).
pub trait FromParamValue: Sized {
    fn from_param_value(value: &ParamValue) -> Option<Self>;
}

impl FromParamValue for ParamValue {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromParamValue for String {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromParamValue for bool {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

macro_rules! from_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromParamValue for $ty {
                fn from_param_value(value: &ParamValue) -> Option<Self> {
                    value.as_i128().and_then(|n| <$ty>::try_from(n).ok())
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromParamValue for f64 {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        value.as_f64()
    }
}

impl FromParamValue for f32 {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        value.as_f64().map(|n| n as f32)
    }
}

impl FromParamValue for Uuid {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Uuid(id) => Some(*id),
            _ => None,
        }
    }
}

impl FromParamValue for DateTime<FixedOffset> {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl FromParamValue for DateTime<Utc> {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        DateTime::<FixedOffset>::from_param_value(value).map(|dt| dt.with_timezone(&Utc))
    }
}

impl<T: FromParamValue> FromParamValue for Vec<T> {
    fn from_param_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Array(items) => items.iter().map(T::from_param_value).collect(),
            _ => None,
        }
    }
}
