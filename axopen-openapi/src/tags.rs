//! Field annotations applied to already-derived schema nodes.

use serde_json::Value;

use crate::reference::Ref;
use crate::reflect::FieldMeta;
use crate::schema::{Schema, SchemaType};

/// Apply a field's description, default, enum, constraints and example to its
/// inline schema node.
///
/// The default is stored as the literal annotation text without checking it
/// against the schema type.
pub fn apply_field_meta(meta: &FieldMeta, schema: &mut Schema) {
    if let Some(description) = meta.description {
        schema.description = Some(description.to_string());
    }

    if let Some(default) = meta.default.filter(|d| !d.is_empty()) {
        schema.default = Some(Value::String(default.to_string()));
    }

    if let Some(values) = meta.enum_values.filter(|v| !v.is_empty()) {
        schema.enum_values = Some(
            values
                .split(',')
                .map(|v| Value::String(v.to_string()))
                .collect(),
        );
    }

    if let Some(rules) = meta.validate {
        extract_validation_rules(rules, schema);
    }

    if let Some(example) = meta.example.filter(|e| !e.is_empty()) {
        schema.examples.push(Value::String(example.to_string()));
    }
}

/// Rewrite `node` into `oneOf: [node, {type: null}]`.
///
/// Type, format and constraints stay on the first branch; description,
/// default and examples move to the outer node.
pub fn apply_nullable(node: Ref<Schema>) -> Ref<Schema> {
    let null = Ref::Value(Schema::null());
    match node {
        Ref::Value(mut inner) => {
            let outer = Schema {
                description: inner.description.take(),
                default: inner.default.take(),
                examples: std::mem::take(&mut inner.examples),
                source_type: inner.source_type,
                one_of: vec![Ref::Value(inner), null],
                ..Default::default()
            };
            Ref::Value(outer)
        }
        reference => Ref::Value(Schema {
            one_of: vec![reference, null],
            ..Default::default()
        }),
    }
}

/// Translate `key=value` constraint tokens into schema bounds.
///
/// | Token | string | number / integer | array |
/// |-------|--------|------------------|-------|
/// | `max=N`, `lte=N` | `maxLength` | `maximum` | `maxItems` |
/// | `min=N`, `gte=N` | `minLength` | `minimum` | `minItems` |
/// | `gt=N` | | `exclusiveMinimum` | |
/// | `lt=N` | | `exclusiveMaximum` | |
/// | `unique` | | | `uniqueItems` |
///
/// Unknown tokens and values that do not parse are ignored.
pub fn extract_validation_rules(rules: &str, schema: &mut Schema) {
    let Some(kind) = schema.schema_type else {
        return;
    };

    for token in rules.split(',').map(str::trim) {
        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (token, ""),
        };

        match key {
            "max" | "lte" => match kind {
                SchemaType::String => schema.max_length = parse_count(value).or(schema.max_length),
                SchemaType::Array => schema.max_items = parse_count(value).or(schema.max_items),
                k if k.is_numeric() => schema.maximum = parse_bound(value).or(schema.maximum),
                _ => {}
            },
            "min" | "gte" => match kind {
                SchemaType::String => schema.min_length = parse_count(value).or(schema.min_length),
                SchemaType::Array => schema.min_items = parse_count(value).or(schema.min_items),
                k if k.is_numeric() => schema.minimum = parse_bound(value).or(schema.minimum),
                _ => {}
            },
            "gt" if kind.is_numeric() => {
                schema.exclusive_minimum = parse_bound(value).or(schema.exclusive_minimum);
            }
            "lt" if kind.is_numeric() => {
                schema.exclusive_maximum = parse_bound(value).or(schema.exclusive_maximum);
            }
            "unique" if kind == SchemaType::Array => schema.unique_items = true,
            _ => {}
        }
    }
}

fn parse_count(value: &str) -> Option<usize> {
    value.parse().ok()
}

fn parse_bound(value: &str) -> Option<f64> {
    value.parse().ok()
}
