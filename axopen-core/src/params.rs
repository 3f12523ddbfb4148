use axopen_openapi::{NameTag, Parameter, ParameterLocation, Reflector, Shape};
use axum::http::header::COOKIE;
use axum::http::HeaderMap;

/// Parse a query string into key-value pairs.
pub fn parse_query_string(query: Option<&str>) -> Vec<(String, String)> {
    match query {
        Some(q) => form_urlencoded::parse(q.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => Vec::new(),
    }
}

/// Collect `name=value` pairs from every `Cookie` header.
pub fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let value = value.trim().trim_matches('"');
            Some((name.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// All values recorded for `name`, in order.
pub(crate) fn values_named<'a>(pairs: &'a [(String, String)], name: &str) -> Vec<&'a str> {
    pairs
        .iter()
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .collect()
}

fn naming_tag(location: ParameterLocation) -> NameTag {
    match location {
        ParameterLocation::Path => NameTag::Path,
        ParameterLocation::Query => NameTag::Query,
        ParameterLocation::Header | ParameterLocation::Cookie => NameTag::Json,
    }
}

/// One parameter per field of `shape`, with embedded fields flattened.
///
/// Names come from the location's naming tag. The field description moves
/// from the schema onto the parameter.
///
/// # Panics
///
/// When `shape` is not a struct.
pub(crate) fn struct_parameters(
    reflector: &mut Reflector<'_>,
    shape: &Shape,
    location: ParameterLocation,
) -> Vec<Parameter> {
    if !shape.is_struct() {
        panic!("axopen: struct expected, received `{}`", shape.type_name);
    }

    let tag = naming_tag(location);
    let mut params = Vec::new();

    for field in shape.fields() {
        if field.embedded {
            params.extend(struct_parameters(reflector, &field.shape().peel_optional(), location));
            continue;
        }

        let mut schema = reflector.field_to_schema_ref(field);
        let description = schema.as_value_mut().and_then(|s| s.description.take());

        let mut param = Parameter::new(location, field.name_for(tag)).with_schema(schema);
        param.description = description;
        if location != ParameterLocation::Path {
            param.required = !field.omit_empty && !field.is_optional();
        }
        if location == ParameterLocation::Query {
            param.style = Some("form".into());
        }
        params.push(param);
    }

    params
}
