//! Per-route request validation.
//!
//! Each registered route gets a [`Pipeline`] snapshot of its operation. It
//! runs as the innermost middleware, immediately before the handler, and
//! short-circuits on the first failing stage:
//!
//! 1. security requirements
//! 2. path, header, cookie (and scalar query) parameters
//! 3. path and query structs
//! 4. request body

use std::collections::BTreeMap;
use std::sync::Arc;

use axopen_openapi::{NameTag, ParameterLocation, Schema, SchemaType};
use axum::body::Body;
use axum::extract::{FromRequestParts, RawPathParams, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use bytes::Bytes;
use tracing::debug;

use crate::binder::RecordedType;
use crate::context::RequestValues;
use crate::error::{ApiError, ErrorHandler};
use crate::params::{parse_cookies, parse_query_string, values_named};
use crate::security::{Credentials, SecurityCheck};
use crate::value::{parse_scalar, ParamValue};

/// A scalar parameter resolved against the component table at registration.
#[derive(Debug, Clone)]
pub(crate) struct ParamCheck {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Schema,
    /// Item schema when `schema` is an array.
    pub items: Option<Schema>,
}

impl ParamCheck {
    fn convert(&self, raws: &[&str]) -> Option<ParamValue> {
        if self.schema.is_type(SchemaType::Array) {
            let items = self.items.as_ref()?;
            return raws
                .iter()
                .map(|raw| parse_scalar(items, raw))
                .collect::<Option<Vec<_>>>()
                .map(ParamValue::Array);
        }
        parse_scalar(&self.schema, raws.first()?)
    }
}

/// How a recorded body type is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyFormat {
    Json,
    Form,
}

impl BodyFormat {
    pub fn for_mime(mime: &str) -> Option<Self> {
        let essence = mime_essence(mime);
        if essence == "application/x-www-form-urlencoded" {
            Some(BodyFormat::Form)
        } else if essence == "application/json" || essence.ends_with("+json") {
            Some(BodyFormat::Json)
        } else {
            None
        }
    }
}

/// Lower-cased `type/subtype` without parameters.
pub(crate) fn mime_essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Everything the pipeline needs about one operation.
pub(crate) struct Pipeline {
    pub operation_id: String,
    pub security: SecurityCheck,
    pub params: Vec<ParamCheck>,
    pub path_struct: Option<RecordedType>,
    pub query_struct: Option<RecordedType>,
    /// Registered body mime essences. `None` passes the body through unbound.
    pub body: BTreeMap<String, Option<(BodyFormat, RecordedType)>>,
    pub body_limit: usize,
    pub error_handler: ErrorHandler,
}

impl Pipeline {
    pub async fn run(self: Arc<Self>, req: Request, next: Next) -> Response {
        match self.validate(req).await {
            Ok(req) => next.run(req).await,
            Err(err) => {
                debug!(operation_id = %self.operation_id, error = %err, "request rejected");
                (self.error_handler)(err)
            }
        }
    }

    async fn validate(&self, req: Request) -> Result<Request, ApiError> {
        let (mut parts, body) = req.into_parts();
        let mut values = parts
            .extensions
            .remove::<RequestValues>()
            .unwrap_or_default();

        let query = parse_query_string(parts.uri.query());
        let cookies = parse_cookies(&parts.headers);

        let credentials = Credentials {
            headers: &parts.headers,
            query: &query,
            cookies: &cookies,
        };
        self.security.evaluate(&credentials, &mut values)?;

        let path = path_params(&mut parts).await;
        self.bind_parameters(&parts, &path, &query, &cookies, &mut values)?;

        if let Some(recorded) = &self.path_struct {
            values.insert_bound("path", recorded.bind_pairs(&path, NameTag::Path)?);
        }
        if let Some(recorded) = &self.query_struct {
            values.insert_bound("query", recorded.bind_pairs(&query, NameTag::Query)?);
        }

        let body = self.bind_body(&parts, body, &mut values).await?;

        parts.extensions.insert(values);
        Ok(Request::from_parts(parts, body))
    }

    fn bind_parameters(
        &self,
        parts: &Parts,
        path: &[(String, String)],
        query: &[(String, String)],
        cookies: &[(String, String)],
        values: &mut RequestValues,
    ) -> Result<(), ApiError> {
        for param in &self.params {
            let raws: Vec<&str> = match param.location {
                ParameterLocation::Path => values_named(path, &param.name),
                ParameterLocation::Query if self.query_struct.is_some() => continue,
                ParameterLocation::Query => values_named(query, &param.name),
                ParameterLocation::Cookie => values_named(cookies, &param.name),
                ParameterLocation::Header => parts
                    .headers
                    .get_all(param.name.as_str())
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .collect(),
            };

            let missing = || ApiError::MissingParameter {
                location: param.location,
                name: param.name.clone(),
            };

            if raws.is_empty() {
                if param.required || param.location == ParameterLocation::Path {
                    return Err(missing());
                }
                continue;
            }

            let value = param.convert(&raws).ok_or_else(missing)?;
            values.insert_param(format!("{}.{}", param.location, param.name), value);
        }
        Ok(())
    }

    async fn bind_body(
        &self,
        parts: &Parts,
        body: Body,
        values: &mut RequestValues,
    ) -> Result<Body, ApiError> {
        if self.body.is_empty() {
            return Ok(body);
        }

        let mut content_types = parts.headers.get_all(CONTENT_TYPE).iter();
        let (Some(content_type), None) = (content_types.next(), content_types.next()) else {
            return Err(ApiError::ContentTypeNotSupported);
        };
        let essence = content_type
            .to_str()
            .map(mime_essence)
            .map_err(|_| ApiError::ContentTypeNotSupported)?;

        let Some((format, recorded)) = self
            .body
            .get(&essence)
            .ok_or(ApiError::ContentTypeNotSupported)?
        else {
            return Ok(body);
        };

        let bytes: Bytes = axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|e| ApiError::BodyRead(e.to_string()))?;

        let bound = match format {
            BodyFormat::Json => recorded.bind_json(&bytes)?,
            BodyFormat::Form => recorded.bind_form(&bytes)?,
        };
        values.insert_bound("body", bound);

        Ok(Body::from(bytes))
    }
}

async fn path_params(parts: &mut Parts) -> Vec<(String, String)> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn essences_ignore_parameters_and_case() {
        assert_eq!(mime_essence("Application/JSON; charset=utf-8"), "application/json");
        assert_eq!(mime_essence("text/plain"), "text/plain");
    }

    #[test]
    fn body_formats() {
        assert_eq!(BodyFormat::for_mime("application/json"), Some(BodyFormat::Json));
        assert_eq!(BodyFormat::for_mime("application/merge-patch+json"), Some(BodyFormat::Json));
        assert_eq!(
            BodyFormat::for_mime("application/x-www-form-urlencoded"),
            Some(BodyFormat::Form)
        );
        assert_eq!(BodyFormat::for_mime("image/png"), None);
    }

    #[test]
    fn array_parameters_convert_every_value() {
        let check = ParamCheck {
            name: "X-Ids".into(),
            location: ParameterLocation::Header,
            required: true,
            schema: Schema::array(Schema::with_format(SchemaType::Integer, "int32").into()),
            items: Some(Schema::with_format(SchemaType::Integer, "int32")),
        };
        assert_eq!(
            check.convert(&["1", "2"]),
            Some(ParamValue::Array(vec![ParamValue::I32(1), ParamValue::I32(2)]))
        );
        assert_eq!(check.convert(&["1", "x"]), None);
    }
}
