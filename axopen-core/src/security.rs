use axopen_openapi::{ApiKeyLocation, SecurityScheme, SecuritySchemeType};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::context::RequestValues;
use crate::error::ApiError;
use crate::params::values_named;

/// Request data a security scheme may read its credential from.
pub(crate) struct Credentials<'a> {
    pub headers: &'a HeaderMap,
    pub query: &'a [(String, String)],
    pub cookies: &'a [(String, String)],
}

/// One scheme of a requirement, resolved at registration.
#[derive(Debug, Clone)]
pub(crate) struct SchemeCheck {
    pub name: String,
    pub scheme: SecurityScheme,
    pub scopes: Vec<String>,
}

/// The operation's security requirements, any one of which must hold.
#[derive(Debug, Clone, Default)]
pub(crate) struct SecurityCheck {
    pub requirements: Vec<Vec<SchemeCheck>>,
}

impl SecurityCheck {
    /// No requirements pass. An empty requirement passes. A named requirement
    /// passes when every scheme in it finds a credential. Credentials of each
    /// satisfied requirement are recorded under `security.<scheme>`.
    pub fn evaluate(
        &self,
        credentials: &Credentials<'_>,
        values: &mut RequestValues,
    ) -> Result<(), ApiError> {
        if self.requirements.is_empty() {
            return Ok(());
        }

        let mut met = false;
        for requirement in &self.requirements {
            if requirement.is_empty() {
                met = true;
                continue;
            }

            let found: Option<Vec<(&SchemeCheck, String)>> = requirement
                .iter()
                .map(|check| {
                    credential(&check.name, &check.scheme, credentials).map(|value| (check, value))
                })
                .collect();

            if let Some(found) = found {
                met = true;
                for (check, value) in found {
                    values.insert_security(&check.name, value, check.scopes.clone());
                }
            }
        }

        if met {
            Ok(())
        } else {
            Err(ApiError::SecurityRequirementsNotMet)
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn strip_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let (prefix, rest) = value.split_once(' ')?;
    prefix.eq_ignore_ascii_case(scheme).then(|| rest.trim())
}

/// The credential `scheme` finds in the request, if any.
fn credential(name: &str, scheme: &SecurityScheme, credentials: &Credentials<'_>) -> Option<String> {
    let value = match scheme.scheme_type {
        SecuritySchemeType::ApiKey => {
            let key = scheme.name.as_deref()?;
            match scheme.location? {
                ApiKeyLocation::Header => header(credentials.headers, key),
                ApiKeyLocation::Query => values_named(credentials.query, key).first().copied(),
                ApiKeyLocation::Cookie => values_named(credentials.cookies, key).first().copied(),
            }
        }
        SecuritySchemeType::Http => {
            let authorization = header(credentials.headers, AUTHORIZATION.as_str())?;
            match scheme.scheme.as_deref() {
                Some(kind) => strip_scheme(authorization, kind),
                None => Some(authorization),
            }
        }
        SecuritySchemeType::OAuth2 | SecuritySchemeType::OpenIdConnect => {
            let authorization = header(credentials.headers, AUTHORIZATION.as_str())?;
            Some(strip_scheme(authorization, "bearer").unwrap_or(authorization))
        }
        SecuritySchemeType::MutualTls => {
            tracing::warn!(scheme = name, "mutualTLS schemes cannot be checked per request");
            None
        }
    };
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn check(name: &str, scheme: SecurityScheme, scopes: &[&str]) -> SchemeCheck {
        SchemeCheck {
            name: name.into(),
            scheme,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn run(security: &SecurityCheck, headers: &HeaderMap, query: &[(String, String)]) -> Result<RequestValues, ApiError> {
        let mut values = RequestValues::default();
        let credentials = Credentials { headers, query, cookies: &[] };
        security.evaluate(&credentials, &mut values).map(|_| values)
    }

    #[test]
    fn no_requirements_pass() {
        let values = run(&SecurityCheck::default(), &HeaderMap::new(), &[]).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn bearer_token_is_stripped() {
        let security = SecurityCheck {
            requirements: vec![vec![check("bearer", SecurityScheme::http_bearer(), &[])]],
        };
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));

        let values = run(&security, &headers, &[]).unwrap();
        assert_eq!(values.security("bearer"), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert!(run(&security, &headers, &[]).is_err());
    }

    #[test]
    fn every_scheme_of_a_requirement_must_hold() {
        let security = SecurityCheck {
            requirements: vec![vec![
                check("key", SecurityScheme::api_key("api_key", ApiKeyLocation::Query), &[]),
                check("bearer", SecurityScheme::http_bearer(), &[]),
            ]],
        };
        let query = vec![("api_key".to_string(), "k".to_string())];
        assert!(run(&security, &HeaderMap::new(), &query).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer t"));
        let values = run(&security, &headers, &query).unwrap();
        assert_eq!(values.security("key"), Some("k"));
        assert_eq!(values.security("bearer"), Some("t"));
    }

    #[test]
    fn empty_requirement_makes_security_optional() {
        let security = SecurityCheck {
            requirements: vec![
                vec![check("bearer", SecurityScheme::http_bearer(), &[])],
                vec![],
            ],
        };
        let values = run(&security, &HeaderMap::new(), &[]).unwrap();
        assert!(values.security("bearer").is_none());
    }
}
