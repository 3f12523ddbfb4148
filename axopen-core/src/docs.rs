//! Serving and writing the generated document.

use std::path::Path;

use axopen_openapi::{apply_filters, Document, TagFilter};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use tracing::error;

use crate::error::error_response;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Yaml,
}

impl SpecFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            SpecFormat::Json => "application/json",
            SpecFormat::Yaml => "application/yaml",
        }
    }
}

#[derive(Debug)]
pub enum SpecError {
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for SpecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecError::Json(e) => write!(f, "Spec JSON error: {e}"),
            SpecError::Yaml(e) => write!(f, "Spec YAML error: {e}"),
            SpecError::Io(e) => write!(f, "Spec write error: {e}"),
        }
    }
}

impl std::error::Error for SpecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpecError::Json(e) => Some(e),
            SpecError::Yaml(e) => Some(e),
            SpecError::Io(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for SpecError {
    fn from(e: serde_json::Error) -> Self {
        SpecError::Json(e)
    }
}

impl From<serde_yaml::Error> for SpecError {
    fn from(e: serde_yaml::Error) -> Self {
        SpecError::Yaml(e)
    }
}

impl From<std::io::Error> for SpecError {
    fn from(e: std::io::Error) -> Self {
        SpecError::Io(e)
    }
}

/// Serialize `doc` after applying `filters`.
pub fn render(doc: &Document, format: SpecFormat, filters: &[TagFilter]) -> Result<String, SpecError> {
    let doc = apply_filters(doc, filters);
    Ok(match format {
        SpecFormat::Json => serde_json::to_string_pretty(&doc)?,
        SpecFormat::Yaml => serde_yaml::to_string(&doc)?,
    })
}

pub(crate) fn write(
    doc: &Document,
    format: SpecFormat,
    filters: &[TagFilter],
    path: &Path,
) -> Result<(), SpecError> {
    std::fs::write(path, render(doc, format, filters)?)?;
    Ok(())
}

/// Swagger UI page loading the document from `spec_url`, with assets from
/// cdnjs at `version`.
pub fn swagger_ui_html(title: &str, spec_url: &str, version: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <link rel="stylesheet" type="text/css" href="https://cdnjs.cloudflare.com/ajax/libs/swagger-ui/{version}/swagger-ui.min.css" />
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="https://cdnjs.cloudflare.com/ajax/libs/swagger-ui/{version}/swagger-ui-bundle.min.js" charset="UTF-8"></script>
    <script src="https://cdnjs.cloudflare.com/ajax/libs/swagger-ui/{version}/swagger-ui-standalone-preset.min.js" charset="UTF-8"></script>
    <script>
      window.onload = function() {{
        window.ui = SwaggerUIBundle({{
          url: "{spec_url}",
          dom_id: '#swagger-ui',
          deepLinking: true,
          presets: [
            SwaggerUIBundle.presets.apis,
            SwaggerUIStandalonePreset
          ],
          plugins: [
            SwaggerUIBundle.plugins.DownloadUrl
          ],
          layout: "StandaloneLayout"
        }});
      }};
    </script>
  </body>
</html>
"#
    )
}

/// A documentation route, installed once the document is complete.
#[derive(Debug, Clone)]
pub(crate) enum DocsRoute {
    Spec {
        path: String,
        format: SpecFormat,
        filters: Vec<TagFilter>,
    },
    Ui {
        path: String,
        spec_url: String,
        version: String,
    },
}

/// Add `routes` to `router`. Documentation routes bypass the validation
/// pipeline and do not appear in the document.
pub(crate) fn install<S>(mut router: Router<S>, routes: Vec<DocsRoute>, doc: &Document) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    for route in routes {
        router = match route {
            DocsRoute::Spec {
                path,
                format,
                filters,
            } => {
                let body = match render(doc, format, &filters) {
                    Ok(body) => Some(Bytes::from(body)),
                    Err(err) => {
                        error!(path = %path, error = %err, "failed to render the API document");
                        None
                    }
                };
                let content_type = format.content_type();
                router.route(
                    &path,
                    get(move || async move {
                        match body {
                            Some(body) => ([(CONTENT_TYPE, content_type)], body).into_response(),
                            None => error_response(
                                StatusCode::INTERNAL_SERVER_ERROR,
                                "API document unavailable",
                            ),
                        }
                    }),
                )
            }
            DocsRoute::Ui {
                path,
                spec_url,
                version,
            } => {
                let page = swagger_ui_html(&doc.info.title, &spec_url, &version);
                router.route(&path, get(move || async move { Html(page) }))
            }
        };
    }
    router
}
