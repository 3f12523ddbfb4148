mod loader;

use std::path::Path;

use axopen_openapi::{Contact, ExternalDocs, License, Server, Tag, OPENAPI_VERSION};
use serde::Deserialize;

/// Request bodies larger than this are rejected unless configured otherwise.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// A required key is missing or empty.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading the config file.
    Load(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Document metadata and runtime settings for an [`ApiWrapper`](crate::ApiWrapper).
///
/// Resolution order for [`load`](Self::load) (lowest to highest priority):
/// 1. the YAML file
/// 2. `.env` (loaded into the process environment, never overwriting)
/// 3. `AXOPEN_TITLE`, `AXOPEN_VERSION`, `AXOPEN_BASE_URL`, `AXOPEN_BODY_LIMIT`
///
/// ```yaml
/// title: Petstore
/// version: 1.0.0
/// description: Sample store
/// base_url: /api
/// servers:
///   - url: https://petstore.example.com
/// tags:
///   - name: pets
///     description: Everything about pets
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub title: String,
    pub version: String,
    pub openapi: String,
    pub description: Option<String>,
    pub terms_of_service: Option<String>,
    pub contact: Option<Contact>,
    pub license: Option<License>,
    pub servers: Vec<Server>,
    pub tags: Vec<Tag>,
    pub external_docs: Option<ExternalDocs>,
    /// Prefix for live routes and the implicit server URL. Document paths are
    /// not prefixed.
    pub base_url: Option<String>,
    pub body_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            version: String::new(),
            openapi: OPENAPI_VERSION.to_string(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
            servers: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
            base_url: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ApiConfig {
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            version: version.to_string(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Parse a YAML document. Title and version are required.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ApiConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.check()
    }

    /// Load a YAML file, then apply `.env` and `AXOPEN_*` overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = loader::read_yaml_file(path.as_ref())?;
        loader::load_dotenv();
        loader::apply_env_overrides(&mut config)?;
        config.check()
    }

    fn check(self) -> Result<Self, ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::NotFound("title".into()));
        }
        if self.version.trim().is_empty() {
            return Err(ConfigError::NotFound("version".into()));
        }
        Ok(self)
    }
}
