use std::path::Path;

use super::{ApiConfig, ConfigError};

/// Read and parse a YAML config file. Unlike `.env`, the file must exist.
pub(crate) fn read_yaml_file(path: &Path) -> Result<ApiConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    serde_yaml::from_str(&content).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Load `.env` from the working directory, if present.
pub(crate) fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

pub(crate) fn apply_env_overrides(config: &mut ApiConfig) -> Result<(), ConfigError> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply `AXOPEN_*` overrides read through `lookup`.
pub(crate) fn apply_overrides(
    config: &mut ApiConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(title) = lookup("AXOPEN_TITLE") {
        config.title = title;
    }
    if let Some(version) = lookup("AXOPEN_VERSION") {
        config.version = version;
    }
    if let Some(base_url) = lookup("AXOPEN_BASE_URL") {
        config.base_url = Some(base_url);
    }
    if let Some(limit) = lookup("AXOPEN_BODY_LIMIT") {
        config.body_limit = limit.trim().parse().map_err(|_| ConfigError::TypeMismatch {
            key: "AXOPEN_BODY_LIMIT".into(),
            expected: "usize",
        })?;
    }
    Ok(())
}
