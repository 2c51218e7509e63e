use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.sambanova.ai/v1";
pub const API_KEY_ENV: &str = "SAMBANOVA_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read secrets file {path}: {source}")]
    ReadSecrets {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse secrets file {path}: {source}")]
    ParseSecrets {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Secrets file layout:
///
/// ```toml
/// [general]
/// SAMBANOVA_API_KEY = "..."
/// ```
#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(default)]
    general: GeneralSecrets,
}

#[derive(Debug, Default, Deserialize)]
struct GeneralSecrets {
    #[serde(rename = "SAMBANOVA_API_KEY")]
    api_key: Option<String>,
}

/// Reads the API key from a TOML secrets file. A missing entry is `Ok(None)`.
pub fn read_secrets_api_key(path: &Path) -> Result<Option<String>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadSecrets {
        path: path.to_path_buf(),
        source,
    })?;
    let secrets: SecretsFile = toml::from_str(&raw).map_err(|source| ConfigError::ParseSecrets {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(non_empty(secrets.general.api_key))
}

/// Picks the first non-empty key: command line, then environment, then secrets file.
pub fn resolve_api_key(
    cli: Option<String>,
    env: Option<String>,
    secrets: impl FnOnce() -> Option<String>,
) -> Option<String> {
    non_empty(cli)
        .or_else(|| non_empty(env))
        .or_else(|| non_empty(secrets()))
}

pub fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
