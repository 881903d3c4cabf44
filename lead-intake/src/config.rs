//! Backend location
//!
//! The intake backend is selected by a single base URL. Every form endpoint
//! is a path resolved against it.

use url::Url;

pub const API_URL_VAR: &str = "INTAKE_API_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: Url,
}

impl Config {
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        let api_base_url = Url::parse(api_base_url.trim())
            .map_err(|e| ConfigError::InvalidUrl(api_base_url.to_string(), e.to_string()))?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(
                api_base_url.to_string(),
                "scheme must be http or https".to_string(),
            ));
        }
        Ok(Self { api_base_url })
    }

    /// Load from `INTAKE_API_URL`, reading `.env` first when present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let raw = std::env::var(API_URL_VAR).map_err(|_| ConfigError::Missing(API_URL_VAR))?;
        Self::new(&raw)
    }

    /// Absolute URL for an endpoint path, keeping any path prefix of the base
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not found")]
    Missing(&'static str),
    #[error("invalid URL {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let config = Config::new("https://api.example.com/").unwrap();
        assert_eq!(config.endpoint_url("/api/reviews"), "https://api.example.com/api/reviews");
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let config = Config::new("http://127.0.0.1:4001/v2").unwrap();
        assert_eq!(config.endpoint_url("api/gallery"), "http://127.0.0.1:4001/v2/api/gallery");
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(Config::new("not a url"), Err(ConfigError::InvalidUrl(..))));
        assert!(matches!(Config::new("ftp://files.example.com"), Err(ConfigError::InvalidUrl(..))));
    }
}
