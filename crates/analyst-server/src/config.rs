//! Listener, CORS and store settings

use analyst_utils::{EnvSource, EnvSourceExt, ProcessEnv};
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `*` allows any origin
    pub cors_origins: Vec<String>,
    /// `None` runs on the in-memory store
    pub redis_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            redis_url: Some(DEFAULT_REDIS_URL.to_string()),
        }
    }
}

impl ServerConfig {
    /// Read `API_HOST`, `API_PORT`, `CORS_ALLOW_ORIGINS` and `REDIS_URL`
    pub fn from_env() -> Self {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source<S: EnvSource + ?Sized>(env: &S) -> Self {
        let defaults = Self::default();
        // Set-but-empty REDIS_URL turns Redis off
        let redis_url = match env.var("REDIS_URL") {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(raw.trim().to_string()),
            None => defaults.redis_url,
        };
        Self {
            host: env.string_or("API_HOST", &defaults.host),
            port: env.parse_or("API_PORT", defaults.port),
            cors_origins: env
                .list("CORS_ALLOW_ORIGINS")
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.cors_origins),
            redis_url,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if self.cors_origins.iter().any(|o| o == "*") {
            return layer.allow_origin(Any);
        }
        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_source(&[("UNRELATED", "1")]);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_source(&[
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "9100"),
            ("CORS_ALLOW_ORIGINS", "http://localhost:3000, https://example.com"),
            ("REDIS_URL", "redis://cache:6379/1"),
        ]);
        assert_eq!(config.bind_addr(), "127.0.0.1:9100");
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "https://example.com"]
        );
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379/1"));
    }

    #[test]
    fn test_empty_redis_url_disables_redis() {
        let config = ServerConfig::from_source(&[("REDIS_URL", "  ")]);
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = ServerConfig::from_source(&[("API_PORT", "eighty")]);
        assert_eq!(config.port, 8000);
    }
}
