use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Key for the platform data API. Empty until search/playlists exist.
    pub youtube_api_key: String,
    /// Origin the transcript source talks to. Overridden in tests.
    pub youtube_base_url: String,
    pub upstream_timeout: Duration,
    /// Zero disables the transcript cache.
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub allowed_origins: Vec<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            bind_addr: parse(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            youtube_api_key: get("YOUTUBE_API_KEY").unwrap_or_default(),
            youtube_base_url: get("YOUTUBE_BASE_URL")
                .unwrap_or_else(|| "https://www.youtube.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            upstream_timeout: Duration::from_secs(positive(
                "UPSTREAM_TIMEOUT_SECS",
                parse(&get, "UPSTREAM_TIMEOUT_SECS", 10)?,
            )?),
            cache_ttl: Duration::from_secs(parse(&get, "CACHE_TTL_SECS", 0)?),
            cache_capacity: parse(&get, "CACHE_CAPACITY", 1024)?,
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| vec!["http://localhost:5173".to_string()]),
        })
    }
}

fn parse<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive(key: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
