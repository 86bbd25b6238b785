//! Process-wide configuration.
//!
//! Read once at startup from the environment (after `.env` is loaded) and then
//! shared read-only through [`AppContext`](crate::core::context::AppContext).

use secrecy::SecretString;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid { key: &'static str, value: String, reason: String },
}

/// Deployment environment, mirrors the `APP_ENV` variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            _ => Err(format!("unknown environment: {}", s)),
        }
    }
}

/// Defaults used when a variable is not set
pub mod defaults {
    pub const HOST: &str = "localhost";
    pub const PORT: u16 = 8080;
    pub const CORS_ORIGIN: &str = "http://localhost:8080";
    pub const RATE_LIMIT_MAX_REQUESTS: u32 = 1000;
    pub const RATE_LIMIT_WINDOW_MS: u64 = 1000;
    /// 100 KiB request body ceiling
    pub const MAX_BODY_BYTES: usize = 100 * 1024;
    pub const PRICE_API_URL: &str = "https://api.coingecko.com/api/v3";
    pub const OUTBOUND_TIMEOUT_SECS: u64 = 10;
    pub const LOG_FILTER: &str = "info";
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Raw CORS_ORIGIN value, see [`crate::web::middleware::cors`]
    pub cors_origin: String,
    pub max_body_bytes: usize,
}

/// Rate limiting settings for the HTTP pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per client inside one window
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: defaults::RATE_LIMIT_MAX_REQUESTS,
            window: Duration::from_millis(defaults::RATE_LIMIT_WINDOW_MS),
        }
    }
}

/// Telegram bot settings
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Read from BOT_TOKEN or TELOXIDE_TOKEN
    pub token: Option<SecretString>,
    /// Custom Bot API server (BOT_API_URL)
    pub api_url: Option<Url>,
}

/// Third-party API settings
#[derive(Debug, Clone)]
pub struct OutboundConfig {
    pub price_api_url: Url,
    pub timeout: Duration,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub http: HttpConfig,
    pub rate_limit: RateLimitConfig,
    pub bot: BotConfig,
    pub outbound: OutboundConfig,
    pub log_filter: String,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// Call after `dotenvy::dotenv()` so `.env` values are visible.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = parse_or(&get, "APP_ENV", Environment::default())?;

        let http = HttpConfig {
            host: get("HOST").unwrap_or_else(|| defaults::HOST.to_string()),
            port: parse_or(&get, "PORT", defaults::PORT)?,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| defaults::CORS_ORIGIN.to_string()),
            max_body_bytes: parse_or(&get, "MAX_BODY_BYTES", defaults::MAX_BODY_BYTES)?,
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_or(&get, "COMMON_RATE_LIMIT_MAX_REQUESTS", defaults::RATE_LIMIT_MAX_REQUESTS)?,
            window: Duration::from_millis(parse_or(
                &get,
                "COMMON_RATE_LIMIT_WINDOW_MS",
                defaults::RATE_LIMIT_WINDOW_MS,
            )?),
        };

        let bot = BotConfig {
            token: get("BOT_TOKEN")
                .or_else(|| get("TELOXIDE_TOKEN"))
                .map(SecretString::from),
            api_url: get("BOT_API_URL")
                .map(|raw| parse_url("BOT_API_URL", raw))
                .transpose()?,
        };

        let price_api_url = get("PRICE_API_URL").unwrap_or_else(|| defaults::PRICE_API_URL.to_string());
        let outbound = OutboundConfig {
            price_api_url: parse_url("PRICE_API_URL", price_api_url)?,
            timeout: Duration::from_secs(parse_or(&get, "OUTBOUND_TIMEOUT_SECS", defaults::OUTBOUND_TIMEOUT_SECS)?),
        };

        Ok(Self {
            environment,
            http,
            rate_limit,
            bot,
            outbound,
            log_filter: get("RUST_LOG").unwrap_or_else(|| defaults::LOG_FILTER.to_string()),
        })
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw,
            reason: e.to_string(),
        }),
    }
}

fn parse_url(key: &'static str, raw: String) -> Result<Url, ConfigError> {
    Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        key,
        value: raw,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_addr(), "localhost:8080");
        assert_eq!(config.http.cors_origin, "http://localhost:8080");
        assert_eq!(config.http.max_body_bytes, 102400);
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert!(config.bot.token.is_none());
        assert_eq!(config.outbound.price_api_url.as_str(), "https://api.coingecko.com/api/v3");
        assert_eq!(config.outbound.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("HOST", "0.0.0.0"),
            ("PORT", "3000"),
            ("CORS_ORIGIN", "https://kombat.example"),
            ("COMMON_RATE_LIMIT_MAX_REQUESTS", "20"),
            ("COMMON_RATE_LIMIT_WINDOW_MS", "60000"),
            ("BOT_TOKEN", "123:abc"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.rate_limit.max_requests, 20);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.bot.token.as_ref().map(|t| t.expose_secret().to_string()), Some("123:abc".to_string()));
    }

    #[test]
    fn test_teloxide_token_fallback_and_empty_values() {
        let config = AppConfig::from_lookup(lookup(&[("BOT_TOKEN", "  "), ("TELOXIDE_TOKEN", "42:xyz")])).unwrap();
        assert_eq!(config.bot.token.as_ref().map(|t| t.expose_secret().to_string()), Some("42:xyz".to_string()));
    }

    #[test]
    fn test_invalid_port_names_the_key() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_invalid_environment_is_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("APP_ENV", "staging")])).is_err());
    }
}
