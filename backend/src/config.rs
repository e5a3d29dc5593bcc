//! Process configuration loaded from environment variables.
//!
//! Storage selection is handled separately by
//! [`RepositoryFactory`](crate::db::RepositoryFactory); everything else the
//! server needs at startup is collected here.

use std::str::FromStr;
use std::time::Duration;

use crate::provider::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::provider::GeminiConfig;
use crate::services::RetryPolicy;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SESSION_COOKIE: &str = "planner_session";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Configuration errors are fatal at startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY (or PROVIDER_API_KEY) must be set")]
    MissingApiKey,

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// How the session cookie is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            secure: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub gemini: GeminiConfig,
    pub retry: RetryPolicy,
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
    pub cors_allowed_origin: String,
}

impl PlannerConfig {
    /// Read configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `GEMINI_API_KEY` or `PROVIDER_API_KEY` (required)
    /// - `GEMINI_MODEL`, `GEMINI_BASE_URL`
    /// - `PROVIDER_TIMEOUT_SEC` (default: 30)
    /// - `SYNTHESIS_MAX_RETRIES` (default: 2)
    /// - `SYNTHESIS_RETRY_BACKOFF_MS` (default: 500)
    /// - `HOST` (default: 0.0.0.0), `PORT` (default: 8080)
    /// - `SESSION_COOKIE_NAME` (default: planner_session)
    /// - `SESSION_COOKIE_SECURE` (default: false)
    /// - `CORS_ALLOWED_ORIGIN` (default: http://localhost:5173)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("GEMINI_API_KEY")
            .or_else(|| get("PROVIDER_API_KEY"))
            .ok_or(ConfigError::MissingApiKey)?;

        let timeout_sec: u64 = parse_or(get("PROVIDER_TIMEOUT_SEC"), "PROVIDER_TIMEOUT_SEC", 30)?;
        if timeout_sec == 0 {
            return Err(ConfigError::Invalid {
                key: "PROVIDER_TIMEOUT_SEC",
                value: "0".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }
        let timeout = Duration::from_secs(timeout_sec);

        let mut gemini = GeminiConfig::new(api_key);
        gemini.model = get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        gemini.base_url = get("GEMINI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        gemini.request_timeout = timeout;

        let retry = RetryPolicy {
            max_retries: parse_or(get("SYNTHESIS_MAX_RETRIES"), "SYNTHESIS_MAX_RETRIES", 2)?,
            attempt_timeout: timeout,
            backoff: Duration::from_millis(parse_or(
                get("SYNTHESIS_RETRY_BACKOFF_MS"),
                "SYNTHESIS_RETRY_BACKOFF_MS",
                500,
            )?),
        };

        let session = SessionConfig {
            cookie_name: get("SESSION_COOKIE_NAME")
                .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string()),
            secure: parse_flag(get("SESSION_COOKIE_SECURE"), "SESSION_COOKIE_SECURE")?,
        };
        if !is_cookie_token(&session.cookie_name) {
            return Err(ConfigError::Invalid {
                key: "SESSION_COOKIE_NAME",
                value: session.cookie_name,
                reason: "not a valid cookie name".to_string(),
            });
        }

        Ok(Self {
            gemini,
            retry,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT)?,
            session,
            cors_allowed_origin: get("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_flag(raw: Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    let lowered = raw.as_deref().map(str::to_ascii_lowercase);
    match lowered.as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
            reason: "expected true or false".to_string(),
        }),
    }
}

// RFC 6265 token characters.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}
