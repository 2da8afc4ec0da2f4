//! Service configuration parsed from environment variables.
//!
//! `.env` is loaded by `main` before [`AppConfig::from_env`] runs, so every
//! value here may come from either the process environment or that file.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_FUSIONAUTH_PROVIDER_ID: &str = "oidc.fusionauth";
pub const DEFAULT_VIEW_IDLE_SECS: u64 = 1800;
pub const DEFAULT_VIEW_SWEEP_SECS: u64 = 60;
pub const DEFAULT_MAX_VIEWS: usize = 10_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Identity Toolkit connection settings. Absent API key means every provider
/// call fails as unconfigured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub fusionauth_provider_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Mark session cookies `Secure`. Only turned off for plain-HTTP local dev.
    pub cookie_secure: bool,
    /// Externally visible origin, used to build redirect callback URIs.
    pub public_base_url: String,
    pub identity: IdentityConfig,
    pub view_idle: Duration,
    pub view_sweep: Duration,
    /// Upper bound on live page views; the stalest view goes first when full.
    pub max_views: usize,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `COOKIE_SECURE`: default true
    /// - `PUBLIC_BASE_URL`: default `http://localhost:{PORT}`
    /// - `FIREBASE_API_KEY`: provider sign-in disabled when absent
    /// - `IDENTITY_TOOLKIT_URL`: default Identity Toolkit v1 endpoint
    /// - `FUSIONAUTH_PROVIDER_ID`: default `oidc.fusionauth`
    /// - `VIEW_IDLE_SECS`: default 1800
    /// - `VIEW_SWEEP_SECS`: default 60
    /// - `MAX_VIEWS`: default 10000
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when a variable is set but malformed,
    /// or when one of the view settings is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_parse("PORT", DEFAULT_PORT)?;
        let cookie_secure = match std::env::var("COOKIE_SECURE") {
            Ok(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { key: "COOKIE_SECURE", value: raw })?,
            Err(_) => true,
        };
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let identity = IdentityConfig {
            api_key: std::env::var("FIREBASE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: std::env::var("IDENTITY_TOOLKIT_URL")
                .unwrap_or_else(|_| DEFAULT_IDENTITY_TOOLKIT_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            fusionauth_provider_id: std::env::var("FUSIONAUTH_PROVIDER_ID")
                .unwrap_or_else(|_| DEFAULT_FUSIONAUTH_PROVIDER_ID.to_string()),
        };

        Ok(Self {
            port,
            cookie_secure,
            public_base_url,
            identity,
            view_idle: Duration::from_secs(env_nonzero("VIEW_IDLE_SECS", DEFAULT_VIEW_IDLE_SECS)?),
            view_sweep: Duration::from_secs(env_nonzero("VIEW_SWEEP_SECS", DEFAULT_VIEW_SWEEP_SECS)?),
            max_views: env_nonzero("MAX_VIEWS", DEFAULT_MAX_VIEWS)?,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cookie_secure: true,
            public_base_url: format!("http://localhost:{DEFAULT_PORT}"),
            identity: IdentityConfig {
                api_key: None,
                base_url: DEFAULT_IDENTITY_TOOLKIT_URL.to_string(),
                fusionauth_provider_id: DEFAULT_FUSIONAUTH_PROVIDER_ID.to_string(),
            },
            view_idle: Duration::from_secs(DEFAULT_VIEW_IDLE_SECS),
            view_sweep: Duration::from_secs(DEFAULT_VIEW_SWEEP_SECS),
            max_views: DEFAULT_MAX_VIEWS,
        }
    }
}

/// Parse `1/true/yes/on` and `0/false/no/off`, case-insensitive.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Like [`env_parse`], but zero is rejected.
fn env_nonzero<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq + ToString,
{
    let value = env_parse(key, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid { key, value: value.to_string() });
    }
    Ok(value)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
