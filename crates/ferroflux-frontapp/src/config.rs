use crate::error::{DispatchError, DispatchResult};
use crate::transport::{RetryMode, RetryPolicy};
use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.frontapp.com/";
pub const DEFAULT_TOKEN_ENV: &str = "FRONTAPP_API_TOKEN";

/// Settings for the Frontapp connector.
///
/// Resolution order: defaults, then an optional YAML file, then environment
/// variables (`.env` is honoured).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FrontappConfig {
    /// API root every route template is joined onto.
    pub base_url: String,
    /// Per-call timeout, on top of the retry schedule.
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
    /// Items in flight at once. 1 means strictly sequential.
    pub concurrency: usize,
    /// Environment variable holding the bearer token.
    pub token_env: String,
}

impl Default for FrontappConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            retry: RetryPolicy::default(),
            concurrency: 1,
            token_env: DEFAULT_TOKEN_ENV.to_string(),
        }
    }
}

impl FrontappConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> DispatchResult<Self> {
        let _ = dotenv::dotenv();
        let mut config = Self::default();
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Reads a YAML file, then applies environment overrides.
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let mut config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML: {:?}", path))?;

        let _ = dotenv::dotenv();
        config.apply_env(|key| env::var(key).ok())?;
        tracing::info!(base_url = %config.base_url, "Loaded Frontapp config");
        Ok(config)
    }

    /// Overlays values from `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> DispatchResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("FRONTAPP_BASE_URL") {
            self.base_url = url;
        }
        if let Some(raw) = lookup("FRONTAPP_TIMEOUT_SECS") {
            self.timeout_secs = parse_var("FRONTAPP_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("FRONTAPP_RETRY_ATTEMPTS") {
            self.retry.max_attempts = parse_var("FRONTAPP_RETRY_ATTEMPTS", &raw)?;
        }
        if let Some(raw) = lookup("FRONTAPP_RETRY_MODE") {
            self.retry.mode = match raw.trim() {
                "any_failure" => RetryMode::AnyFailure,
                "transient_only" => RetryMode::TransientOnly,
                other => {
                    return Err(DispatchError::Config {
                        key: "FRONTAPP_RETRY_MODE".to_string(),
                        reason: format!("unknown mode \"{}\"", other),
                    });
                }
            };
        }
        if let Some(raw) = lookup("FRONTAPP_CONCURRENCY") {
            self.concurrency = parse_var("FRONTAPP_CONCURRENCY", &raw)?;
        }
        if let Some(name) = lookup("FRONTAPP_TOKEN_ENV") {
            self.token_env = name;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The parsed base URL, always ending in `/` so templates join beneath it.
    pub fn base_url(&self) -> DispatchResult<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| DispatchError::Config {
            key: "base_url".to_string(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(DispatchError::Config {
                key: "base_url".to_string(),
                reason: format!("\"{}\" cannot be used as a base URL", raw),
            });
        }
        Ok(url)
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> DispatchResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| DispatchError::Config {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
