use anyhow::Result;
use async_trait::async_trait;
use std::env;

/// Trait for retrieving the API token, abstracting the source (Env, Vault, host, etc.)
///
/// The dispatcher never looks at the token; it is attached to each request
/// by the HTTP transport.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

/// Reads the token from an environment variable on every call, so rotated
/// tokens are picked up without rebuilding the transport.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    key: String,
}

impl EnvCredentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn bearer_token(&self) -> Result<String> {
        match env::var(&self.key) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            Ok(_) => Err(anyhow::anyhow!("Secret '{}' is empty", self.key)),
            Err(_) => Err(anyhow::anyhow!(
                "Secret '{}' not found in environment",
                self.key
            )),
        }
    }
}

/// A fixed token handed over by the host.
#[derive(Clone)]
pub struct StaticCredentials(String);

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticCredentials(***)")
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn bearer_token(&self) -> Result<String> {
        if self.0.trim().is_empty() {
            return Err(anyhow::anyhow!("Static token is empty"));
        }
        Ok(self.0.clone())
    }
}
