//! Vault client for the token signing secret.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::SigningKey;

/// Key inside the KV secret that holds the signing secret.
pub const SIGNING_SECRET_FIELD: &str = "JWT_SECRET";

/// Configuration for connecting to a Vault instance.
#[derive(Clone)]
pub struct VaultConfig {
    /// Vault server address, e.g. `"http://localhost:8200"`.
    pub addr: String,

    /// Vault authentication token.
    pub token: String,

    /// KV path holding the signing secret, e.g. `"secret/amoss"`.
    pub secret_path: String,
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("addr", &self.addr)
            .field("secret_path", &self.secret_path)
            .finish_non_exhaustive()
    }
}

/// HTTP client for reading the signing secret and keeping the Vault token
/// alive.
#[derive(Debug, Clone)]
pub struct VaultClient {
    config: VaultConfig,
    http: Client,
}

impl VaultClient {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: VaultConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.config.addr.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn ensure_success(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response, SecretStoreError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        Err(SecretStoreError::UnexpectedResponse(format!(
            "{operation} request failed with status {status}: {text}"
        )))
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn signing_secret(&self) -> Result<SigningKey, SecretStoreError> {
        let response = self
            .http
            .get(self.url(&self.config.secret_path))
            .header("X-Vault-Token", &self.config.token)
            .send()
            .await?;

        let response = Self::ensure_success(response, "secret read").await?;
        let parsed: SecretResponse = response.json().await?;

        let secret = parsed
            .data
            .jwt_secret
            .ok_or(SecretStoreError::MissingSecret)?;

        if secret.is_empty() {
            return Err(SecretStoreError::MissingSecret);
        }

        Ok(SigningKey::new(secret))
    }

    async fn renew_token(&self) -> Result<Duration, SecretStoreError> {
        let response = self
            .http
            .post(self.url("auth/token/renew-self"))
            .header("X-Vault-Token", &self.config.token)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let response = Self::ensure_success(response, "token renewal").await?;
        let parsed: RenewResponse = response.json().await?;

        Ok(Duration::from_secs(parsed.auth.lease_duration))
    }

    async fn token_ttl(&self) -> Result<Duration, SecretStoreError> {
        let response = self
            .http
            .get(self.url("auth/token/lookup-self"))
            .header("X-Vault-Token", &self.config.token)
            .send()
            .await?;

        let response = Self::ensure_success(response, "token lookup").await?;
        let parsed: LookupResponse = response.json().await?;

        Ok(Duration::from_secs(parsed.data.ttl))
    }
}

#[automock]
#[async_trait]
/// Source of the token signing secret.
pub trait SecretStore: Send + Sync {
    /// Read the current signing secret.
    async fn signing_secret(&self) -> Result<SigningKey, SecretStoreError>;

    /// Extend the store's own access token. Returns the new lease.
    async fn renew_token(&self) -> Result<Duration, SecretStoreError>;

    /// Remaining lifetime of the store's access token.
    async fn token_ttl(&self) -> Result<Duration, SecretStoreError>;
}

#[derive(Deserialize)]
struct SecretResponse {
    data: SecretData,
}

#[derive(Deserialize)]
struct SecretData {
    #[serde(rename = "JWT_SECRET")]
    jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RenewResponse {
    auth: RenewAuth,
}

#[derive(Debug, Deserialize)]
struct RenewAuth {
    lease_duration: u64,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    data: LookupData,
}

#[derive(Debug, Deserialize)]
struct LookupData {
    ttl: u64,
}

/// Errors that can occur when communicating with Vault.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Vault returned a non-2xx response or unexpected body.
    #[error("unexpected response from Vault: {0}")]
    UnexpectedResponse(String),

    /// The secret exists but has no usable `JWT_SECRET` value.
    #[error("signing secret {SIGNING_SECRET_FIELD} is missing or empty")]
    MissingSecret,
}
