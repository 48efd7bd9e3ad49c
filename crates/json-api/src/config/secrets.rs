//! Secret Store Config

use std::time::Duration;

use clap::Args;

use amoss_app::auth::{VaultConfig, rotation::DEFAULT_RENEW_INTERVAL};

/// Vault settings for the token signing secret.
#[derive(Debug, Args)]
pub struct SecretStoreConfig {
    /// Vault server address
    #[arg(long, env = "VAULT_ADDR")]
    pub vault_addr: String,

    /// Vault authentication token
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub vault_token: String,

    /// KV path holding the `JWT_SECRET` field
    #[arg(long, env = "VAULT_SECRET_PATH", default_value = "secret/amoss")]
    pub vault_secret_path: String,

    /// Seconds between Vault token renewals
    #[arg(
        long,
        env = "VAULT_RENEW_INTERVAL_SECONDS",
        default_value_t = DEFAULT_RENEW_INTERVAL.as_secs()
    )]
    pub vault_renew_interval_seconds: u64,

    /// Seconds between signing secret re-reads; unset disables refresh
    #[arg(long, env = "SIGNING_KEY_REFRESH_SECONDS")]
    pub signing_key_refresh_seconds: Option<u64>,
}

impl SecretStoreConfig {
    /// Connection settings for the Vault client.
    #[must_use]
    pub fn vault_config(&self) -> VaultConfig {
        VaultConfig {
            addr: self.vault_addr.clone(),
            token: self.vault_token.clone(),
            secret_path: self.vault_secret_path.clone(),
        }
    }

    /// Interval between token renewals. Zero falls back to the default.
    #[must_use]
    pub fn renew_interval(&self) -> Duration {
        match self.vault_renew_interval_seconds {
            0 => DEFAULT_RENEW_INTERVAL,
            seconds => Duration::from_secs(seconds),
        }
    }

    /// Interval between signing secret refreshes, when enabled.
    #[must_use]
    pub fn key_refresh_interval(&self) -> Option<Duration> {
        self.signing_key_refresh_seconds
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
    }
}
