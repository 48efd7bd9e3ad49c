//! Background upkeep of the signing key and the secret store token.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::auth::{SecretStore, SecretStoreError, SigningKeys};

/// Default interval between secret store token renewals: seven days.
pub const DEFAULT_RENEW_INTERVAL: Duration = Duration::from_secs(604_800);

/// Re-read the signing secret and publish it when it changed.
///
/// Returns `true` when a new key was published. On error the current key stays
/// active.
///
/// # Errors
///
/// Returns an error when the secret store cannot be read.
pub async fn refresh_signing_key(
    store: &dyn SecretStore,
    keys: &SigningKeys,
) -> Result<bool, SecretStoreError> {
    let key = store.signing_secret().await?;

    Ok(keys.rotate(key))
}

/// Renew the secret store token every `interval`.
pub fn spawn_token_renewal(store: Arc<dyn SecretStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match store.renew_token().await {
                Ok(lease) => tracing::info!(lease_seconds = lease.as_secs(), "renewed secret store token"),
                Err(error) => tracing::error!(%error, "failed to renew secret store token"),
            }

            match store.token_ttl().await {
                Ok(ttl) => tracing::debug!(ttl_seconds = ttl.as_secs(), "secret store token ttl"),
                Err(error) => tracing::warn!(%error, "failed to look up secret store token ttl"),
            }
        }
    })
}

/// Re-read the signing secret every `interval`.
pub fn spawn_key_refresh(
    store: Arc<dyn SecretStore>,
    keys: SigningKeys,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match refresh_signing_key(store.as_ref(), &keys).await {
                Ok(true) => tracing::info!("signing key rotated"),
                Ok(false) => tracing::debug!("signing key unchanged"),
                Err(error) => tracing::error!(%error, "failed to refresh signing key"),
            }
        }
    })
}
