//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService, SigningKeys, TokenAuthority},
    database::{self, PoolSettings},
    participants::{ParticipantsService, PgParticipantsService},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub participants: Arc<dyn ParticipantsService>,
    pub auth: Arc<dyn AuthService>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build application context from a database URL and pool sizing.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        pool: PoolSettings,
        keys: SigningKeys,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect_with(url, pool)
            .await
            .map_err(AppInitError::Database)?;

        let tokens = TokenAuthority::new(keys);

        Ok(Self {
            participants: Arc::new(PgParticipantsService::new(pool.clone(), tokens.clone())),
            auth: Arc::new(PgAuthService::new(pool, tokens)),
        })
    }
}
