//! Depot helper extensions.

use std::any::Any;

use amoss_app::auth::SessionClaims;
use salvo::prelude::Depot;

use crate::errors::ApiError;

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError>;

    fn insert_session_claims(&mut self, claims: SessionClaims);

    /// Claims placed by the authorization middleware.
    fn session_claims_or_401(&self) -> Result<&SessionClaims, ApiError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError> {
        self.obtain::<T>().map_err(|_ignored| ApiError::internal())
    }

    fn insert_session_claims(&mut self, claims: SessionClaims) {
        self.inject(claims);
    }

    fn session_claims_or_401(&self) -> Result<&SessionClaims, ApiError> {
        self.obtain::<SessionClaims>()
            .map_err(|_ignored| ApiError::invalid_token())
    }
}
