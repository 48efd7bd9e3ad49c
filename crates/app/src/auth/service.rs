//! Auth service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;

use crate::{
    auth::{
        AuthorizeError, RoutePolicy, SessionClaims, TokenAuthority, authorize,
        parse_authorization_header,
    },
    participants::{IdentityStore, PgIdentityStore},
};

#[derive(Clone)]
pub struct PgAuthService {
    tokens: TokenAuthority,
    identities: Arc<dyn IdentityStore>,
}

impl std::fmt::Debug for PgAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgAuthService")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl PgAuthService {
    #[must_use]
    pub fn new(pool: PgPool, tokens: TokenAuthority) -> Self {
        Self::from_store(Arc::new(PgIdentityStore::new(pool)), tokens)
    }

    #[must_use]
    pub fn from_store(identities: Arc<dyn IdentityStore>, tokens: TokenAuthority) -> Self {
        Self { tokens, identities }
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authorize(
        &self,
        policy: RoutePolicy,
        header: &str,
    ) -> Result<SessionClaims, AuthorizeError> {
        let claims = authorize(&self.tokens, policy.scheme, policy.required, header)?;

        if policy.single_session {
            let token = parse_authorization_header(header, policy.scheme)?;

            let current = self
                .identities
                .compare_current_token(claims.participant_id, token)
                .await
                .map_err(AuthorizeError::Upstream)?;

            if !current {
                return Err(AuthorizeError::SessionSuperseded);
            }
        }

        Ok(claims)
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check a raw `Authorization` header against a route's policy.
    async fn authorize(
        &self,
        policy: RoutePolicy,
        header: &str,
    ) -> Result<SessionClaims, AuthorizeError>;
}
