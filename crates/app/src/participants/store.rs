//! Identity store.

use async_trait::async_trait;
use mockall::automock;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Postgres, query, query_as, query_scalar};

use crate::{
    auth::{ParticipantId, PasswordCredential},
    participants::{data::NewParticipant, records::ParticipantProfile},
};

const FIND_PROFILE_SQL: &str = include_str!("sql/find_profile.sql");
const FIND_PASSWORD_HASH_SQL: &str = include_str!("sql/find_password_hash.sql");
const STORE_ACCESS_TOKEN_SQL: &str = include_str!("sql/store_access_token.sql");
const FIND_ACCESS_TOKEN_HASH_SQL: &str = include_str!("sql/find_access_token_hash.sql");
const UPDATE_CREDENTIALS_SQL: &str = include_str!("sql/update_credentials.sql");
const CREATE_PARTICIPANT_SQL: &str = include_str!("sql/create_participant.sql");
const PARTICIPANT_EXISTS_SQL: &str = include_str!("sql/participant_exists.sql");
const FIND_BY_EMAIL_HASH_SQL: &str = include_str!("sql/find_participant_by_email_hash.sql");

#[automock]
#[async_trait]
/// Participant identity persistence.
pub trait IdentityStore: Send + Sync {
    /// Role, study and current credential of a participant, read from one row.
    async fn find_role_and_study(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Option<ParticipantProfile>, sqlx::Error>;

    /// Stored password hash of a participant.
    async fn find_password_hash(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Option<String>, sqlx::Error>;

    /// Record `token` as the participant's only valid session.
    async fn store_current_token(
        &self,
        participant_id: ParticipantId,
        token: &str,
    ) -> Result<(), sqlx::Error>;

    /// Whether `token` is the participant's current session.
    async fn compare_current_token(
        &self,
        participant_id: ParticipantId,
        token: &str,
    ) -> Result<bool, sqlx::Error>;

    /// Replace a participant's salt and hash. Returns `false` when the
    /// participant does not exist.
    async fn update_credentials(
        &self,
        participant_id: ParticipantId,
        credential: &PasswordCredential,
    ) -> Result<bool, sqlx::Error>;

    /// Insert a new participant.
    async fn insert_participant(&self, participant: &NewParticipant) -> Result<(), sqlx::Error>;

    /// Whether a participant with this ID exists.
    async fn participant_exists(&self, participant_id: ParticipantId) -> Result<bool, sqlx::Error>;

    /// Participant registered with the given email digest.
    async fn find_participant_by_email_hash(
        &self,
        email_hash: &str,
    ) -> Result<Option<ParticipantId>, sqlx::Error>;
}

/// PostgreSQL-backed identity store.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_role_and_study(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Option<ParticipantProfile>, sqlx::Error> {
        query_as::<Postgres, ParticipantProfile>(FIND_PROFILE_SQL)
            .bind(participant_id.get())
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_password_hash(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Option<String>, sqlx::Error> {
        query_scalar::<Postgres, String>(FIND_PASSWORD_HASH_SQL)
            .bind(participant_id.get())
            .fetch_optional(&self.pool)
            .await
    }

    async fn store_current_token(
        &self,
        participant_id: ParticipantId,
        token: &str,
    ) -> Result<(), sqlx::Error> {
        let result = query(STORE_ACCESS_TOKEN_SQL)
            .bind(participant_id.get())
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn compare_current_token(
        &self,
        participant_id: ParticipantId,
        token: &str,
    ) -> Result<bool, sqlx::Error> {
        let stored = query_scalar::<Postgres, Option<String>>(FIND_ACCESS_TOKEN_HASH_SQL)
            .bind(participant_id.get())
            .fetch_optional(&self.pool)
            .await?
            .flatten();

        Ok(stored.is_some_and(|stored| stored == hash_token(token)))
    }

    async fn update_credentials(
        &self,
        participant_id: ParticipantId,
        credential: &PasswordCredential,
    ) -> Result<bool, sqlx::Error> {
        let result = query(UPDATE_CREDENTIALS_SQL)
            .bind(participant_id.get())
            .bind(&credential.salt)
            .bind(&credential.hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_participant(&self, participant: &NewParticipant) -> Result<(), sqlx::Error> {
        query(CREATE_PARTICIPANT_SQL)
            .bind(participant.participant_id.get())
            .bind(&participant.credential.hash)
            .bind(&participant.credential.salt)
            .bind(participant.capacity.as_str())
            .bind(participant.study.as_deref())
            .bind(participant.is_consented)
            .bind(participant.email_hash.as_deref())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn participant_exists(&self, participant_id: ParticipantId) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(PARTICIPANT_EXISTS_SQL)
            .bind(participant_id.get())
            .fetch_one(&self.pool)
            .await
    }

    async fn find_participant_by_email_hash(
        &self,
        email_hash: &str,
    ) -> Result<Option<ParticipantId>, sqlx::Error> {
        query_scalar::<Postgres, i64>(FIND_BY_EMAIL_HASH_SQL)
            .bind(email_hash)
            .fetch_optional(&self.pool)
            .await?
            .map(|raw| {
                ParticipantId::try_from(raw).map_err(|error| sqlx::Error::Decode(Box::new(error)))
            })
            .transpose()
    }
}

/// Only a digest of the current session token is stored.
fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
