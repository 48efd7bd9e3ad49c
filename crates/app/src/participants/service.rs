//! Participants service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rand::{Rng, rngs::OsRng};
use sqlx::PgPool;
use tokio::task;

use crate::{
    auth::{
        Capacity, ParticipantId, PasswordCredential, SessionClaims, TokenAuthority, hash_email,
        is_known_study, verify_password, verify_without_credential,
    },
    participants::{
        data::{
            LoginRequest, LoginSession, NewAdmin, NewParticipant, NewRegistration, PasswordReset,
            RegisteredParticipant,
        },
        errors::ParticipantsServiceError,
        store::{IdentityStore, PgIdentityStore},
    },
};

/// Range unique participant IDs are drawn from, before normalization.
pub const UNIQUE_ID_RANGE: std::ops::RangeInclusive<i64> = 100_000..=999_999;

/// Draws attempted before giving up on finding an unused ID.
pub const MAX_UNIQUE_ID_ATTEMPTS: usize = 64;

#[derive(Clone)]
pub struct PgParticipantsService {
    store: Arc<dyn IdentityStore>,
    tokens: TokenAuthority,
}

impl std::fmt::Debug for PgParticipantsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgParticipantsService")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl PgParticipantsService {
    #[must_use]
    pub fn new(pool: PgPool, tokens: TokenAuthority) -> Self {
        Self::from_store(Arc::new(PgIdentityStore::new(pool)), tokens)
    }

    #[must_use]
    pub fn from_store(store: Arc<dyn IdentityStore>, tokens: TokenAuthority) -> Self {
        Self { store, tokens }
    }
}

#[async_trait]
impl ParticipantsService for PgParticipantsService {
    async fn login(&self, request: LoginRequest) -> Result<LoginSession, ParticipantsServiceError> {
        let participant_id = match request.email() {
            Some(email) => {
                let email_hash = hash_email(email, &self.tokens.keys().current());

                self.store.find_participant_by_email_hash(&email_hash).await?
            }
            None => Some(ParticipantId::normalize(request.participant_id)?),
        };

        let profile = match participant_id {
            Some(participant_id) => self.store.find_role_and_study(participant_id).await?,
            None => None,
        };

        let password = request.password;

        let Some(profile) = profile else {
            task::spawn_blocking(move || verify_without_credential(&password)).await?;

            tracing::info!("login rejected: no such participant");

            return Err(ParticipantsServiceError::InvalidCredentials);
        };

        let participant_id = profile.participant_id;
        let stored_hash = profile.password_hash.clone();
        let salt = profile.password_salt.clone();

        let (valid, password) = task::spawn_blocking(move || {
            let valid = verify_password(&stored_hash, &salt, &password);
            (valid, password)
        })
        .await?;

        if !valid {
            tracing::info!(%participant_id, "login rejected");
            return Err(ParticipantsServiceError::InvalidCredentials);
        }

        let rotated = create_credential(password).await?;

        self.store
            .update_credentials(participant_id, &rotated)
            .await?;

        let issued = self
            .tokens
            .issue(profile.capacity, profile.study.as_deref(), participant_id)?;

        self.store
            .store_current_token(participant_id, &issued.token)
            .await?;

        tracing::info!(%participant_id, capacity = %profile.capacity, "participant logged in");

        Ok(LoginSession {
            token: issued.token,
            claims: issued.claims,
            is_consented: profile.is_consented,
        })
    }

    async fn register(
        &self,
        creator: &SessionClaims,
        capacity: Capacity,
        registration: NewRegistration,
    ) -> Result<RegisteredParticipant, ParticipantsServiceError> {
        let study = assign_study(creator, capacity, registration.study.as_deref())?;
        let participant_id = ParticipantId::normalize(registration.participant_id)?;
        let credential = create_credential(registration.password).await?;
        let email_hash = registration
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(|email| hash_email(email, &self.tokens.keys().current()));

        self.store
            .insert_participant(&NewParticipant {
                participant_id,
                capacity,
                study: Some(study.clone()),
                credential,
                is_consented: registration.is_consented,
                email_hash,
            })
            .await?;

        tracing::info!(
            %participant_id,
            %capacity,
            creator = %creator.participant_id,
            "participant registered"
        );

        Ok(RegisteredParticipant {
            participant_id,
            capacity,
            study: Some(study),
        })
    }

    async fn create_admin(
        &self,
        admin: NewAdmin,
    ) -> Result<RegisteredParticipant, ParticipantsServiceError> {
        let participant_id = ParticipantId::normalize(admin.participant_id)?;
        let credential = create_credential(admin.password).await?;

        self.store
            .insert_participant(&NewParticipant {
                participant_id,
                capacity: Capacity::Admin,
                study: None,
                credential,
                is_consented: true,
                email_hash: None,
            })
            .await?;

        tracing::info!(%participant_id, "admin created");

        Ok(RegisteredParticipant {
            participant_id,
            capacity: Capacity::Admin,
            study: None,
        })
    }

    async fn generate_unique_id(&self) -> Result<i64, ParticipantsServiceError> {
        for _ in 0..MAX_UNIQUE_ID_ATTEMPTS {
            let candidate = OsRng.gen_range(UNIQUE_ID_RANGE);

            if !self
                .store
                .participant_exists(ParticipantId::normalize(candidate)?)
                .await?
            {
                return Ok(candidate);
            }
        }

        tracing::warn!(attempts = MAX_UNIQUE_ID_ATTEMPTS, "unique participant id space exhausted");

        Err(ParticipantsServiceError::UniqueIdExhausted(
            MAX_UNIQUE_ID_ATTEMPTS,
        ))
    }

    async fn recover_password(&self, reset: PasswordReset) -> Result<(), ParticipantsServiceError> {
        let participant_id = ParticipantId::normalize(reset.participant_id)?;

        if !self.store.participant_exists(participant_id).await? {
            return Err(ParticipantsServiceError::NotFound);
        }

        let credential = create_credential(reset.password).await?;

        if !self
            .store
            .update_credentials(participant_id, &credential)
            .await?
        {
            return Err(ParticipantsServiceError::NotFound);
        }

        tracing::info!(%participant_id, "password reset");

        Ok(())
    }
}

#[automock]
#[async_trait]
/// Participant account operations.
pub trait ParticipantsService: Send + Sync {
    /// Check a password, roll the stored credential and open a new session.
    async fn login(&self, request: LoginRequest) -> Result<LoginSession, ParticipantsServiceError>;

    /// Register a coordinator or patient on behalf of `creator`.
    async fn register(
        &self,
        creator: &SessionClaims,
        capacity: Capacity,
        registration: NewRegistration,
    ) -> Result<RegisteredParticipant, ParticipantsServiceError>;

    /// Create an admin account.
    async fn create_admin(
        &self,
        admin: NewAdmin,
    ) -> Result<RegisteredParticipant, ParticipantsServiceError>;

    /// Pick a random six digit participant ID that is not taken yet.
    async fn generate_unique_id(&self) -> Result<i64, ParticipantsServiceError>;

    /// Replace a participant's password.
    async fn recover_password(&self, reset: PasswordReset) -> Result<(), ParticipantsServiceError>;
}

/// Decide which study a new participant joins.
///
/// Patients can't register anyone. Participants registered into the creator's
/// own capacity, and all patients, join the creator's study. Otherwise (an admin
/// registering a coordinator) the requested study must be a known one.
///
/// # Errors
///
/// Returns [`ParticipantsServiceError::CreatorNotPermitted`] for patient
/// creators or admin targets, and [`ParticipantsServiceError::InvalidStudy`]
/// when no study can be assigned.
pub fn assign_study(
    creator: &SessionClaims,
    capacity: Capacity,
    requested: Option<&str>,
) -> Result<String, ParticipantsServiceError> {
    if creator.capacity == Capacity::Patient || capacity == Capacity::Admin {
        return Err(ParticipantsServiceError::CreatorNotPermitted(
            creator.capacity,
        ));
    }

    let study = if creator.capacity == capacity || capacity == Capacity::Patient {
        creator.study()
    } else {
        requested.filter(|study| is_known_study(study))
    };

    study
        .filter(|study| !study.is_empty())
        .map(str::to_string)
        .ok_or(ParticipantsServiceError::InvalidStudy)
}

async fn create_credential(
    password: String,
) -> Result<PasswordCredential, ParticipantsServiceError> {
    task::spawn_blocking(move || PasswordCredential::create(&password))
        .await?
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::{
        auth::{SigningKey, SigningKeys},
        participants::{records::ParticipantProfile, store::MockIdentityStore},
        test::TestContext,
    };

    use super::*;

    fn tokens() -> TokenAuthority {
        TokenAuthority::new(SigningKeys::new(SigningKey::new("test-secret")))
    }

    fn id(raw: i64) -> ParticipantId {
        ParticipantId::normalize(raw).unwrap_or_else(|_| unreachable!())
    }

    fn claims(capacity: Capacity, study: Option<&str>) -> TestResult<SessionClaims> {
        Ok(SessionClaims::new(id(1), capacity, study, Timestamp::now())?)
    }

    fn registration(participant_id: i64, study: Option<&str>) -> NewRegistration {
        NewRegistration {
            participant_id,
            password: "hunter2".to_string(),
            study: study.map(str::to_string),
            is_consented: false,
            email: None,
        }
    }

    #[test]
    fn patients_cannot_register_anyone() -> TestResult {
        let creator = claims(Capacity::Patient, Some("hf"))?;

        for capacity in [Capacity::Patient, Capacity::Coordinator] {
            let result = assign_study(&creator, capacity, Some("hf"));

            assert!(
                matches!(
                    result,
                    Err(ParticipantsServiceError::CreatorNotPermitted(Capacity::Patient))
                ),
                "expected CreatorNotPermitted, got {result:?}"
            );
        }

        Ok(())
    }

    #[test]
    fn coordinators_register_into_their_own_study() -> TestResult {
        let creator = claims(Capacity::Coordinator, Some("moyo"))?;

        assert_eq!(assign_study(&creator, Capacity::Patient, Some("hf"))?, "moyo");
        assert_eq!(assign_study(&creator, Capacity::Coordinator, None)?, "moyo");

        Ok(())
    }

    #[test]
    fn admins_pick_a_known_study_for_coordinators() -> TestResult {
        let admin = claims(Capacity::Admin, None)?;

        assert_eq!(
            assign_study(&admin, Capacity::Coordinator, Some("sleepBank"))?,
            "sleepBank"
        );

        for requested in [Some("not-a-study"), Some(""), None] {
            let result = assign_study(&admin, Capacity::Coordinator, requested);

            assert!(
                matches!(result, Err(ParticipantsServiceError::InvalidStudy)),
                "expected InvalidStudy for {requested:?}, got {result:?}"
            );
        }

        Ok(())
    }

    #[test]
    fn admins_cannot_register_patients_directly() -> TestResult {
        let admin = claims(Capacity::Admin, None)?;

        let result = assign_study(&admin, Capacity::Patient, Some("hf"));

        assert!(
            matches!(result, Err(ParticipantsServiceError::InvalidStudy)),
            "expected InvalidStudy, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn login_rotates_credentials_and_stores_token() -> TestResult {
        let credential = PasswordCredential::create("hunter2")?;
        let mut store = MockIdentityStore::new();

        let profile = ParticipantProfile {
            participant_id: id(7775),
            capacity: Capacity::Coordinator,
            study: Some("hf".to_string()),
            password_salt: credential.salt.clone(),
            password_hash: credential.hash.clone(),
            is_consented: true,
        };

        store
            .expect_find_role_and_study()
            .with(eq(id(7775)))
            .times(1)
            .return_once(move |_| Ok(Some(profile)));
        store.expect_find_password_hash().never();
        store.expect_find_participant_by_email_hash().never();

        let old_salt = credential.salt.clone();

        store
            .expect_update_credentials()
            .withf(move |participant_id, rotated| {
                *participant_id == id(7775) && rotated.salt != old_salt && rotated.verify("hunter2")
            })
            .times(1)
            .return_once(|_, _| Ok(true));

        store
            .expect_store_current_token()
            .withf(|participant_id, token| *participant_id == id(7775) && !token.is_empty())
            .times(1)
            .return_once(|_, _| Ok(()));

        let tokens = tokens();
        let service = PgParticipantsService::from_store(Arc::new(store), tokens.clone());

        let session = service
            .login(LoginRequest {
                participant_id: 7775,
                password: "hunter2".to_string(),
                email: None,
            })
            .await?;

        assert_eq!(session.claims.participant_id, id(7775));
        assert_eq!(session.claims.capacity, Capacity::Coordinator);
        assert_eq!(session.claims.study(), Some("hf"));
        assert!(session.is_consented);
        assert_eq!(tokens.verify(&session.token)?, session.claims);

        Ok(())
    }

    #[tokio::test]
    async fn login_with_wrong_password_changes_nothing() -> TestResult {
        let credential = PasswordCredential::create("hunter2")?;
        let mut store = MockIdentityStore::new();

        let profile = ParticipantProfile {
            participant_id: id(7775),
            capacity: Capacity::Patient,
            study: Some("hf".to_string()),
            password_salt: credential.salt.clone(),
            password_hash: credential.hash.clone(),
            is_consented: false,
        };

        store
            .expect_find_role_and_study()
            .return_once(move |_| Ok(Some(profile)));
        store.expect_update_credentials().never();
        store.expect_store_current_token().never();

        let service = PgParticipantsService::from_store(Arc::new(store), tokens());

        let result = service
            .login(LoginRequest {
                participant_id: 7775,
                password: "hunter3".to_string(),
                email: None,
            })
            .await;

        assert!(
            matches!(result, Err(ParticipantsServiceError::InvalidCredentials)),
            "expected InvalidCredentials, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn login_for_unknown_participant_is_invalid_credentials() -> TestResult {
        let mut store = MockIdentityStore::new();

        store
            .expect_find_role_and_study()
            .return_once(|_| Ok(None));

        let service = PgParticipantsService::from_store(Arc::new(store), tokens());

        let result = service
            .login(LoginRequest {
                participant_id: 1234,
                password: "hunter2".to_string(),
                email: None,
            })
            .await;

        assert!(
            matches!(result, Err(ParticipantsServiceError::InvalidCredentials)),
            "expected InvalidCredentials, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn login_by_email_resolves_participant_first() -> TestResult {
        let credential = PasswordCredential::create("hunter2")?;
        let tokens = tokens();
        let expected_hash = hash_email("ada@example.org", &tokens.keys().current());
        let mut store = MockIdentityStore::new();

        store
            .expect_find_participant_by_email_hash()
            .withf(move |email_hash| email_hash == expected_hash)
            .times(1)
            .return_once(|_| Ok(Some(id(4242))));

        let profile = ParticipantProfile {
            participant_id: id(4242),
            capacity: Capacity::Patient,
            study: Some("moyo".to_string()),
            password_salt: credential.salt.clone(),
            password_hash: credential.hash.clone(),
            is_consented: true,
        };

        store
            .expect_find_role_and_study()
            .with(eq(id(4242)))
            .times(1)
            .return_once(move |_| Ok(Some(profile)));
        store
            .expect_update_credentials()
            .times(1)
            .return_once(|_, _| Ok(true));
        store
            .expect_store_current_token()
            .times(1)
            .return_once(|_, _| Ok(()));

        let service = PgParticipantsService::from_store(Arc::new(store), tokens);

        let session = service
            .login(LoginRequest {
                participant_id: 0,
                password: "hunter2".to_string(),
                email: Some(" Ada@Example.org".to_string()),
            })
            .await?;

        assert_eq!(session.claims.participant_id, id(4242));
        assert_eq!(session.claims.study(), Some("moyo"));

        Ok(())
    }

    #[tokio::test]
    async fn login_by_unknown_email_is_invalid_credentials() -> TestResult {
        let mut store = MockIdentityStore::new();

        store
            .expect_find_participant_by_email_hash()
            .times(1)
            .return_once(|_| Ok(None));
        store.expect_find_role_and_study().never();
        store.expect_update_credentials().never();

        let service = PgParticipantsService::from_store(Arc::new(store), tokens());

        let result = service
            .login(LoginRequest {
                participant_id: 7775,
                password: "hunter2".to_string(),
                email: Some("nobody@example.org".to_string()),
            })
            .await;

        assert!(
            matches!(result, Err(ParticipantsServiceError::InvalidCredentials)),
            "expected InvalidCredentials, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn blank_email_falls_back_to_participant_id() -> TestResult {
        let mut store = MockIdentityStore::new();

        store.expect_find_participant_by_email_hash().never();
        store
            .expect_find_role_and_study()
            .with(eq(id(7775)))
            .times(1)
            .return_once(|_| Ok(None));

        let service = PgParticipantsService::from_store(Arc::new(store), tokens());

        let result = service
            .login(LoginRequest {
                participant_id: 7775,
                password: "hunter2".to_string(),
                email: Some("   ".to_string()),
            })
            .await;

        assert!(
            matches!(result, Err(ParticipantsServiceError::InvalidCredentials)),
            "expected InvalidCredentials, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn login_rejects_unnormalizable_id() -> TestResult {
        let service = PgParticipantsService::from_store(Arc::new(MockIdentityStore::new()), tokens());

        let result = service
            .login(LoginRequest {
                participant_id: 0,
                password: "hunter2".to_string(),
                email: None,
            })
            .await;

        assert!(
            matches!(result, Err(ParticipantsServiceError::InvalidParticipantId(_))),
            "expected InvalidParticipantId, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn register_normalizes_id_and_inherits_study() -> TestResult {
        let mut store = MockIdentityStore::new();

        store
            .expect_insert_participant()
            .withf(|participant| {
                participant.participant_id == id(4321)
                    && participant.capacity == Capacity::Patient
                    && participant.study.as_deref() == Some("moyo")
                    && participant.credential.verify("hunter2")
            })
            .times(1)
            .return_once(|_| Ok(()));

        let service = PgParticipantsService::from_store(Arc::new(store), tokens());
        let creator = claims(Capacity::Coordinator, Some("moyo"))?;

        let registered = service
            .register(&creator, Capacity::Patient, registration(4321, Some("hf")))
            .await?;

        assert_eq!(
            registered,
            RegisteredParticipant {
                participant_id: id(4321),
                capacity: Capacity::Patient,
                study: Some("moyo".to_string()),
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn register_by_patient_touches_nothing() -> TestResult {
        let mut store = MockIdentityStore::new();

        store.expect_insert_participant().never();

        let service = PgParticipantsService::from_store(Arc::new(store), tokens());
        let creator = claims(Capacity::Patient, Some("hf"))?;

        let result = service
            .register(&creator, Capacity::Patient, registration(4321, None))
            .await;

        assert!(
            matches!(result, Err(ParticipantsServiceError::CreatorNotPermitted(_))),
            "expected CreatorNotPermitted, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unique_id_skips_taken_ids() -> TestResult {
        let mut store = MockIdentityStore::new();
        let mut seq = mockall::Sequence::new();

        store
            .expect_participant_exists()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        store
            .expect_participant_exists()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(false));

        let service = PgParticipantsService::from_store(Arc::new(store), tokens());

        let unique = service.generate_unique_id().await?;

        assert!(UNIQUE_ID_RANGE.contains(&unique), "{unique} out of range");

        Ok(())
    }

    #[tokio::test]
    async fn unique_id_gives_up_eventually() -> TestResult {
        let mut store = MockIdentityStore::new();

        store
            .expect_participant_exists()
            .times(MAX_UNIQUE_ID_ATTEMPTS)
            .returning(|_| Ok(true));

        let service = PgParticipantsService::from_store(Arc::new(store), tokens());

        let result = service.generate_unique_id().await;

        assert!(
            matches!(result, Err(ParticipantsServiceError::UniqueIdExhausted(_))),
            "expected UniqueIdExhausted, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn recover_password_for_unknown_participant_is_not_found() -> TestResult {
        let mut store = MockIdentityStore::new();

        store
            .expect_participant_exists()
            .with(eq(id(5555)))
            .return_once(|_| Ok(false));
        store.expect_update_credentials().never();

        let service = PgParticipantsService::from_store(Arc::new(store), tokens());

        let result = service
            .recover_password(PasswordReset {
                participant_id: 5555,
                password: "new-password".to_string(),
            })
            .await;

        assert!(
            matches!(result, Err(ParticipantsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn full_account_lifecycle_against_postgres() -> TestResult {
        let ctx = TestContext::new().await;
        let tokens = tokens();
        let service = PgParticipantsService::new(ctx.db.pool().clone(), tokens.clone());

        let admin = service
            .create_admin(NewAdmin {
                participant_id: 1,
                password: "admin-password".to_string(),
            })
            .await?;

        assert_eq!(admin.study, None);

        let admin_session = service
            .login(LoginRequest {
                participant_id: 1,
                password: "admin-password".to_string(),
                email: None,
            })
            .await?;

        let coordinator = service
            .register(
                &admin_session.claims,
                Capacity::Coordinator,
                registration(7775, Some("hf")),
            )
            .await?;

        assert_eq!(coordinator.participant_id, id(7775));

        let duplicate = service
            .register(
                &admin_session.claims,
                Capacity::Coordinator,
                registration(7775, Some("hf")),
            )
            .await;

        assert!(
            matches!(duplicate, Err(ParticipantsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {duplicate:?}"
        );

        let first = service
            .login(LoginRequest {
                participant_id: 7775,
                password: "hunter2".to_string(),
                email: None,
            })
            .await?;

        let second = service
            .login(LoginRequest {
                participant_id: 7_775_000_000,
                password: "hunter2".to_string(),
                email: None,
            })
            .await?;

        assert_eq!(second.claims.study(), Some("hf"));
        assert_ne!(first.token, second.token);

        service
            .recover_password(PasswordReset {
                participant_id: 7775,
                password: "new-password".to_string(),
            })
            .await?;

        let stale = service
            .login(LoginRequest {
                participant_id: 7775,
                password: "hunter2".to_string(),
                email: None,
            })
            .await;

        assert!(
            matches!(stale, Err(ParticipantsServiceError::InvalidCredentials)),
            "expected InvalidCredentials, got {stale:?}"
        );

        let coordinator_session = service
            .login(LoginRequest {
                participant_id: 7775,
                password: "new-password".to_string(),
                email: None,
            })
            .await?;

        service
            .register(
                &coordinator_session.claims,
                Capacity::Patient,
                NewRegistration {
                    email: Some("Ada@Example.org".to_string()),
                    ..registration(4242, None)
                },
            )
            .await?;

        let by_email = service
            .login(LoginRequest {
                participant_id: 0,
                password: "hunter2".to_string(),
                email: Some("ada@example.org".to_string()),
            })
            .await?;

        assert_eq!(by_email.claims.participant_id, id(4242));
        assert_eq!(by_email.claims.study(), Some("hf"));

        let unique = service.generate_unique_id().await?;

        assert!(UNIQUE_ID_RANGE.contains(&unique), "{unique} out of range");

        Ok(())
    }
}
