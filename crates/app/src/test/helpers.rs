//! Test Helpers

use crate::{
    auth::{Capacity, SessionClaims},
    participants::{
        ParticipantsService, ParticipantsServiceError,
        data::{LoginRequest, LoginSession, NewAdmin, NewRegistration, RegisteredParticipant},
    },
    test::TestContext,
};

pub(crate) async fn create_admin(
    ctx: &TestContext,
    participant_id: i64,
    password: &str,
) -> Result<RegisteredParticipant, ParticipantsServiceError> {
    ctx.participants
        .create_admin(NewAdmin {
            participant_id,
            password: password.to_string(),
        })
        .await
}

pub(crate) async fn register(
    ctx: &TestContext,
    creator: &SessionClaims,
    capacity: Capacity,
    participant_id: i64,
    study: Option<&str>,
) -> Result<RegisteredParticipant, ParticipantsServiceError> {
    ctx.participants
        .register(
            creator,
            capacity,
            NewRegistration {
                participant_id,
                password: "hunter2".to_string(),
                study: study.map(str::to_string),
                is_consented: true,
                email: None,
            },
        )
        .await
}

pub(crate) async fn login(
    ctx: &TestContext,
    participant_id: i64,
    password: &str,
) -> Result<LoginSession, ParticipantsServiceError> {
    ctx.participants
        .login(LoginRequest {
            participant_id,
            password: password.to_string(),
            email: None,
        })
        .await
}
