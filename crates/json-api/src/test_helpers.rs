//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use testresult::TestResult;

use amoss_app::{
    auth::{Capacity, MockAuthService, ParticipantId, SessionClaims},
    context::AppContext,
    participants::MockParticipantsService,
};

use crate::{extensions::*, state::State};

/// Claims for a participant of `capacity`. Admins carry no study.
pub(crate) fn claims_for(capacity: Capacity, participant_id: i64) -> TestResult<SessionClaims> {
    let study = (capacity != Capacity::Admin).then_some("hf");

    Ok(SessionClaims::new(
        ParticipantId::normalize(participant_id)?,
        capacity,
        study,
        Timestamp::now(),
    )?)
}

/// Stands in for the authorization middleware.
#[derive(Debug, Clone)]
pub(crate) struct InjectClaims(pub SessionClaims);

#[handler]
impl InjectClaims {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        depot.insert_session_claims(self.0.clone());
        ctrl.call_next(req, depot, res).await;
    }
}

fn strict_auth_mock() -> MockAuthService {
    let mut auth = MockAuthService::new();

    auth.expect_authorize().never();

    auth
}

fn strict_participants_mock() -> MockParticipantsService {
    let mut participants = MockParticipantsService::new();

    participants.expect_login().never();
    participants.expect_register().never();
    participants.expect_create_admin().never();
    participants.expect_generate_unique_id().never();
    participants.expect_recover_password().never();

    participants
}

fn state(participants: MockParticipantsService, auth: MockAuthService) -> Arc<State> {
    State::from_app_context(AppContext {
        participants: Arc::new(participants),
        auth: Arc::new(auth),
    })
}

pub(crate) fn state_with_auth(auth: MockAuthService) -> Arc<State> {
    state(strict_participants_mock(), auth)
}

pub(crate) fn state_with_participants(participants: MockParticipantsService) -> Arc<State> {
    state(participants, strict_auth_mock())
}

/// Serve `route` with `participants` and, when given, a caller's claims.
pub(crate) fn participants_service(
    participants: MockParticipantsService,
    caller: Option<SessionClaims>,
    route: Router,
) -> Service {
    let mut router = Router::new().hoop(inject(state_with_participants(participants)));

    if let Some(claims) = caller {
        router = router.hoop(InjectClaims(claims));
    }

    Service::new(router.push(route))
}
