//! App Router

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*, trailing_slash::remove_slash};

use amoss_app::auth::{Capacity, RoutePolicy};

use crate::{
    auth::Authorize,
    cors, healthcheck, hsts,
    observability::{metrics_handler, request_logging},
    participants::{login, password_recovery, register, session, unique_id},
    state::State,
};

/// Every routable path, used as the bounded set of metric route labels.
pub(crate) const ROUTES: &[&str] = &[
    "/loginParticipant",
    "/api/createCoordinator",
    "/api/createPatient",
    "/api/getUniqueID",
    "/api/passwordRecovery",
    "/api/session",
    "/api/health",
    "/metrics",
];

/// Portal routes: any valid Bearer session.
const PORTAL: RoutePolicy = RoutePolicy::bearer();

/// Coordinator-only portal routes.
const COORDINATOR: RoutePolicy = RoutePolicy::bearer().require(Capacity::Coordinator);

/// Device routes: Mars scheme, only the latest session per participant.
const DEVICE: RoutePolicy = RoutePolicy::mars().single_session();

/// The router wrapped in service-level middleware.
pub(crate) fn app_service(state: Arc<State>) -> Service {
    Service::new(app_router(state)).hoop(cors::handler())
}

pub(crate) fn app_router(state: Arc<State>) -> Router {
    Router::new()
        .hoop(CatchPanic::new())
        .hoop(request_logging)
        .hoop(hsts::handler)
        .hoop(remove_slash())
        .hoop(inject(state))
        .push(Router::with_path("metrics").get(metrics_handler))
        .push(Router::with_path("loginParticipant").post(login::handler))
        .push(
            Router::with_path("api")
                .push(Router::with_path("health").get(healthcheck::handler))
                .push(
                    Router::new()
                        .hoop(Authorize::new(PORTAL))
                        .push(
                            Router::with_path("createCoordinator")
                                .post(register::create_coordinator),
                        )
                        .push(Router::with_path("createPatient").post(register::create_patient)),
                )
                .push(
                    Router::new()
                        .hoop(Authorize::new(COORDINATOR))
                        .push(Router::with_path("getUniqueID").get(unique_id::handler))
                        .push(
                            Router::with_path("passwordRecovery").post(password_recovery::handler),
                        ),
                )
                .push(
                    Router::with_path("session")
                        .hoop(Authorize::new(DEVICE))
                        .get(session::handler),
                ),
        )
}

#[cfg(test)]
mod tests {
    use salvo::{
        http::header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, AUTHORIZATION, ORIGIN,
            STRICT_TRANSPORT_SECURITY,
        },
        test::{ResponseExt, TestClient},
    };
    use serde_json::{Value, json};
    use testresult::TestResult;

    use amoss_app::{
        auth::{
            ParticipantId, PgAuthService, SessionClaims, SigningKey, SigningKeys, TokenAuthority,
        },
        context::AppContext,
        participants::{MockIdentityStore, MockParticipantsService},
    };

    use super::*;

    struct Harness {
        tokens: TokenAuthority,
        service: Service,
    }

    impl Harness {
        fn new(participants: MockParticipantsService, identities: MockIdentityStore) -> Self {
            let tokens = TokenAuthority::new(SigningKeys::new(SigningKey::new("router-secret")));
            let auth = PgAuthService::from_store(Arc::new(identities), tokens.clone());

            let state = State::from_app_context(AppContext {
                participants: Arc::new(participants),
                auth: Arc::new(auth),
            });

            Self {
                tokens,
                service: app_service(state),
            }
        }

        fn header(&self, scheme: &str, capacity: Capacity, participant_id: i64) -> TestResult<String> {
            let study = (capacity != Capacity::Admin).then_some("hf");
            let issued = self.tokens.issue(
                capacity,
                study,
                ParticipantId::normalize(participant_id)?,
            )?;

            Ok(format!("{scheme} {}", issued.token))
        }
    }

    #[tokio::test]
    async fn health_is_public_and_sets_hsts() -> TestResult {
        let harness = Harness::new(MockParticipantsService::new(), MockIdentityStore::new());

        let res = TestClient::get("http://example.com/api/health")
            .send(&harness.service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(
            res.headers().contains_key(STRICT_TRANSPORT_SECURITY),
            "expected HSTS header"
        );

        Ok(())
    }

    #[tokio::test]
    async fn preflight_is_answered_without_authorization() -> TestResult {
        let mut participants = MockParticipantsService::new();

        participants.expect_register().never();

        let harness = Harness::new(participants, MockIdentityStore::new());

        let res = TestClient::options("http://example.com/api/createPatient")
            .add_header(ORIGIN, "https://portal.example.org", true)
            .add_header(ACCESS_CONTROL_REQUEST_METHOD, "POST", true)
            .add_header(ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type", true)
            .send(&harness.service)
            .await;

        assert!(
            res.status_code.is_some_and(|status| status.is_success()),
            "preflight should succeed, got {:?}",
            res.status_code
        );
        assert_eq!(
            res.headers()
                .get(ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|value| value.to_str().ok()),
            Some("*")
        );

        let allowed = res
            .headers()
            .get(ACCESS_CONTROL_ALLOW_HEADERS)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        assert!(allowed.contains("authorization"), "allowed headers: {allowed}");
        assert!(allowed.contains("content-type"), "allowed headers: {allowed}");

        Ok(())
    }

    #[tokio::test]
    async fn cross_origin_responses_allow_any_origin() -> TestResult {
        let harness = Harness::new(MockParticipantsService::new(), MockIdentityStore::new());

        let res = TestClient::get("http://example.com/api/health")
            .add_header(ORIGIN, "https://portal.example.org", true)
            .send(&harness.service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(
            res.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN),
            "expected CORS header on a simple request"
        );

        Ok(())
    }

    #[tokio::test]
    async fn patient_cannot_generate_ids() -> TestResult {
        let mut participants = MockParticipantsService::new();

        participants.expect_generate_unique_id().never();

        let harness = Harness::new(participants, MockIdentityStore::new());

        let mut res = TestClient::get("http://example.com/api/getUniqueID")
            .add_header(AUTHORIZATION, harness.header("Bearer", Capacity::Patient, 4242)?, true)
            .send(&harness.service)
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));
        assert_eq!(body, json!({ "error": "insufficient capacity" }));

        Ok(())
    }

    #[tokio::test]
    async fn coordinator_generates_ids() -> TestResult {
        let mut participants = MockParticipantsService::new();

        participants
            .expect_generate_unique_id()
            .once()
            .return_once(|| Ok(123_456));

        let harness = Harness::new(participants, MockIdentityStore::new());

        let mut res = TestClient::get("http://example.com/api/getUniqueID")
            .add_header(
                AUTHORIZATION,
                harness.header("Bearer", Capacity::Coordinator, 7_775_000_000)?,
                true,
            )
            .send(&harness.service)
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body, json!({ "participantID": 123_456 }));

        Ok(())
    }

    #[tokio::test]
    async fn registration_requires_bearer_scheme() -> TestResult {
        let mut participants = MockParticipantsService::new();

        participants.expect_register().never();

        let harness = Harness::new(participants, MockIdentityStore::new());

        let mut res = TestClient::post("http://example.com/api/createPatient")
            .add_header(
                AUTHORIZATION,
                harness.header("Mars", Capacity::Coordinator, 7_775_000_000)?,
                true,
            )
            .json(&json!({ "participantID": 2020, "password": "hunter2" }))
            .send(&harness.service)
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert_eq!(body, json!({ "error": "invalid header" }));

        Ok(())
    }

    #[tokio::test]
    async fn session_checks_current_token() -> TestResult {
        let mut identities = MockIdentityStore::new();

        identities
            .expect_compare_current_token()
            .once()
            .withf(|participant_id, _| participant_id.get() == 4_242_000_000)
            .return_once(|_, _| Ok(true));

        let harness = Harness::new(MockParticipantsService::new(), identities);

        let mut res = TestClient::get("http://example.com/api/session")
            .add_header(AUTHORIZATION, harness.header("Mars", Capacity::Patient, 4242)?, true)
            .send(&harness.service)
            .await;

        let claims: SessionClaims = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(claims.participant_id.get(), 4_242_000_000);
        assert_eq!(claims.study(), Some("hf"));

        Ok(())
    }

    #[tokio::test]
    async fn superseded_session_is_rejected() -> TestResult {
        let mut identities = MockIdentityStore::new();

        identities
            .expect_compare_current_token()
            .once()
            .return_once(|_, _| Ok(false));

        let harness = Harness::new(MockParticipantsService::new(), identities);

        let mut res = TestClient::get("http://example.com/api/session")
            .add_header(AUTHORIZATION, harness.header("Mars", Capacity::Patient, 4242)?, true)
            .send(&harness.service)
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert_eq!(body, json!({ "error": "invalid access token" }));

        Ok(())
    }

    #[tokio::test]
    async fn token_from_another_key_is_rejected() -> TestResult {
        let harness = Harness::new(MockParticipantsService::new(), MockIdentityStore::new());
        let other = Harness::new(MockParticipantsService::new(), MockIdentityStore::new());

        assert!(
            other.tokens.keys().rotate(SigningKey::new("someone-else")),
            "key should change"
        );

        let mut res = TestClient::get("http://example.com/api/getUniqueID")
            .add_header(
                AUTHORIZATION,
                other.header("Bearer", Capacity::Coordinator, 7_775_000_000)?,
                true,
            )
            .send(&harness.service)
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert_eq!(body, json!({ "error": "invalid token type" }));

        Ok(())
    }
}
