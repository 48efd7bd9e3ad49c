//! Session Handler

use salvo::prelude::*;

use amoss_app::auth::SessionClaims;

use crate::{errors::ApiError, extensions::*};

/// Session Handler
///
/// Returns the claims of the caller's current session.
#[handler]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<SessionClaims>, ApiError> {
    Ok(Json(depot.session_claims_or_401()?.clone()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use amoss_app::{auth::Capacity, participants::MockParticipantsService};

    use crate::test_helpers::{claims_for, participants_service};

    use super::*;

    #[tokio::test]
    async fn returns_caller_claims() -> TestResult {
        let claims = claims_for(Capacity::Patient, 4242)?;
        let service = participants_service(
            MockParticipantsService::new(),
            Some(claims.clone()),
            Router::with_path("session").get(handler),
        );

        let mut res = TestClient::get("http://example.com/session")
            .send(&service)
            .await;

        let body: SessionClaims = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body, claims);

        Ok(())
    }
}
