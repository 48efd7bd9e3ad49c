//! Auth middleware.

use std::sync::Arc;

use amoss_app::auth::{AuthorizeError, RoutePolicy};
use salvo::{http::header::AUTHORIZATION, prelude::*};
use tracing::{debug, error};

use crate::{
    errors::ApiError,
    extensions::*,
    observability::{AuthorizationOutcome, observe_authorization},
    state::State,
};

/// Rejects requests whose `Authorization` header does not satisfy `policy`,
/// otherwise stores the caller's claims in the depot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Authorize {
    policy: RoutePolicy,
}

impl Authorize {
    pub(crate) const fn new(policy: RoutePolicy) -> Self {
        Self { policy }
    }
}

#[handler]
impl Authorize {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        let state = match depot.obtain_or_500::<Arc<State>>() {
            Ok(state) => Arc::clone(state),
            Err(error) => {
                res.render(error);
                ctrl.skip_rest();

                return;
            }
        };

        match state.app.auth.authorize(self.policy, &header).await {
            Ok(claims) => {
                observe_authorization(AuthorizationOutcome::Granted);
                depot.insert_session_claims(claims);

                ctrl.call_next(req, depot, res).await;
            }
            Err(error) => {
                let (outcome, response) = rejection(&error);

                observe_authorization(outcome);
                res.render(response);
                ctrl.skip_rest();
            }
        }
    }
}

fn rejection(error: &AuthorizeError) -> (AuthorizationOutcome, ApiError) {
    match error {
        AuthorizeError::MalformedHeader => {
            (AuthorizationOutcome::MalformedHeader, ApiError::invalid_header())
        }
        AuthorizeError::Authentication(source) => {
            debug!("token rejected: {source}");

            (AuthorizationOutcome::Unauthenticated, ApiError::invalid_token())
        }
        AuthorizeError::Authorization { required, actual } => {
            debug!(%required, %actual, "capacity rejected");

            (AuthorizationOutcome::Forbidden, ApiError::insufficient_capacity())
        }
        AuthorizeError::SessionSuperseded => {
            (AuthorizationOutcome::Superseded, ApiError::invalid_access_token())
        }
        AuthorizeError::Upstream(source) => {
            error!("failed to check current session: {source}");

            (AuthorizationOutcome::Error, ApiError::internal())
        }
    }
}
