//! Login Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use amoss_app::participants::data::{LoginRequest, LoginSession};

use crate::{
    errors::ApiError, extensions::*, participants::errors::into_login_error, state::State,
};

/// Login response. Values are strings for compatibility with deployed clients.
#[derive(Serialize, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,

    pub capacity: String,

    #[serde(rename = "participantID")]
    pub participant_id: String,

    /// Empty for admins.
    pub study: String,

    #[serde(rename = "isConsented")]
    pub is_consented: String,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("capacity", &self.capacity)
            .field("participant_id", &self.participant_id)
            .field("study", &self.study)
            .finish_non_exhaustive()
    }
}

impl From<LoginSession> for LoginResponse {
    fn from(session: LoginSession) -> Self {
        LoginResponse {
            capacity: session.claims.capacity.to_string(),
            participant_id: session.claims.participant_id.to_string(),
            study: session.claims.study().unwrap_or_default().to_string(),
            is_consented: session.is_consented.to_string(),
            token: session.token,
        }
    }
}

/// Login Handler
///
/// Checks the password, rotates the stored credential and opens a session
/// that replaces any earlier one.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = req.json_or_400::<LoginRequest>().await?;
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let session = state
        .app
        .participants
        .login(request)
        .await
        .map_err(into_login_error)?;

    Ok(Json(session.into()))
}
