//! Password Recovery Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use amoss_app::participants::{ParticipantsServiceError, data::PasswordReset};

use crate::{errors::ApiError, extensions::*, participants::errors::into_api_error, state::State};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PasswordRecoveredResponse {
    pub success: String,
}

/// Password Recovery Handler
///
/// Sets a new password for an existing participant.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<PasswordRecoveredResponse>, ApiError> {
    let reset = req.json_or_400::<PasswordReset>().await?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let participant_id = reset.participant_id;

    state
        .app
        .participants
        .recover_password(reset)
        .await
        .map_err(|error| match error {
            ParticipantsServiceError::NotFound => ApiError::new(
                StatusCode::NOT_FOUND,
                format!("participant '{participant_id}' does not exist"),
            ),
            other => into_api_error(other),
        })?;

    Ok(Json(PasswordRecoveredResponse {
        success: format!("participant '{participant_id}' password has been recovered"),
    }))
}
