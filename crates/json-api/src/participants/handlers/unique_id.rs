//! Unique Participant ID Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{errors::ApiError, extensions::*, participants::errors::into_api_error, state::State};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UniqueIdResponse {
    #[serde(rename = "participantID")]
    pub participant_id: i64,
}

/// Unique Participant ID Handler
///
/// Returns a six digit ID whose normalized form is not yet registered.
#[handler]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<UniqueIdResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let participant_id = state
        .app
        .participants
        .generate_unique_id()
        .await
        .map_err(into_api_error)?;

    Ok(Json(UniqueIdResponse { participant_id }))
}
