//! Registration Handlers

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use amoss_app::{auth::Capacity, participants::data::NewRegistration};

use crate::{errors::ApiError, extensions::*, participants::errors::into_api_error, state::State};

/// Participant Created Response
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ParticipantCreatedResponse {
    pub success: String,
}

async fn register(
    capacity: Capacity,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ParticipantCreatedResponse>, ApiError> {
    let registration = req.json_or_400::<NewRegistration>().await?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let creator = depot.session_claims_or_401()?;

    state
        .app
        .participants
        .register(creator, capacity, registration)
        .await
        .map_err(into_api_error)?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(ParticipantCreatedResponse {
        success: format!("{capacity} participant created"),
    }))
}

/// Create Coordinator Handler
#[handler]
pub(crate) async fn create_coordinator(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ParticipantCreatedResponse>, ApiError> {
    register(Capacity::Coordinator, req, depot, res).await
}

/// Create Patient Handler
#[handler]
pub(crate) async fn create_patient(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ParticipantCreatedResponse>, ApiError> {
    register(Capacity::Patient, req, depot, res).await
}
