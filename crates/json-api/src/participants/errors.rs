//! Participant Errors

use salvo::http::StatusCode;
use tracing::{debug, error};

use amoss_app::{auth::CredentialError, participants::ParticipantsServiceError};

use crate::errors::ApiError;

pub(crate) const DUPLICATE_PARTICIPANT: &str = "cannot create a duplicate participant";
pub(crate) const INVALID_LOGIN: &str = "invalid participant ID or password";

pub(crate) fn into_api_error(error: ParticipantsServiceError) -> ApiError {
    match error {
        ParticipantsServiceError::InvalidParticipantId(source) => {
            ApiError::new(StatusCode::BAD_REQUEST, source.to_string())
        }
        ParticipantsServiceError::InvalidCredentials => {
            ApiError::new(StatusCode::UNAUTHORIZED, INVALID_LOGIN)
        }
        ParticipantsServiceError::NotFound => {
            ApiError::new(StatusCode::NOT_FOUND, "participant does not exist")
        }
        ParticipantsServiceError::AlreadyExists => {
            ApiError::new(StatusCode::CONFLICT, DUPLICATE_PARTICIPANT)
        }
        ParticipantsServiceError::CreatorNotPermitted(capacity) => {
            debug!(%capacity, "registration refused");

            ApiError::new(
                StatusCode::FORBIDDEN,
                "policy incapable of creating participants",
            )
        }
        ParticipantsServiceError::InvalidStudy => ApiError::new(
            StatusCode::BAD_REQUEST,
            "study type invalid or not included",
        ),
        ParticipantsServiceError::InvalidData => {
            ApiError::new(StatusCode::BAD_REQUEST, "invalid participant data")
        }
        ParticipantsServiceError::Credential(CredentialError::EmptyPassword) => {
            ApiError::new(StatusCode::BAD_REQUEST, "password must not be empty")
        }
        ParticipantsServiceError::UniqueIdExhausted(attempts) => {
            error!(attempts, "no unused participant id found");

            ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "no unused participant ID available",
            )
        }
        error @ (ParticipantsServiceError::Credential(_)
        | ParticipantsServiceError::Token(_)
        | ParticipantsServiceError::Blocking(_)
        | ParticipantsServiceError::Sql(_)) => {
            error!("participants service failed: {error}");

            ApiError::internal()
        }
    }
}

/// Login failures never reveal whether the participant exists.
pub(crate) fn into_login_error(error: ParticipantsServiceError) -> ApiError {
    match error {
        ParticipantsServiceError::InvalidParticipantId(_)
        | ParticipantsServiceError::InvalidCredentials
        | ParticipantsServiceError::NotFound
        | ParticipantsServiceError::Credential(CredentialError::EmptyPassword) => {
            ApiError::new(StatusCode::UNAUTHORIZED, INVALID_LOGIN)
        }
        other => into_api_error(other),
    }
}
