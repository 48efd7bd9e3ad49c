//! Participants service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::auth::{Capacity, CredentialError, ParticipantIdError, TokenError};

/// Participants service error variants.
#[derive(Debug, Error)]
pub enum ParticipantsServiceError {
    /// Participant ID could not be normalized.
    #[error("invalid participant id")]
    InvalidParticipantId(#[from] ParticipantIdError),

    /// Unknown participant or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Participant was not found.
    #[error("participant not found")]
    NotFound,

    /// Participant already exists.
    #[error("participant already exists")]
    AlreadyExists,

    /// The creator's capacity may not register participants.
    #[error("{0} capacity cannot create participants")]
    CreatorNotPermitted(Capacity),

    /// No valid study could be assigned to the new participant.
    #[error("study type invalid or not included")]
    InvalidStudy,

    /// No unused participant ID was found.
    #[error("no unused participant id found after {0} attempts")]
    UniqueIdExhausted(usize),

    /// Stored data failed a constraint.
    #[error("invalid data")]
    InvalidData,

    /// Password hashing failed.
    #[error("credential error")]
    Credential(#[from] CredentialError),

    /// Session token could not be issued.
    #[error("token error")]
    Token(#[from] TokenError),

    /// Blocking hashing task failed to complete.
    #[error("background task failed")]
    Blocking(#[from] tokio::task::JoinError),

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ParticipantsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidStudy,
            Some(ErrorKind::CheckViolation | ErrorKind::NotNullViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
