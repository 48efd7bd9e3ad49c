//! Participant Data

use serde::Deserialize;

use crate::auth::{Capacity, ParticipantId, PasswordCredential, SessionClaims};

/// Participant row to insert.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub participant_id: ParticipantId,
    pub capacity: Capacity,
    pub study: Option<String>,
    pub credential: PasswordCredential,
    pub is_consented: bool,

    /// Peppered digest of the participant's email, see [`crate::auth::hash_email`].
    pub email_hash: Option<String>,
}

/// Login attempt.
///
/// A non-empty `email` takes precedence and is resolved to a participant
/// through its stored hash. Otherwise `participant_id` is used, raw and not
/// yet normalized.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default, rename = "participantID")]
    pub participant_id: i64,

    pub password: String,

    #[serde(default)]
    pub email: Option<String>,
}

impl LoginRequest {
    /// The email to log in with, if one was given.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("participant_id", &self.participant_id)
            .field("by_email", &self.email().is_some())
            .finish_non_exhaustive()
    }
}

/// Registration request as sent by a coordinator or admin.
///
/// `study` is only consulted when an admin registers a coordinator; every
/// other registration inherits the creator's study.
#[derive(Clone, Deserialize)]
pub struct NewRegistration {
    #[serde(rename = "participantID")]
    pub participant_id: i64,

    pub password: String,

    #[serde(default)]
    pub study: Option<String>,

    #[serde(default, rename = "isConsented")]
    pub is_consented: bool,

    /// Optional email the participant can later log in with.
    #[serde(default)]
    pub email: Option<String>,
}

impl std::fmt::Debug for NewRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewRegistration")
            .field("participant_id", &self.participant_id)
            .field("study", &self.study)
            .field("is_consented", &self.is_consented)
            .finish_non_exhaustive()
    }
}

/// New admin account, created out of band.
#[derive(Clone)]
pub struct NewAdmin {
    pub participant_id: i64,
    pub password: String,
}

impl std::fmt::Debug for NewAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAdmin")
            .field("participant_id", &self.participant_id)
            .finish_non_exhaustive()
    }
}

/// Password reset for an existing participant.
#[derive(Clone, Deserialize)]
pub struct PasswordReset {
    #[serde(rename = "participantID")]
    pub participant_id: i64,

    pub password: String,
}

impl std::fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordReset")
            .field("participant_id", &self.participant_id)
            .finish_non_exhaustive()
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSession {
    /// Signed session token. Also stored as the participant's current session.
    pub token: String,

    /// Claims inside `token`.
    pub claims: SessionClaims,

    pub is_consented: bool,
}

/// A participant created through registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredParticipant {
    pub participant_id: ParticipantId,
    pub capacity: Capacity,
    pub study: Option<String>,
}
