//! Session claims carried by participant tokens.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Capacity, ParticipantId, TokenError, studies::token_lifetime};

/// Issuer written into every session token.
pub const TOKEN_ISSUER: &str = "localhost:8080";

/// Decoded payload of a session token.
///
/// `study` is present for coordinators and patients and absent for admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub participant_id: ParticipantId,

    pub capacity: Capacity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study: Option<String>,

    /// Issued-at, unix seconds. Tokens from before `iat` was written lack it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiry, unix seconds.
    pub exp: i64,

    pub iss: String,

    /// Unique per issued token, so two logins within a second still produce
    /// distinct sessions. Absent on older tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<Uuid>,
}

impl SessionClaims {
    /// Build claims for a new session starting at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::MissingStudy`] when a non-admin capacity has no
    /// study, and [`TokenError::ExpiryOutOfRange`] when the expiry cannot be
    /// represented.
    pub fn new(
        participant_id: ParticipantId,
        capacity: Capacity,
        study: Option<&str>,
        issued_at: Timestamp,
    ) -> Result<Self, TokenError> {
        let study = if capacity.requires_study() {
            match study.map(str::trim) {
                Some(study) if !study.is_empty() => Some(study.to_string()),
                _ => return Err(TokenError::MissingStudy(capacity)),
            }
        } else {
            None
        };

        let expires_at = issued_at
            .checked_add(token_lifetime(study.as_deref()))
            .map_err(|_overflow| TokenError::ExpiryOutOfRange)?;

        Ok(Self {
            participant_id,
            capacity,
            study,
            iat: Some(issued_at.as_second()),
            exp: expires_at.as_second(),
            iss: TOKEN_ISSUER.to_string(),
            jti: Some(Uuid::new_v4()),
        })
    }

    /// Check the capacity/study pairing of decoded claims.
    pub(crate) fn check_shape(&self) -> Result<(), TokenError> {
        match (self.capacity.requires_study(), self.study.as_deref()) {
            (true, Some(study)) if !study.is_empty() => Ok(()),
            (true, _) => Err(TokenError::MissingStudy(self.capacity)),
            (false, None) => Ok(()),
            (false, Some(_)) => Err(TokenError::UnexpectedStudy),
        }
    }

    #[must_use]
    pub fn study(&self) -> Option<&str> {
        self.study.as_deref()
    }
}
