//! Session token issuance and verification.

use jiff::Timestamp;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::{Error as JwtError, ErrorKind},
};
use thiserror::Error;

use crate::auth::{Capacity, ParticipantId, SessionClaims, SigningKeys, claims::TOKEN_ISSUER};

/// The only algorithm tokens are signed and accepted with.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing key is empty")]
    EmptySigningKey,

    #[error("{0} tokens require a study")]
    MissingStudy(Capacity),

    #[error("admin tokens must not carry a study")]
    UnexpectedStudy,

    #[error("token expiry is out of range")]
    ExpiryOutOfRange,

    #[error("token signing failed")]
    Signing(#[source] JwtError),

    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token uses an unexpected algorithm")]
    UnexpectedAlgorithm,

    #[error("token is malformed")]
    Malformed(#[source] JwtError),
}

impl From<JwtError> for TokenError {
    fn from(error: JwtError) -> Self {
        match error.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnexpectedAlgorithm
            }
            _ => Self::Malformed(error),
        }
    }
}

/// A freshly signed token and the claims inside it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

/// Signs and verifies session tokens with the current [`SigningKeys`] key.
#[derive(Debug, Clone)]
pub struct TokenAuthority {
    keys: SigningKeys,
}

impl TokenAuthority {
    #[must_use]
    pub fn new(keys: SigningKeys) -> Self {
        Self { keys }
    }

    #[must_use]
    pub fn keys(&self) -> &SigningKeys {
        &self.keys
    }

    /// Issue a session token starting now.
    ///
    /// # Errors
    ///
    /// Fails when the claims are inconsistent, the key is empty or signing
    /// fails. No token is returned in any of those cases.
    pub fn issue(
        &self,
        capacity: Capacity,
        study: Option<&str>,
        participant_id: ParticipantId,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_at(capacity, study, participant_id, Timestamp::now())
    }

    /// Issue a session token starting at `issued_at`.
    ///
    /// # Errors
    ///
    /// See [`TokenAuthority::issue`].
    pub fn issue_at(
        &self,
        capacity: Capacity,
        study: Option<&str>,
        participant_id: ParticipantId,
        issued_at: Timestamp,
    ) -> Result<IssuedToken, TokenError> {
        let claims = SessionClaims::new(participant_id, capacity, study, issued_at)?;

        let key = self.keys.current();

        if key.is_empty() {
            return Err(TokenError::EmptySigningKey);
        }

        let token = encode(
            &Header::new(TOKEN_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .map_err(TokenError::Signing)?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Fails on a bad signature, an algorithm other than HS256, an expired
    /// token, a foreign issuer or claims of the wrong shape.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let key = self.keys.current();

        if key.is_empty() {
            return Err(TokenError::EmptySigningKey);
        }

        let mut validation = Validation::new(TOKEN_ALGORITHM);

        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(key.as_bytes()),
            &validation,
        )?;

        data.claims.check_shape()?;

        Ok(data.claims)
    }
}
