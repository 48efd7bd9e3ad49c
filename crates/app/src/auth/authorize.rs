//! Route authorization.

use std::fmt;

use thiserror::Error;

use crate::auth::{Capacity, SessionClaims, TokenAuthority, TokenError};

/// `Authorization` header scheme literal expected by a route family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderScheme {
    /// Portal and coordinator routes.
    Bearer,

    /// Mobile app device routes.
    Mars,
}

impl HeaderScheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bearer => "Bearer",
            Self::Mars => "Mars",
        }
    }
}

impl fmt::Display for HeaderScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a route demands of the caller's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicy {
    pub scheme: HeaderScheme,

    /// Capacity the caller must hold, if any.
    pub required: Option<Capacity>,

    /// Whether the token must be the caller's most recently issued one.
    pub single_session: bool,
}

impl RoutePolicy {
    #[must_use]
    pub const fn bearer() -> Self {
        Self {
            scheme: HeaderScheme::Bearer,
            required: None,
            single_session: false,
        }
    }

    #[must_use]
    pub const fn mars() -> Self {
        Self {
            scheme: HeaderScheme::Mars,
            required: None,
            single_session: false,
        }
    }

    #[must_use]
    pub const fn require(mut self, capacity: Capacity) -> Self {
        self.required = Some(capacity);
        self
    }

    #[must_use]
    pub const fn single_session(mut self) -> Self {
        self.single_session = true;
        self
    }
}

#[derive(Debug, Error)]
pub enum AuthorizeError {
    /// Header is not `<scheme> <token>` with the route's scheme.
    #[error("authorization header is malformed")]
    MalformedHeader,

    /// Token failed verification.
    #[error("token rejected")]
    Authentication(#[from] TokenError),

    /// Token is valid but its capacity does not satisfy the route.
    #[error("{actual} capacity cannot access a route for {required}")]
    Authorization {
        required: Capacity,
        actual: Capacity,
    },

    /// Token is valid but a newer session has replaced it.
    #[error("token is not the participant's current session")]
    SessionSuperseded,

    /// Identity store could not be reached.
    #[error("identity store error")]
    Upstream(#[source] sqlx::Error),
}

/// Split a raw `Authorization` value into its token.
///
/// # Errors
///
/// Returns [`AuthorizeError::MalformedHeader`] unless `raw` is exactly the
/// expected scheme, one space and a non-empty token.
pub fn parse_authorization_header(
    raw: &str,
    scheme: HeaderScheme,
) -> Result<&str, AuthorizeError> {
    let mut parts = raw.split(' ');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(found), Some(token), None) if found == scheme.as_str() && !token.is_empty() => {
            Ok(token)
        }
        _ => Err(AuthorizeError::MalformedHeader),
    }
}

/// Verify a raw header against `scheme` and `required`.
///
/// Pure: the single-session check needs the identity store and lives in
/// [`crate::auth::AuthService`].
///
/// # Errors
///
/// See [`AuthorizeError`].
pub fn authorize(
    tokens: &TokenAuthority,
    scheme: HeaderScheme,
    required: Option<Capacity>,
    raw: &str,
) -> Result<SessionClaims, AuthorizeError> {
    let token = parse_authorization_header(raw, scheme)?;
    let claims = tokens.verify(token)?;

    if let Some(required) = required
        && claims.capacity != required
    {
        return Err(AuthorizeError::Authorization {
            required,
            actual: claims.capacity,
        });
    }

    Ok(claims)
}
