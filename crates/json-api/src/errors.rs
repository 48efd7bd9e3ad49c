//! JSON error responses.

use salvo::{
    http::StatusCode,
    prelude::{Json, Response},
    writing::Scribe,
};
use serde::{Deserialize, Serialize};

/// Body of every error response: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,

    #[serde(
        rename = "error description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

/// An HTTP status paired with a JSON error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                description: None,
            },
        }
    }

    pub(crate) fn invalid_header() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "invalid header")
    }

    pub(crate) fn invalid_token() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "invalid token type")
    }

    pub(crate) fn invalid_access_token() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "invalid access token")
    }

    pub(crate) fn insufficient_capacity() -> Self {
        Self::new(StatusCode::FORBIDDEN, "insufficient capacity")
    }

    pub(crate) fn json_parsing() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: "json parsing error".to_string(),
                description: Some("key or value of json is formatted incorrectly".to_string()),
            },
        }
    }

    pub(crate) fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl Scribe for ApiError {
    fn render(self, res: &mut Response) {
        res.status_code(self.status);
        res.render(Json(self.body));
    }
}
