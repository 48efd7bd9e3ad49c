//! Request body helpers.

use salvo::prelude::Request;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::ApiError;

pub(crate) trait RequestExt {
    /// Parse a JSON body, answering malformed ones with a `400`.
    async fn json_or_400<T: DeserializeOwned + Send>(&mut self) -> Result<T, ApiError>;
}

impl RequestExt for Request {
    async fn json_or_400<T: DeserializeOwned + Send>(&mut self) -> Result<T, ApiError> {
        self.parse_json::<T>().await.map_err(|source| {
            debug!("rejected request body: {source}");

            ApiError::json_parsing()
        })
    }
}
