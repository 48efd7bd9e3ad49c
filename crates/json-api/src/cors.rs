//! Cross-origin access for browser clients.

use salvo::{
    cors::{AllowOrigin, Cors, CorsHandler},
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};

/// Any origin may call the API with a token and a JSON body.
///
/// Installed on the service rather than the router so preflight requests are
/// answered before routing and never reach authorization.
pub(crate) fn handler() -> CorsHandler {
    Cors::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![AUTHORIZATION, CONTENT_TYPE])
        .into_handler()
}
