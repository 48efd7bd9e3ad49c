//! Strict-Transport-Security header.

use salvo::{
    http::header::{HeaderValue, STRICT_TRANSPORT_SECURITY},
    prelude::*,
};

const HSTS_POLICY: &str = "max-age=63072000; includeSubDomains";

/// Adds the HSTS header to every response, including rejections.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    res.headers_mut().insert(
        STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static(HSTS_POLICY),
    );

    ctrl.call_next(req, depot, res).await;
}
