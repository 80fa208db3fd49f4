//! HTTP response conversion.
//!
//! Converts the gateway's [`EdgeResponse`] into an Axum response for
//! delivery to the platform.

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Response, StatusCode};

use edge_dispatch_common::EdgeResponse;

/// Convert an [`EdgeResponse`] into an Axum response.
///
/// Invalid status codes fall back to 500; headers that do not form valid
/// HTTP header names or values are skipped.
pub fn into_axum_response(response: EdgeResponse) -> Response<Body> {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut builder = Response::builder().status(status);

    for (name, value) in &response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            builder = builder.header(name, value);
        }
    }

    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::from("Internal server error"))
                .unwrap()
        })
}
