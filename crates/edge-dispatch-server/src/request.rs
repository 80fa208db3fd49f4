//! HTTP request conversion.
//!
//! Converts an inbound Axum request into the [`EdgeRequest`] representation
//! handed to the handler module.

use axum::http::request::Parts;
use bytes::Bytes;

use edge_dispatch_common::EdgeRequest;

/// Convert decomposed Axum request parts into an [`EdgeRequest`].
///
/// Headers with non-UTF-8 values are skipped; the body is carried as UTF-8
/// text (lossy), matching the JSON guest boundary.
pub fn from_parts(parts: &Parts, body: Bytes) -> EdgeRequest {
    let method = parts.method.to_string();
    let uri = parts.uri.to_string();

    let headers: Vec<(String, String)> = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect();

    let body = if body.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&body).into_owned())
    };

    EdgeRequest {
        method,
        uri,
        headers,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Request};

    fn parts_for(req: Request<()>) -> Parts {
        req.into_parts().0
    }

    #[test]
    fn test_from_parts() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/users?active=true")
            .header("Content-Type", "application/json")
            .header("X-Request-Id", "123")
            .body(())
            .unwrap();

        let body = Bytes::from(r#"{"name": "test"}"#);
        let edge = from_parts(&parts_for(req), body);

        assert_eq!(edge.method, "POST");
        assert_eq!(edge.uri, "/api/users?active=true");
        assert_eq!(edge.headers.len(), 2);
        assert_eq!(edge.body.as_deref(), Some(r#"{"name": "test"}"#));
    }

    #[test]
    fn test_empty_body_is_none() {
        let req = Request::builder().uri("/").body(()).unwrap();
        let edge = from_parts(&parts_for(req), Bytes::new());

        assert_eq!(edge.method, "GET");
        assert!(edge.body.is_none());
    }

    #[test]
    fn test_non_utf8_header_skipped() {
        let mut req = Request::builder().uri("/").body(()).unwrap();
        req.headers_mut().insert(
            "x-binary",
            axum::http::HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap(),
        );
        let edge = from_parts(&parts_for(req), Bytes::new());

        assert!(edge.get_header("x-binary").is_none());
    }
}
