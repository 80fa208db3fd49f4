//! HTTP router configuration.
//!
//! The router makes exactly one inbound-event registration: a fallback that
//! claims every method and path not taken by the operational probes. Routing
//! beyond that single entry point belongs to the handler module itself.

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{dispatch_event, health_check, readiness_check};
use crate::state::AppState;

/// Build the application router.
///
/// Routes:
/// - `GET /health` - Health check
/// - `GET /ready` - Readiness check (module cell state)
/// - anything else, any method - dispatched to the handler module
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // The single inbound-event registration
        .fallback(dispatch_event)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use edge_dispatch_common::{EngineConfig, RuntimeConfig};
    use edge_dispatch_core::ModuleSource;
    use tower::util::ServiceExt;

    // Fixed 200 "ok" handler; the data segment is 52 bytes at offset 0.
    const OK_WAT: &str = r#"
        (module
            (memory (export "memory") 1)
            (func (export "alloc") (param i32) (result i32) (i32.const 4096))
            (data (i32.const 0) "{\"response\":{\"status\":200,\"headers\":[],\"body\":\"ok\"}}")
            (func (export "handle") (param i32 i32) (result i64)
                (i64.const 52)))
    "#;

    fn test_config() -> RuntimeConfig {
        RuntimeConfig {
            engine: EngineConfig {
                pooling_allocator: false,
                epoch_interruption: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn router_for(source: ModuleSource) -> Router {
        let state = AppState::new(&test_config(), source, "handle").unwrap();
        build_router(state, Duration::from_secs(30))
    }

    fn ok_router() -> Router {
        router_for(ModuleSource::Wat(OK_WAT.into()))
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = ok_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_check() {
        let response = ok_router()
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dispatch_any_path() {
        let response = ok_router()
            .oneshot(
                Request::builder()
                    .uri("/some/arbitrary/path?q=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_dispatch_any_method() {
        let response = ok_router()
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/resource/7")
                    .body(Body::from("payload"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dispatch_corrupt_module_is_diagnostic_500() {
        let response = router_for(ModuleSource::Bytes(b"\0asmJUNKJUNK".to_vec()))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(
            text.contains("Module initialization failed"),
            "expected init diagnostic, got: {text}"
        );
    }
}
