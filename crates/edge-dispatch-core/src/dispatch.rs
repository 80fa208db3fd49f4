//! Per-event dispatch pipeline.
//!
//! [`Dispatcher`] binds one handling attempt to each inbound event and
//! guarantees a response is always produced. The per-event logic is a plain
//! async function from request to response, so it is unit-testable without
//! a live HTTP server; the server crate awaits it from its single catch-all
//! route.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::fault::{FailureSignal, guard};
use crate::loader::ModuleLoader;
use edge_dispatch_common::{EdgeRequest, EdgeResponse};

/// The module's consumed capability surface: exactly one entry operation
/// from an inbound event's request data to a response or a failure signal.
///
/// The production implementation is [`WasmModuleHandler`]; tests substitute
/// in-process handlers.
#[async_trait]
pub trait EdgeHandler: Send + Sync + 'static {
    /// Handle one inbound event.
    async fn handle(
        &self,
        request: EdgeRequest,
        request_id: &str,
    ) -> Result<EdgeResponse, FailureSignal>;
}

/// Production handler: module readiness strictly before entry invocation.
pub struct WasmModuleHandler {
    loader: Arc<ModuleLoader>,
}

impl WasmModuleHandler {
    /// Wrap a loader as the dispatchable handler.
    pub fn new(loader: Arc<ModuleLoader>) -> Self {
        Self { loader }
    }

    /// The underlying loader.
    pub fn loader(&self) -> &Arc<ModuleLoader> {
        &self.loader
    }
}

#[async_trait]
impl EdgeHandler for WasmModuleHandler {
    async fn handle(
        &self,
        request: EdgeRequest,
        request_id: &str,
    ) -> Result<EdgeResponse, FailureSignal> {
        // Readiness first; a ModuleInit failure becomes the event's signal
        let handle = self.loader.ensure_ready().await?;
        handle.invoke(&request, request_id).await
    }
}

/// Binds one handling attempt to each inbound event.
///
/// `dispatch` is total: by the time the platform awaits the returned
/// future, the commitment to produce exactly one response is already made,
/// and no failure shape can leave it unresolved.
pub struct Dispatcher<H: EdgeHandler> {
    handler: Arc<H>,
}

impl<H: EdgeHandler> Dispatcher<H> {
    /// Create a dispatcher around a handler.
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Handle one inbound event to a guaranteed response.
    ///
    /// Sequences readiness → invocation → normalization for this event;
    /// distinct events share nothing but the once-initialized module handle
    /// and may run concurrently.
    pub async fn dispatch(&self, request: EdgeRequest) -> EdgeResponse {
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        info!(
            request_id = %request_id,
            method = %request.method,
            path = %request.path(),
            "Dispatching inbound event"
        );

        let handler = Arc::clone(&self.handler);
        let rid = request_id.clone();
        let response = guard(async move { handler.handle(request, &rid).await }).await;

        let duration = start.elapsed();
        if response.status >= 500 {
            warn!(
                request_id = %request_id,
                status = response.status,
                duration_ms = duration.as_millis(),
                "Response delivered (failure path)"
            );
        } else {
            info!(
                request_id = %request_id,
                status = response.status,
                duration_ms = duration.as_millis(),
                "Response delivered"
            );
        }

        response
    }
}

impl<H: EdgeHandler> Clone for Dispatcher<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: EdgeHandler> std::fmt::Debug for Dispatcher<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{FAILURE_STATUS, UNKNOWN_FAILURE};

    struct FixedHandler(EdgeResponse);

    #[async_trait]
    impl EdgeHandler for FixedHandler {
        async fn handle(
            &self,
            _request: EdgeRequest,
            _request_id: &str,
        ) -> Result<EdgeResponse, FailureSignal> {
            Ok(self.0.clone())
        }
    }

    struct FailingHandler(FailureSignal);

    #[async_trait]
    impl EdgeHandler for FailingHandler {
        async fn handle(
            &self,
            _request: EdgeRequest,
            _request_id: &str,
        ) -> Result<EdgeResponse, FailureSignal> {
            Err(self.0.clone())
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl EdgeHandler for PanickingHandler {
        async fn handle(
            &self,
            _request: EdgeRequest,
            _request_id: &str,
        ) -> Result<EdgeResponse, FailureSignal> {
            panic!("boom")
        }
    }

    #[tokio::test]
    async fn test_success_passes_through_unmodified() {
        let expected = EdgeResponse::text(200, "ok").with_header("x-extra", "1");
        let dispatcher = Dispatcher::new(FixedHandler(expected.clone()));

        let delivered = dispatcher.dispatch(EdgeRequest::new("GET", "/")).await;
        assert_eq!(delivered, expected);
    }

    #[tokio::test]
    async fn test_trace_signal_becomes_diagnostic_body() {
        let dispatcher = Dispatcher::new(FailingHandler(FailureSignal::traced("Trace...")));

        let delivered = dispatcher.dispatch(EdgeRequest::new("GET", "/")).await;
        assert_eq!(delivered.status, FAILURE_STATUS);
        assert_eq!(delivered.body, "Trace...");
    }

    #[tokio::test]
    async fn test_empty_signal_becomes_unknown_error() {
        let dispatcher = Dispatcher::new(FailingHandler(FailureSignal::Empty));

        let delivered = dispatcher.dispatch(EdgeRequest::new("GET", "/")).await;
        assert_eq!(delivered.status, FAILURE_STATUS);
        assert_eq!(delivered.body, UNKNOWN_FAILURE);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let dispatcher = Dispatcher::new(PanickingHandler);

        let delivered = dispatcher.dispatch(EdgeRequest::new("GET", "/")).await;
        assert_eq!(delivered.status, FAILURE_STATUS);
        assert_eq!(delivered.body, "boom");

        // The dispatcher survives; the next event is handled normally
        let delivered = dispatcher.dispatch(EdgeRequest::new("GET", "/again")).await;
        assert_eq!(delivered.status, FAILURE_STATUS);
    }
}
