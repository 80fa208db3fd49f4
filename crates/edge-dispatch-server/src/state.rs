//! Shared application state.
//!
//! [`AppState`] is the execution context: the engine, the module loader's
//! one-time initialization cell, and the dispatcher, shared by every request
//! handler. It is created once at startup and cloned (cheaply, all `Arc`s)
//! per request.

use std::sync::Arc;

use edge_dispatch_common::{GatewayError, RuntimeConfig};
use edge_dispatch_core::{Dispatcher, ModuleLoader, ModuleSource, WasmEngine, WasmModuleHandler};

/// Shared state across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Wasmtime engine (shared across all requests).
    engine: WasmEngine,

    /// The module's lazily-initialized capability cell.
    loader: Arc<ModuleLoader>,

    /// Per-event dispatch pipeline.
    dispatcher: Dispatcher<WasmModuleHandler>,
}

impl AppState {
    /// Create new application state around one handler module.
    ///
    /// The module is not loaded here; initialization runs lazily on the
    /// first dispatched event (or the first concurrent batch, which
    /// coordinates on a single attempt).
    ///
    /// # Errors
    ///
    /// Returns an error if engine creation fails.
    pub fn new(
        config: &RuntimeConfig,
        source: ModuleSource,
        entry: &str,
    ) -> Result<Self, GatewayError> {
        let engine = WasmEngine::new(&config.engine)?;
        let loader = Arc::new(ModuleLoader::new(
            engine.clone(),
            config.execution.clone(),
            source,
            entry,
        ));
        let dispatcher = Dispatcher::new(WasmModuleHandler::new(Arc::clone(&loader)));

        Ok(Self {
            engine,
            loader,
            dispatcher,
        })
    }

    /// Get the Wasmtime engine.
    pub fn engine(&self) -> &WasmEngine {
        &self.engine
    }

    /// Get the module loader.
    pub fn loader(&self) -> &Arc<ModuleLoader> {
        &self.loader
    }

    /// Get the dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher<WasmModuleHandler> {
        &self.dispatcher
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_dispatch_common::EngineConfig;

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

    #[test]
    fn test_app_state_creation_is_lazy() {
        let state = AppState::new(
            &test_config(),
            ModuleSource::Bytes(b"not even wasm".to_vec()),
            "handle",
        )
        .unwrap();

        // Bad module bytes do not fail construction; they fail the first event
        assert_eq!(state.loader().init_attempts(), 0);
        assert!(!state.loader().is_initialized());
    }
}
