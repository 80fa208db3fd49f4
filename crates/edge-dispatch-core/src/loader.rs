//! Lazy, single-flight module initialization.
//!
//! [`ModuleLoader`] owns the one-time-initialized module handle for the
//! execution context. Initialization is coordinated through a shared
//! pending-completion cell rather than a raw flag: however many in-flight
//! dispatches race to trigger it, exactly one initialization runs and every
//! caller observes its outcome.
//!
//! # Failure policy: fail-fast caching
//!
//! A failed initialization is cached for the remainder of the context's
//! life; later calls return the cached error immediately instead of
//! recompiling. A corrupted binary will not self-heal within one context
//! lifetime, and the platform recycles contexts on redeploy.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::invoke::ModuleHandle;
use crate::module::CompiledModule;
use crate::WasmEngine;
use edge_dispatch_common::{ExecutionConfig, GatewayError};

/// Where the handler module's bytes come from.
#[derive(Debug, Clone)]
pub enum ModuleSource {
    /// A `.wasm` file on disk, read lazily at first use.
    File(PathBuf),
    /// In-memory Wasm bytes.
    Bytes(Vec<u8>),
    /// WAT text, compiled at first use. Primarily for tests.
    Wat(String),
}

/// The execution context's lazily-initialized module capability cell.
///
/// Single-writer, many-reader: the cell is written at most once (by
/// whichever concurrent attempt runs the initialization) and read by every
/// dispatch thereafter.
pub struct ModuleLoader {
    engine: WasmEngine,
    exec_config: ExecutionConfig,
    source: ModuleSource,
    entry: String,

    /// The one-time initialization outcome. Errors are cached as their
    /// rendered reason so later callers can fail fast.
    slot: OnceCell<Result<Arc<ModuleHandle>, String>>,

    /// Number of times initialization actually ran.
    attempts: AtomicU64,
}

impl ModuleLoader {
    /// Create a loader for the given module source.
    ///
    /// Nothing is read or compiled until the first [`ensure_ready`] call.
    ///
    /// [`ensure_ready`]: ModuleLoader::ensure_ready
    pub fn new(
        engine: WasmEngine,
        exec_config: ExecutionConfig,
        source: ModuleSource,
        entry: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            exec_config,
            source,
            entry: entry.into(),
            slot: OnceCell::new(),
            attempts: AtomicU64::new(0),
        }
    }

    /// Get the ready module handle, initializing it if necessary.
    ///
    /// Concurrent callers before first completion all await the same
    /// in-flight initialization and receive the same handle. After a
    /// success, this is a cheap clone of the cached `Arc`; after a failure,
    /// the cached `ModuleInit` error is returned immediately (fail-fast
    /// caching, see module docs).
    ///
    /// # Errors
    ///
    /// Returns `ModuleInit` if initialization failed, now or previously.
    pub async fn ensure_ready(&self) -> Result<Arc<ModuleHandle>, GatewayError> {
        let slot = self
            .slot
            .get_or_init(|| async {
                self.attempts.fetch_add(1, Ordering::Relaxed);
                match self.initialize().await {
                    Ok(handle) => {
                        info!(
                            content_hash = %handle.content_hash(),
                            entry = %handle.entry(),
                            "Handler module ready"
                        );
                        Ok(Arc::new(handle))
                    }
                    Err(e) => {
                        warn!(error = %e, "Handler module initialization failed; caching failure");
                        Err(e.to_string())
                    }
                }
            })
            .await;

        match slot {
            Ok(handle) => Ok(Arc::clone(handle)),
            Err(reason) => Err(GatewayError::module_init(reason.clone())),
        }
    }

    /// Run the actual initialization: read, compile, verify exports.
    async fn initialize(&self) -> Result<ModuleHandle, GatewayError> {
        let compiled = match &self.source {
            ModuleSource::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    GatewayError::module_init(format!(
                        "failed to read '{}': {e}",
                        path.display()
                    ))
                })?;
                CompiledModule::from_bytes(self.engine.inner(), &bytes)?
            }
            ModuleSource::Bytes(bytes) => CompiledModule::from_bytes(self.engine.inner(), bytes)?,
            ModuleSource::Wat(wat) => CompiledModule::from_wat(self.engine.inner(), wat)?,
        };

        ModuleHandle::new(
            self.engine.clone(),
            compiled,
            self.entry.clone(),
            self.exec_config.clone(),
        )
    }

    /// Number of times initialization has actually run.
    ///
    /// Stays at 1 after the first attempt regardless of how many events
    /// arrive, in both the success and the cached-failure case.
    pub fn init_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Whether initialization has run (successfully or not).
    pub fn is_initialized(&self) -> bool {
        self.slot.initialized()
    }

    /// Whether the module is initialized and usable.
    pub fn is_ready(&self) -> bool {
        matches!(self.slot.get(), Some(Ok(_)))
    }

    /// The configured entry function name.
    pub fn entry(&self) -> &str {
        &self.entry
    }
}

impl std::fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("entry", &self.entry)
            .field("initialized", &self.is_initialized())
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}
