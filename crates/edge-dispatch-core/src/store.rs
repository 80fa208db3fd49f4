//! Per-request execution context and store management.
//!
//! - [`WorkerContext`]: Per-request state accessible from host functions
//! - [`LogEntry`] and [`LogLevel`]: Guest log collection
//! - [`ExecutionMetrics`]: Performance metrics for each execution
//!
//! Every inbound event gets a fresh [`wasmtime::Store`], so no guest state
//! survives from one request to the next.

use std::time::{Duration, Instant};

use wasmtime::Store;

use crate::WasmEngine;
use edge_dispatch_common::{ExecutionConfig, GatewayError};

/// Per-request execution context.
///
/// Created for each request and destroyed after the execution completes.
/// Host functions reach it through the [`wasmtime::Caller`] API.
pub struct WorkerContext {
    /// Unique request identifier for tracing.
    pub request_id: String,

    /// Logs collected from guest code.
    pub logs: Vec<LogEntry>,

    /// Execution metrics.
    pub metrics: ExecutionMetrics,

    /// Execution start time.
    start_time: Instant,
}

/// A single log entry from guest code.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Log level (debug, info, warn, error).
    pub level: LogLevel,

    /// Log message content.
    pub message: String,

    /// Timestamp when the log was recorded.
    pub timestamp: Instant,
}

/// Log level for guest logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug-level messages.
    Debug,
    /// Informational messages.
    Info,
    /// Warning messages.
    Warn,
    /// Error messages.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Execution performance metrics.
#[derive(Debug, Clone, Default)]
pub struct ExecutionMetrics {
    /// Fuel consumed during execution.
    pub fuel_consumed: u64,

    /// Total execution duration.
    pub duration: Option<Duration>,
}

impl WorkerContext {
    /// Create a new worker context with the given request ID.
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            logs: Vec::new(),
            metrics: ExecutionMetrics::default(),
            start_time: Instant::now(),
        }
    }

    /// Add a log entry.
    pub fn log(&mut self, level: LogLevel, message: String) {
        self.logs.push(LogEntry {
            level,
            message,
            timestamp: Instant::now(),
        });
    }

    /// Get elapsed time since execution started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Finalize metrics after execution.
    pub fn finalize_metrics(&mut self) {
        self.metrics.duration = Some(self.start_time.elapsed());
    }
}

/// Create a new Wasmtime store for one request.
///
/// The engine enables fuel consumption unconditionally, so the store always
/// gets a fuel budget: the configured limit when metering is on, effectively
/// unlimited when it is off.
///
/// # Errors
///
/// Returns an error if fuel cannot be set on the store.
pub fn create_store(
    engine: &WasmEngine,
    config: &ExecutionConfig,
    request_id: String,
) -> Result<Store<WorkerContext>, GatewayError> {
    let context = WorkerContext::new(request_id);
    let mut store = Store::new(engine.inner(), context);

    let fuel = if config.fuel_metering {
        config.max_fuel
    } else {
        u64::MAX
    };
    store
        .set_fuel(fuel)
        .map_err(|e| GatewayError::invalid_config(format!("Failed to set fuel: {e}")))?;

    // Deadline is relative to the current epoch; the server's ticker task
    // increments the epoch once per millisecond.
    if engine.config().epoch_interruption {
        store.set_epoch_deadline(config.timeout_ms);
    }

    Ok(store)
}

/// Get remaining fuel from a store.
pub fn get_remaining_fuel(store: &Store<WorkerContext>) -> Option<u64> {
    store.get_fuel().ok()
}

/// Calculate fuel consumed.
pub fn calculate_fuel_consumed(initial_fuel: u64, store: &Store<WorkerContext>) -> u64 {
    let remaining = get_remaining_fuel(store).unwrap_or(0);
    initial_fuel.saturating_sub(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_dispatch_common::EngineConfig;

    #[test]
    fn test_worker_context_creation() {
        let ctx = WorkerContext::new("test-request-123".into());

        assert_eq!(ctx.request_id, "test-request-123");
        assert!(ctx.logs.is_empty());
        assert_eq!(ctx.metrics.fuel_consumed, 0);
    }

    #[test]
    fn test_worker_context_logging() {
        let mut ctx = WorkerContext::new("test".into());

        ctx.log(LogLevel::Info, "Hello".into());
        ctx.log(LogLevel::Error, "World".into());

        assert_eq!(ctx.logs.len(), 2);
        assert_eq!(ctx.logs[0].level, LogLevel::Info);
        assert_eq!(ctx.logs[0].message, "Hello");
        assert_eq!(ctx.logs[1].level, LogLevel::Error);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Debug.to_string(), "DEBUG");
        assert_eq!(LogLevel::Info.to_string(), "INFO");
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
        assert_eq!(LogLevel::Error.to_string(), "ERROR");
    }

    #[test]
    fn test_store_creation() {
        let engine_config = EngineConfig {
            pooling_allocator: false, // Disable for simpler test
            ..Default::default()
        };
        let engine = WasmEngine::new(&engine_config).unwrap();
        let exec_config = ExecutionConfig::default();

        let store = create_store(&engine, &exec_config, "test-123".into());
        assert!(store.is_ok());
    }

    #[test]
    fn test_store_fuel() {
        let engine_config = EngineConfig {
            pooling_allocator: false,
            ..Default::default()
        };
        let engine = WasmEngine::new(&engine_config).unwrap();
        let exec_config = ExecutionConfig {
            max_fuel: 1000,
            fuel_metering: true,
            ..Default::default()
        };

        let store = create_store(&engine, &exec_config, "test".into()).unwrap();
        assert_eq!(get_remaining_fuel(&store), Some(1000));
    }

    #[test]
    fn test_store_fuel_unmetered() {
        let engine_config = EngineConfig {
            pooling_allocator: false,
            ..Default::default()
        };
        let engine = WasmEngine::new(&engine_config).unwrap();
        let exec_config = ExecutionConfig {
            fuel_metering: false,
            ..Default::default()
        };

        let store = create_store(&engine, &exec_config, "test".into()).unwrap();
        assert_eq!(get_remaining_fuel(&store), Some(u64::MAX));
    }
}
