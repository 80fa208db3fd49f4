//! Host functions exposed to the handler module.
//!
//! The gateway provides guests a single capability: structured logging.
//! Logs are both stored in the [`WorkerContext`] for the dispatch layer and
//! re-emitted through `tracing` for observability.

use tracing::{debug, error, info, warn};
use wasmtime::{Caller, Extern, Linker};

use crate::store::{LogLevel, WorkerContext};
use edge_dispatch_common::GatewayError;

/// Register all host functions on a module linker.
///
/// Currently registers:
/// - `env::log(level: i32, ptr: i32, len: i32)`
///
/// # Errors
///
/// Returns a `ModuleInit` error if registration fails; registration happens
/// on the initialization path, before the module handle becomes ready.
pub fn register_host_functions(linker: &mut Linker<WorkerContext>) -> Result<(), GatewayError> {
    register_logging(linker)?;
    Ok(())
}

/// Register the logging host function.
///
/// # Memory Protocol
///
/// The guest passes:
/// - `level`: Log level (0=debug, 1=info, 2=warn, 3=error)
/// - `ptr`: Pointer to the message string in guest memory
/// - `len`: Length of the message in bytes (UTF-8)
///
/// Invalid pointers or lengths are logged host-side and ignored; a bad log
/// call never fails the request.
fn register_logging(linker: &mut Linker<WorkerContext>) -> Result<(), GatewayError> {
    linker
        .func_wrap(
            "env",
            "log",
            |mut caller: Caller<'_, WorkerContext>, level: i32, ptr: i32, len: i32| {
                if ptr < 0 || len < 0 {
                    warn!(ptr, len, "Guest log with negative pointer or length");
                    return;
                }

                let Some(Extern::Memory(memory)) = caller.get_export("memory") else {
                    warn!("Guest log without an exported memory");
                    return;
                };

                let mut buf = vec![0u8; len as usize];
                if memory.read(&caller, ptr as usize, &mut buf).is_err() {
                    warn!(ptr, len, "Guest log points outside linear memory");
                    return;
                }

                let message = String::from_utf8_lossy(&buf).into_owned();
                let level = level_from_i32(level);

                emit(caller.data(), level, &message);
                caller.data_mut().log(level, message);
            },
        )
        .map_err(|e| {
            GatewayError::module_init(format!("host function registration failed: {e}"))
        })?;

    Ok(())
}

/// Re-emit a guest log through `tracing`, tagged with the request id.
fn emit(ctx: &WorkerContext, level: LogLevel, message: &str) {
    let request_id = ctx.request_id.as_str();
    match level {
        LogLevel::Debug => debug!(request_id, guest_log = true, "{}", message),
        LogLevel::Info => info!(request_id, guest_log = true, "{}", message),
        LogLevel::Warn => warn!(request_id, guest_log = true, "{}", message),
        LogLevel::Error => error!(request_id, guest_log = true, "{}", message),
    }
}

/// Convert a numeric log level to [`LogLevel`].
///
/// Unknown values default to Info.
pub fn level_from_i32(level: i32) -> LogLevel {
    match level {
        0 => LogLevel::Debug,
        2 => LogLevel::Warn,
        3 => LogLevel::Error,
        _ => LogLevel::Info,
    }
}
