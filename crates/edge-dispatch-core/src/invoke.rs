//! Guest entry invocation.
//!
//! [`ModuleHandle`] is the ready module's callable surface: the capability
//! handle the loader hands out once initialization completes. One invocation
//! corresponds to one inbound event and uses a fresh store, so no guest
//! state survives across requests.
//!
//! # Guest ABI
//!
//! The handler module exports:
//!
//! - `memory` — linear memory
//! - `alloc(len: i32) -> i32` — allocate a buffer for the request payload
//! - the entry function, `handle(ptr: i32, len: i32) -> i64` by default —
//!   consumes a JSON-encoded [`EdgeRequest`], returns `(ptr << 32) | len`
//!   locating a JSON-encoded [`GuestOutcome`] in linear memory
//!
//! A trap anywhere in that sequence becomes a trace-carrying
//! [`FailureSignal`]; a malformed outcome buffer becomes a message-carrying
//! one.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use wasmtime::{Linker, Store};

use crate::fault::FailureSignal;
use crate::host::register_host_functions;
use crate::module::CompiledModule;
use crate::store::{WorkerContext, calculate_fuel_consumed, create_store, get_remaining_fuel};
use crate::WasmEngine;
use edge_dispatch_common::{EdgeRequest, EdgeResponse, ExecutionConfig, GatewayError};

/// The value the guest entry function returns, decoded from JSON.
///
/// Externally tagged: `{"response": {...}}` on success,
/// `{"error": {"message": ..., "stack": ...}}` when the guest raises.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestOutcome {
    /// The guest computed a response.
    Response(EdgeResponse),
    /// The guest raised a failure.
    Error(GuestFault),
}

/// A failure raised explicitly by the guest.
///
/// Both fields are optional; the fault boundary applies its extraction
/// precedence (stack first, then message) to whatever is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestFault {
    /// Short human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Structured trace, if the guest captured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl From<GuestFault> for FailureSignal {
    fn from(fault: GuestFault) -> Self {
        match (fault.stack, fault.message) {
            (Some(stack), _) if !stack.trim().is_empty() => FailureSignal::traced(stack),
            (_, Some(message)) if !message.trim().is_empty() => FailureSignal::message(message),
            _ => FailureSignal::Empty,
        }
    }
}

/// The ready module's callable surface.
///
/// Created exactly once per execution context by the loader and shared (via
/// `Arc`) by every request thereafter. Thread-safe: each invocation builds
/// its own store; the handle itself is immutable.
pub struct ModuleHandle {
    engine: WasmEngine,
    module: CompiledModule,
    linker: Linker<WorkerContext>,
    entry: String,
    exec_config: ExecutionConfig,
}

impl ModuleHandle {
    /// Wrap a compiled module, verifying its callable surface.
    ///
    /// # Errors
    ///
    /// Returns a `ModuleInit` error if a required export (`memory`, `alloc`,
    /// or the entry function) is missing, or host function registration
    /// fails.
    pub(crate) fn new(
        engine: WasmEngine,
        module: CompiledModule,
        entry: String,
        exec_config: ExecutionConfig,
    ) -> Result<Self, GatewayError> {
        verify_exports(&module, &entry)?;

        let mut linker = Linker::new(engine.inner());
        register_host_functions(&mut linker)?;

        Ok(Self {
            engine,
            module,
            linker,
            entry,
            exec_config,
        })
    }

    /// Name of the entry function this handle invokes.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Content hash of the underlying module.
    pub fn content_hash(&self) -> &str {
        self.module.content_hash()
    }

    /// Invoke the entry operation for one inbound event.
    ///
    /// Sequences: fresh store → instantiate → write request into guest
    /// memory → call entry → read and decode the outcome. Any failure along
    /// the way is returned as a [`FailureSignal`] for the fault boundary.
    #[instrument(skip(self, request), fields(request_id = %request_id, entry = %self.entry))]
    pub async fn invoke(
        &self,
        request: &EdgeRequest,
        request_id: &str,
    ) -> Result<EdgeResponse, FailureSignal> {
        let start = Instant::now();

        let mut store = create_store(&self.engine, &self.exec_config, request_id.to_string())
            .map_err(|e| FailureSignal::message(format!("store setup failed: {e}")))?;
        let initial_fuel = get_remaining_fuel(&store).unwrap_or(0);

        debug!("Instantiating handler module");

        let instance = self
            .linker
            .instantiate_async(&mut store, self.module.inner())
            .await
            .map_err(|e| FailureSignal::from_wasm_error(&e))?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| FailureSignal::message("module has no exported memory"))?;

        let alloc = instance
            .get_typed_func::<i32, i32>(&mut store, "alloc")
            .map_err(|e| FailureSignal::message(format!("alloc export unusable: {e}")))?;

        let entry = instance
            .get_typed_func::<(i32, i32), i64>(&mut store, &self.entry)
            .map_err(|e| {
                FailureSignal::message(format!("entry '{}' unusable: {e}", self.entry))
            })?;

        // Hand the request to the guest
        let payload = serde_json::to_vec(request)
            .map_err(|e| FailureSignal::message(format!("request encoding failed: {e}")))?;
        let len = i32::try_from(payload.len())
            .map_err(|_| FailureSignal::message("request too large for guest"))?;

        let ptr = alloc
            .call_async(&mut store, len)
            .await
            .map_err(|e| FailureSignal::from_wasm_error(&e))?;

        let ptr_usize = usize::try_from(ptr)
            .map_err(|_| FailureSignal::message("alloc returned a negative pointer"))?;
        memory
            .write(&mut store, ptr_usize, &payload)
            .map_err(|e| FailureSignal::message(format!("guest memory write failed: {e}")))?;

        debug!("Executing entry function");

        let packed = entry
            .call_async(&mut store, (ptr, len))
            .await
            .map_err(|e| FailureSignal::from_wasm_error(&e))?;

        // Bookkeeping before decoding, so metrics survive a malformed result
        let fuel_consumed = calculate_fuel_consumed(initial_fuel, &store);
        store.data_mut().metrics.fuel_consumed = fuel_consumed;
        store.data_mut().finalize_metrics();

        let outcome = read_outcome(&store, &memory, packed)?;

        let duration = start.elapsed();
        info!(
            duration_ms = duration.as_millis(),
            fuel_consumed,
            guest_logs = store.data().logs.len(),
            "Entry invocation completed"
        );

        match outcome {
            GuestOutcome::Response(response) => {
                if !(100..=599).contains(&response.status) {
                    return Err(FailureSignal::message(format!(
                        "handler produced invalid status {}",
                        response.status
                    )));
                }
                Ok(response)
            }
            GuestOutcome::Error(fault) => Err(fault.into()),
        }
    }
}

/// Read and decode the guest outcome from the packed pointer/length pair.
fn read_outcome(
    store: &Store<WorkerContext>,
    memory: &wasmtime::Memory,
    packed: i64,
) -> Result<GuestOutcome, FailureSignal> {
    #[allow(clippy::cast_sign_loss)]
    let ptr = ((packed as u64) >> 32) as usize;
    #[allow(clippy::cast_sign_loss)]
    let len = ((packed as u64) & 0xFFFF_FFFF) as usize;

    let mut buf = vec![0u8; len];
    memory
        .read(store, ptr, &mut buf)
        .map_err(|e| FailureSignal::message(format!("result location invalid: {e}")))?;

    serde_json::from_slice(&buf)
        .map_err(|e| FailureSignal::message(format!("malformed handler result: {e}")))
}

/// Verify the module exposes the callable surface the gateway needs.
fn verify_exports(module: &CompiledModule, entry: &str) -> Result<(), GatewayError> {
    let mut has_memory = false;
    let mut has_alloc = false;
    let mut has_entry = false;

    for export in module.inner().exports() {
        match export.name() {
            "memory" => has_memory = export.ty().memory().is_some(),
            "alloc" => has_alloc = export.ty().func().is_some(),
            name if name == entry => has_entry = export.ty().func().is_some(),
            _ => {}
        }
    }

    if !has_memory {
        return Err(GatewayError::module_init("module does not export 'memory'"));
    }
    if !has_alloc {
        return Err(GatewayError::module_init("module does not export 'alloc'"));
    }
    if !has_entry {
        return Err(GatewayError::module_init(format!(
            "module does not export entry function '{entry}'"
        )));
    }

    Ok(())
}

impl std::fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("entry", &self.entry)
            .field("content_hash", &self.module.content_hash())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_fault_precedence_stack_wins() {
        let fault = GuestFault {
            message: Some("short".into()),
            stack: Some("Trace...".into()),
        };
        let signal: FailureSignal = fault.into();
        assert_eq!(signal, FailureSignal::traced("Trace..."));
    }

    #[test]
    fn test_guest_fault_message_only() {
        let fault = GuestFault {
            message: Some("short".into()),
            stack: None,
        };
        let signal: FailureSignal = fault.into();
        assert_eq!(signal, FailureSignal::message("short"));
    }

    #[test]
    fn test_guest_fault_empty_stack_falls_through() {
        let fault = GuestFault {
            message: Some("short".into()),
            stack: Some("   ".into()),
        };
        let signal: FailureSignal = fault.into();
        assert_eq!(signal, FailureSignal::message("short"));
    }

    #[test]
    fn test_guest_fault_nothing_extractable() {
        let signal: FailureSignal = GuestFault::default().into();
        assert_eq!(signal, FailureSignal::Empty);
    }

    #[test]
    fn test_guest_outcome_decoding() {
        let json = r#"{"response":{"status":200,"headers":[],"body":"ok"}}"#;
        let outcome: GuestOutcome = serde_json::from_str(json).unwrap();
        assert!(matches!(
            outcome,
            GuestOutcome::Response(EdgeResponse { status: 200, .. })
        ));

        let json = r#"{"error":{"stack":"Trace..."}}"#;
        let outcome: GuestOutcome = serde_json::from_str(json).unwrap();
        assert!(matches!(outcome, GuestOutcome::Error(_)));
    }

    #[test]
    fn test_guest_outcome_encoding_round_trip() {
        let outcome = GuestOutcome::Response(EdgeResponse::text(200, "ok"));
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.starts_with(r#"{"response""#));
    }
}
