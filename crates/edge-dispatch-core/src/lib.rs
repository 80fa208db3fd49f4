//! Core dispatch contract for edge-dispatch.
//!
//! This crate implements the request-dispatch boundary around a single
//! opaque WebAssembly handler module:
//!
//! - [`WasmEngine`]: Configured Wasmtime engine shared by all requests
//! - [`ModuleLoader`]: Lazy, single-flight module initialization with
//!   fail-fast caching of a failed attempt
//! - [`ModuleHandle`]: The ready module's callable surface (entry invocation)
//! - [`FailureSignal`] / [`guard`]: The fault boundary converting every
//!   failure shape into a well-formed response
//! - [`Dispatcher`]: The per-event pipeline behind the [`EdgeHandler`] seam
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     WasmEngine                          │
//! │  (Shared across all requests, thread-safe)              │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                    ModuleLoader                         │
//! │  (Initialized at most once per execution context;       │
//! │   concurrent first callers await one in-flight attempt) │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │          Dispatcher → ModuleHandle::invoke              │
//! │  (Per-request store, guest entry call, fault boundary)  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod dispatch;
pub mod engine;
pub mod fault;
pub mod host;
pub mod invoke;
pub mod loader;
pub mod module;
pub mod store;

pub use dispatch::{Dispatcher, EdgeHandler, WasmModuleHandler};
pub use engine::WasmEngine;
pub use fault::{FailureSignal, failure_response, guard};
pub use invoke::{GuestFault, GuestOutcome, ModuleHandle};
pub use loader::{ModuleLoader, ModuleSource};
pub use module::CompiledModule;
pub use store::{ExecutionMetrics, LogEntry, LogLevel, WorkerContext};
