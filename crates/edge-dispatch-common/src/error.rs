//! Error types for the dispatch gateway.
//!
//! This module defines [`GatewayError`], the error type shared across the
//! workspace. Failures that occur while handling a request (traps, guest
//! error envelopes, panics) are not errors in this sense: they are failure
//! signals, normalized by the fault boundary in `edge-dispatch-core` and
//! never propagated as `Result::Err` past the dispatcher.

use thiserror::Error;

/// Errors surfaced by the gateway outside the per-request handling path.
///
/// These cover module initialization and process construction. All of them
/// are recoverable at the dispatch boundary: a `ModuleInit` error becomes a
/// diagnostic response for the affected request, never a crashed process.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The handler module could not be initialized.
    ///
    /// Covers a missing or unreadable module source, a compilation failure,
    /// and a module that lacks one of the required exports.
    #[error("Module initialization failed: {reason}")]
    ModuleInit {
        /// Description of the initialization failure.
        reason: String,
    },

    /// Invalid configuration was provided.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl GatewayError {
    /// Create a new `ModuleInit` error.
    pub fn module_init(reason: impl Into<String>) -> Self {
        Self::ModuleInit {
            reason: reason.into(),
        }
    }

    /// Create a new `InvalidConfig` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error came from module initialization.
    pub fn is_module_init(&self) -> bool {
        matches!(self, Self::ModuleInit { .. })
    }
}
