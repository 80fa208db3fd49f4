//! The fault boundary.
//!
//! Any failure surfaced while handling one inbound event is carried as a
//! [`FailureSignal`] and normalized by [`guard`] into a well-formed response.
//! `guard` is total: for every possible outcome of the guarded computation,
//! including a panic, it resolves to exactly one response and never raises.

use std::any::Any;
use std::future::Future;

use edge_dispatch_common::{EdgeResponse, GatewayError};

/// Status code for every normalized failure response.
pub const FAILURE_STATUS: u16 = 500;

/// Body used when a failure carries no extractable text.
pub const UNKNOWN_FAILURE: &str = "unknown error";

/// An abnormal termination surfaced on the handling path.
///
/// Each variant holds the best description available at the point the
/// failure was observed, in decreasing order of usefulness: a structured
/// trace, a short message, a stringified unstructured value, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureSignal {
    /// A structured trace is available (e.g. a Wasm trap with backtrace).
    Traced {
        /// The trace text.
        trace: String,
    },

    /// Only a short message is available.
    Message {
        /// The message text.
        message: String,
    },

    /// An unstructured value was raised (e.g. a panic payload).
    Value {
        /// The stringified value.
        value: String,
    },

    /// The failure carried no extractable text at all.
    Empty,
}

impl FailureSignal {
    /// Create a trace-carrying signal.
    pub fn traced(trace: impl Into<String>) -> Self {
        Self::Traced {
            trace: trace.into(),
        }
    }

    /// Create a message-carrying signal.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// Create a signal from a stringified unstructured value.
    pub fn value(value: impl Into<String>) -> Self {
        Self::Value {
            value: value.into(),
        }
    }

    /// Capture a Wasmtime error as a trace-carrying signal.
    ///
    /// The alternate Debug rendering includes the error chain and, for
    /// traps, the Wasm backtrace.
    pub fn from_wasm_error(err: &wasmtime::Error) -> Self {
        Self::Traced {
            trace: format!("{err:?}"),
        }
    }

    /// Capture a panic payload as an unstructured-value signal.
    ///
    /// Each downcast is a scoped fallible step; a payload that defies both
    /// downcasts is the no-extractable-text case.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        match payload.downcast::<String>() {
            Ok(s) => Self::Value { value: *s },
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(s) => Self::Value {
                    value: (*s).to_string(),
                },
                Err(_) => Self::Empty,
            },
        }
    }

    /// Render the best available failure description.
    ///
    /// Extraction is total and ordered: trace, then message, then the
    /// stringified value, then the fixed [`UNKNOWN_FAILURE`] literal. An
    /// empty or whitespace-only text at any step falls through to the
    /// literal, so the result is never empty.
    pub fn diagnostic(&self) -> String {
        let text = match self {
            Self::Traced { trace } => trace.as_str(),
            Self::Message { message } => message.as_str(),
            Self::Value { value } => value.as_str(),
            Self::Empty => "",
        };

        if text.trim().is_empty() {
            UNKNOWN_FAILURE.to_string()
        } else {
            text.to_string()
        }
    }
}

impl std::fmt::Display for FailureSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.diagnostic())
    }
}

impl From<GatewayError> for FailureSignal {
    fn from(err: GatewayError) -> Self {
        Self::Message {
            message: err.to_string(),
        }
    }
}

/// Build the normalized failure response for a signal.
///
/// Status is the fixed server-error code; the body is the signal's
/// diagnostic, which is guaranteed non-empty.
pub fn failure_response(signal: &FailureSignal) -> EdgeResponse {
    EdgeResponse::text(FAILURE_STATUS, &signal.diagnostic())
}

/// Run a deferred handling computation to a guaranteed response.
///
/// The computation runs on its own task so a panic inside it surfaces as a
/// join error here instead of unwinding through the dispatch path. Success
/// passes the handler's response through unchanged; every failure shape
/// becomes a [`failure_response`].
pub async fn guard<F>(computation: F) -> EdgeResponse
where
    F: Future<Output = Result<EdgeResponse, FailureSignal>> + Send + 'static,
{
    match tokio::spawn(computation).await {
        Ok(Ok(response)) => response,
        Ok(Err(signal)) => failure_response(&signal),
        Err(join_err) => {
            let signal = if join_err.is_panic() {
                FailureSignal::from_panic(join_err.into_panic())
            } else {
                FailureSignal::message("handler task cancelled")
            };
            failure_response(&signal)
        }
    }
}
