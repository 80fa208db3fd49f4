//! Common types, errors, and configuration for edge-dispatch.
//!
//! This crate provides shared functionality used across the edge-dispatch
//! workspace:
//! - Error types using `thiserror` for type-safe error handling
//! - Configuration structures for runtime and server settings
//! - The HTTP-shaped request/response data model exchanged with the
//!   handler module

pub mod config;
pub mod config_file;
pub mod error;
pub mod http;

pub use config::{EngineConfig, ExecutionConfig, RuntimeConfig};
pub use config_file::{ConfigFile, ConfigFileError, ModuleConfig, ServerConfigFile};
pub use error::GatewayError;
pub use http::{EdgeRequest, EdgeResponse};
