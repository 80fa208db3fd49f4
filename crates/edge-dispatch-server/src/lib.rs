//! HTTP server for edge-dispatch.
//!
//! This crate binds the dispatch pipeline to real HTTP:
//!
//! - One catch-all route, registered once at startup, delivers every
//!   inbound event to the dispatcher
//! - `GET /health` and `GET /ready` operational probes
//! - Request/response conversion between Axum and the gateway's data model
//! - Graceful shutdown and the engine epoch ticker
//!
//! # Quick Start
//!
//! ```ignore
//! use edge_dispatch_common::RuntimeConfig;
//! use edge_dispatch_core::ModuleSource;
//! use edge_dispatch_server::{EdgeServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = EdgeServer::new(
//!         &RuntimeConfig::default(),
//!         ServerConfig::default(),
//!         ModuleSource::File("./handler.wasm".into()),
//!         "handle",
//!     )?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod state;

pub use edge_dispatch_core::ModuleSource;
pub use server::{EdgeServer, ServerConfig};
pub use state::AppState;
