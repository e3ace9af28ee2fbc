//! Questlines HTTP server.
//!
//! Exposes the router, configuration and handlers so the binary and the
//! integration tests build the exact same application.

pub mod api;
pub mod config;
pub mod frontend;

pub use api::create_router;
pub use config::ServerConfig;
