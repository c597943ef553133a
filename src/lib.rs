//! Job tracker API.
//!
//! An HTTP service for a job-application tracker. The interesting part is
//! [`database::ConnectionManager`], which keeps the connection to the backing
//! document store alive: it connects in the background at startup, retries
//! with exponential backoff, reconnects after a lost link, and tells request
//! handlers whether the store is usable.

// Core subsystems
pub mod config;
pub mod database;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ServiceConfig;
pub use database::{ConnectionManager, ConnectionState};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
