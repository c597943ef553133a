//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request id, trace, timeout, catch-panic)
//!     → /health*  → handlers.rs (connectivity report, reconnect trigger)
//!     → /api/*    → guard.rs (503 degraded unless the database is connected)
//!                 → handlers.rs
//!     → response.rs (JSON bodies)
//! ```

pub mod guard;
pub mod handlers;
pub mod response;
pub mod server;

pub use server::{build_router, AppState, HttpServer};
