//! Backing store connectivity.
//!
//! # Data Flow
//! ```text
//! startup / POST /health/database/connect
//!     → manager.rs connect() (guards, backoff, single timer)
//!     → transport.rs Transport::connect (tcp.rs in production)
//!
//! transport events (connecting / connected / disconnecting / disconnected / error)
//!     → manager.rs handle_event (mirror readiness, schedule reconnect)
//!
//! request handlers
//!     → manager.status()
//! ```

pub mod manager;
pub mod state;
pub mod tcp;
pub mod transport;

pub use manager::{ConnectionManager, ConnectionSnapshot, PendingRetry, RetryKind};
pub use state::ConnectionState;
pub use tcp::TcpTransport;
pub use transport::{ConnectOptions, FailureKind, Transport, TransportError, TransportEvent};
