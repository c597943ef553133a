//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Connection attempt to the backing store:
//!     → timeouts.rs (every network step has a finite deadline)
//!     → On failure: backoff.rs (delay before the next autonomous attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Backoff is deterministic so retry schedules are observable in tests

pub mod backoff;
pub mod timeouts;

pub use backoff::backoff_delay;
pub use timeouts::{with_deadline, DeadlineExceeded};
