//! Connection readiness states.
//!
//! # State Transitions
//! ```text
//! Disconnected → Connecting: transport begins an attempt
//! Connecting → Connected: transport reports the connection usable
//! Connected → Disconnecting → Disconnected: link lost or closed
//! ```
//!
//! The manager never invents a state; every transition mirrors an event the
//! transport reported.

use serde::Serialize;
use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Disconnecting = 3,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnecting => "disconnecting",
        }
    }

    /// True when requests that need the store may proceed.
    pub fn is_ready(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
