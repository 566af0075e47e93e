//! Shared session state.
//!
//! The dispatcher is the only writer of the connection and imaging fields;
//! the command issuer and the console only read them. The queue boundary is
//! the single synchronization point for events, so plain atomics suffice
//! here.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Connection state of the probe link, mutated only on connection events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    fn as_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
            Self::Error => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Error,
            _ => Self::Disconnected,
        }
    }
}

/// Per-session state flags shared between the dispatcher and the console.
#[derive(Debug)]
pub struct Session {
    connection: AtomicU8,
    imaging: AtomicBool,
    stream_print: AtomicBool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            connection: AtomicU8::new(ConnectionState::Disconnected.as_u8()),
            imaging: AtomicBool::new(false),
            stream_print: AtomicBool::new(true),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> ConnectionState {
        ConnectionState::from_u8(self.connection.load(Ordering::Acquire))
    }

    pub fn set_connection(&self, state: ConnectionState) {
        self.connection.store(state.as_u8(), Ordering::Release);
    }

    /// Marks a connection attempt as pending, but only from `Disconnected`.
    ///
    /// Connection events may already have been dispatched by the time the
    /// synchronous connect call returns; in that case the confirmed state
    /// stays as the dispatcher wrote it. Returns whether the transition
    /// happened.
    pub fn begin_connecting(&self) -> bool {
        self.connection
            .compare_exchange(
                ConnectionState::Disconnected.as_u8(),
                ConnectionState::Connecting.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Whether imaging is currently running, as last confirmed by the probe.
    pub fn imaging_running(&self) -> bool {
        self.imaging.load(Ordering::Acquire)
    }

    pub fn set_imaging_running(&self, running: bool) {
        self.imaging.store(running, Ordering::Release);
    }

    /// Whether the console prints a line per streamed frame.
    pub fn stream_print(&self) -> bool {
        self.stream_print.load(Ordering::Acquire)
    }

    pub fn toggle_stream_print(&self) -> bool {
        !self.stream_print.fetch_xor(true, Ordering::AcqRel)
    }
}
