//! Host-side bridge for the solum ultrasound probe module.
//!
//! This library provides functionality for:
//! - Marshalling the module's asynchronous callbacks into an ordered event
//!   queue drained by a single consumer thread
//! - Dispatching events into session state and a rendering sink
//! - Issuing synchronous control commands (connect, run, parameters)
//! - Retrieving probe certificates from the cloud REST API

pub mod bridge;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod console;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod frame;
pub mod logging;
pub mod sdk;
pub mod session;
pub mod sim;

pub use bridge::{event_channel, CallbackBridge};
pub use config::Config;
pub use control::Commander;
pub use dispatch::{ConsoleUi, Dispatcher, ProbeUi};
pub use error::{AppError, Result};
pub use event::Event;
pub use frame::ImageFrame;
pub use sdk::{ProbeControl, SdkError};
pub use session::{ConnectionState, Session};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty(), "Version should not be empty");
    }
}
