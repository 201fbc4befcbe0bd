//! Non-blocking byte-stream transport abstraction.
//!
//! Provides a unified interface over the byte devices a peripheral can be
//! reached through:
//! - USB CDC / serial character devices (Linux/macOS)
//! - In-memory loopback ports (tests, simulation)
//!
//! This is the lowest layer of avlink. Everything else builds on top of
//! the [`Transport`] and [`PortConnector`] traits provided here.

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(unix)]
pub mod serial;

pub use error::{Result, TransportError};
pub use memory::{MemoryConnector, MemoryPort};
pub use traits::{PortConnector, PortInfo, Transport};

#[cfg(unix)]
pub use serial::{SerialConnector, SerialPort};
