//! Keep MobiFlight-compatible cockpit hardware in sync with a flight
//! simulator.
//!
//! Peripherals report switch and encoder changes over a serial link and
//! accept output commands for LEDs and backlights. avlink turns those
//! reports into host command invocations and mirrors host values back onto
//! the outputs, sending only what changed.
//!
//! # Crate Structure
//!
//! - [`transport`]: Non-blocking byte transports (serial devices, in-memory loopback)
//! - [`frame`]: Text command framing and the protocol session
//! - [`binding`]: Host registries and lazily resolved command/data bindings
//! - [`device`]: Device coordinator, inputs, outputs and persisted topology

/// Re-export transport types.
pub mod transport {
    pub use avlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use avlink_frame::*;
}

/// Re-export binding types.
pub mod binding {
    pub use avlink_binding::*;
}

/// Re-export device types.
pub mod device {
    pub use avlink_device::*;
}
