//! Device synchronization engine.
//!
//! A [`Device`] owns one transport and keeps the peripheral and the host in
//! step: inbound frames are dispatched through a fixed handler table to input
//! bindings (encoders, buttons, multiplexers) that trigger host commands, and
//! output bindings (PWM, shift registers) turn host values into outbound
//! frames, sending only what changed.
//!
//! Devices are driven by an external periodic tick through
//! [`Device::update`] or [`DeviceSet::update`]. Nothing blocks.
//!
//! # Example
//!
//! ```
//! use avlink_binding::{Host, MemoryCommands, MemoryData};
//! use avlink_device::Device;
//! use avlink_transport::MemoryConnector;
//!
//! let mut connector = MemoryConnector::new();
//! let port = connector.add_port("mem:panel");
//! let mut commands = MemoryCommands::with_commands(["sim/autopilot/toggle"]);
//! let data = MemoryData::new();
//!
//! let mut device = Device::new("mem:panel");
//! device.button_named("ap").unwrap().set_command("sim/autopilot/toggle", &mut commands);
//! device.try_connect(&mut connector).unwrap();
//! assert_eq!(port.take_written_string(), "9;");
//!
//! port.push_inbound(b"7,ap,1;");
//! device.update(&mut Host::new(&mut commands, &data));
//! assert_eq!(commands.invocations().len(), 1);
//! ```

pub mod config;
mod device;
mod error;
mod handlers;
mod input;
mod inventory;
mod output;
mod set;

pub use config::{
    ButtonEntry, DeviceEntry, EncoderEntry, MuxEntry, PwmEntry, ShiftEntry, CONFIG_FILE_NAME,
};
pub use device::{Device, DeviceConfig, LinkState, UpdateReport, PENDING_NAME};
pub use error::{ConfigError, DeviceError, Result};
pub use handlers::Handler;
pub use input::{Button, Encoder, Input, InputKind, Multiplexer};
pub use inventory::{MAX_INPUTS, MAX_INPUTS_PER_KIND};
pub use output::{Output, OutputKind, Pwm, ShiftPin, ShiftRegister};
pub use set::DeviceSet;
