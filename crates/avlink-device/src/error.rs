use std::path::PathBuf;

use crate::input::InputKind;
use crate::output::OutputKind;

/// Errors that can occur while managing or driving a device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] avlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] avlink_frame::FrameError),

    /// The device has no open transport.
    #[error("device {0} is not connected")]
    NotConnected(String),

    /// Input limits reached (per device or per kind).
    #[error("too many {kind}: the limit is {limit}")]
    TooManyInputs { kind: &'static str, limit: usize },

    /// Pin index beyond the protocol limit.
    #[error("pin {pin} out of range (max {max})")]
    PinOutOfRange { pin: usize, max: usize },

    /// Handler id outside the dispatch table.
    #[error("command id {0} is outside the handler table")]
    HandlerOutOfRange(i16),

    /// Another input of the same kind already uses the name.
    #[error("duplicate {kind} name: {name:?}")]
    DuplicateName { kind: InputKind, name: String },

    /// Another output of the same kind already uses the id.
    #[error("duplicate {kind} id: {id}")]
    DuplicateOutputId { kind: OutputKind, id: i16 },

    /// Entity index out of bounds.
    #[error("index {index} out of range ({len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors that can occur while loading or saving a binding topology.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid TOML for the expected layout.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The topology could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file has no `device` entries.
    #[error("configuration declares no devices")]
    NoDevices,

    /// A device could not be built from its entry.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
