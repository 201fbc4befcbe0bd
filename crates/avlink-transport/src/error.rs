/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device at the specified address.
    #[error("failed to open {address}: {source}")]
    Open {
        address: String,
        source: std::io::Error,
    },

    /// Failed to list available devices.
    #[error("failed to enumerate ports: {0}")]
    Enumerate(std::io::Error),

    /// An I/O error occurred on an open device.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device went away (unplugged, hung up, or closed by the peer).
    #[error("device disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, TransportError>;
