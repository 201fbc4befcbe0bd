/// Errors that can occur while moving frames to or from a transport.
///
/// Malformed frame content is never an error: the decoder falls back to
/// zero, `false`, or "absent" instead.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The transport failed or the device went away.
    #[error("transport error: {0}")]
    Transport(#[from] avlink_transport::TransportError),

    /// An I/O error occurred in a stream codec.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
