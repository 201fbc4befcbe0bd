use avlink_transport::Transport;
use tracing::trace;

use crate::error::Result;
use crate::session::Session;

/// Maximum bytes pulled from a transport per [`pump`] call.
pub const READ_CHUNK_SIZE: usize = 512;

/// Read whatever the transport has available (non-blocking) into the
/// session's ingress buffer.
///
/// Returns the number of bytes received, `0` when nothing was pending.
pub fn pump(transport: &mut dyn Transport, session: &mut Session) -> Result<usize> {
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let read = transport.read(&mut chunk)?;
    if read > 0 {
        trace!(address = transport.address(), read, "received bytes");
        session.feed(&chunk[..read]);
    }
    Ok(read)
}
