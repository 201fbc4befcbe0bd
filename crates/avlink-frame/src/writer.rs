use avlink_transport::Transport;
use tracing::trace;

use crate::error::Result;
use crate::session::Session;

/// Commit any open frame and write pending output to the transport.
///
/// Stops early when the transport accepts no more bytes; whatever was not
/// written stays queued for the next flush. Returns the bytes written.
pub fn flush(transport: &mut dyn Transport, session: &mut Session) -> Result<usize> {
    session.commit();
    let mut written = 0;
    while session.pending_egress() > 0 {
        let n = transport.write(session.egress())?;
        if n == 0 {
            trace!(
                address = transport.address(),
                pending = session.pending_egress(),
                "transport busy, keeping output queued"
            );
            break;
        }
        session.consume_egress(n);
        written += n;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use avlink_transport::{MemoryConnector, PortConnector};

    use super::*;

    #[test]
    fn flush_commits_and_writes() {
        let mut connector = MemoryConnector::new();
        let port = connector.add_port("dev0");
        let mut transport = connector.open("dev0").unwrap();
        let mut session = Session::new();

        session.begin(9);
        session.begin(2);
        session.arg_int(4);
        session.arg_int(127);
        assert_eq!(flush(transport.as_mut(), &mut session).unwrap(), 10);
        assert_eq!(port.take_written_string(), "9;2,4,127;");
        assert!(!session.is_sending());
    }

    #[test]
    fn flush_loops_over_partial_writes() {
        let mut connector = MemoryConnector::new();
        let port = connector.add_port("dev0");
        let mut transport = connector.open("dev0").unwrap();
        let mut session = Session::new();

        port.set_write_limit(Some(3));
        session.begin(27);
        session.arg_int(0);
        session.arg_str("0|1|2");
        session.arg_int(1);
        assert_eq!(flush(transport.as_mut(), &mut session).unwrap(), 13);
        assert_eq!(port.take_written_string(), "27,0,0|1|2,1;");
    }

    #[test]
    fn flush_keeps_unwritten_output() {
        let mut connector = MemoryConnector::new();
        let port = connector.add_port("dev0");
        let mut transport = connector.open("dev0").unwrap();
        let mut session = Session::new();

        port.set_write_limit(Some(0));
        session.begin(9);
        assert_eq!(flush(transport.as_mut(), &mut session).unwrap(), 0);
        assert_eq!(session.pending_egress(), 2);

        port.set_write_limit(None);
        assert_eq!(flush(transport.as_mut(), &mut session).unwrap(), 2);
        assert_eq!(port.take_written_string(), "9;");
    }
}
