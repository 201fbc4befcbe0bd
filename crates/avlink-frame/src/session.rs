use avlink_transport::Transport;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::codec::{
    find_terminator, parse_bool, parse_int, put_int, CommandFrame, ARG_SEPARATOR,
    FRAME_TERMINATOR,
};
use crate::error::Result;

/// Per-device protocol state: an egress buffer of encoded frames and an
/// ingress buffer with a cursor over the frame currently being decoded.
///
/// Encoding is incremental: [`Session::begin`] opens a frame, `arg_*` calls
/// append to it and [`Session::commit`] terminates it. Beginning a new frame
/// while one is open commits the open one first. Arguments appended with no
/// open frame are ignored.
///
/// Decoding is cursor based: [`Session::next_command`] positions the cursor
/// on the next complete frame and yields its id, after which `next_*` calls
/// consume arguments left to right. A missing argument reads as `None`.
#[derive(Debug, Default)]
pub struct Session {
    egress: BytesMut,
    sending: bool,
    ingress: BytesMut,
    /// Offset of the terminator of the frame under the cursor.
    frame_end: Option<usize>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- encoding -----

    /// Open a new outgoing frame with the given command id.
    pub fn begin(&mut self, id: i16) {
        if self.sending {
            self.commit();
        }
        put_int(&mut self.egress, id);
        self.sending = true;
    }

    /// Append an integer argument to the open frame.
    pub fn arg_int(&mut self, value: i16) {
        if self.open_arg() {
            put_int(&mut self.egress, value);
        }
    }

    /// Append a boolean argument (`true`/`false`) to the open frame.
    pub fn arg_bool(&mut self, value: bool) {
        if self.open_arg() {
            self.egress
                .put_slice(if value { b"true" } else { b"false" });
        }
    }

    /// Append a string argument verbatim to the open frame.
    pub fn arg_str(&mut self, value: &str) {
        if self.open_arg() {
            self.egress.put_slice(value.as_bytes());
        }
    }

    /// Terminate the open frame. Does nothing if no frame is open.
    pub fn commit(&mut self) {
        if self.sending {
            self.egress.put_u8(FRAME_TERMINATOR);
            self.sending = false;
        }
    }

    /// Encode a whole frame, committing any frame still open.
    pub fn send(&mut self, frame: &CommandFrame) {
        self.begin(frame.id);
        for arg in &frame.args {
            self.arg_str(arg);
        }
        self.commit();
    }

    /// Whether a frame is open for arguments.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Number of encoded bytes waiting to be sent.
    pub fn pending_egress(&self) -> usize {
        self.egress.len()
    }

    /// Copy pending output into a caller buffer.
    ///
    /// With an empty `out` nothing is copied and the capacity needed to take
    /// everything in one call is returned. Otherwise up to `out.len() - 1`
    /// bytes are copied, followed by a NUL byte, and only the copied bytes
    /// are removed from the pending output.
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        if out.is_empty() {
            return self.egress.len() + 1;
        }
        let n = self.egress.len().min(out.len() - 1);
        out[..n].copy_from_slice(&self.egress[..n]);
        out[n] = 0;
        self.egress.advance(n);
        n
    }

    /// Take all pending output.
    pub fn take_egress(&mut self) -> Bytes {
        self.egress.split().freeze()
    }

    /// Write as much pending output as the transport accepts.
    ///
    /// See [`crate::writer::flush`].
    pub fn flush_to(&mut self, transport: &mut dyn Transport) -> Result<usize> {
        crate::writer::flush(transport, self)
    }

    pub(crate) fn egress(&self) -> &[u8] {
        &self.egress
    }

    pub(crate) fn consume_egress(&mut self, n: usize) {
        self.egress.advance(n.min(self.egress.len()));
    }

    fn open_arg(&mut self) -> bool {
        if self.sending {
            self.egress.put_u8(ARG_SEPARATOR);
        }
        self.sending
    }

    // ----- decoding -----

    /// Append received bytes to the ingress buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.ingress.extend_from_slice(bytes);
    }

    /// Number of received bytes not yet consumed.
    pub fn pending_ingress(&self) -> usize {
        self.ingress.len()
    }

    /// Advance to the next complete frame and return its id.
    ///
    /// Any unread remainder of the previous frame is discarded first. Empty
    /// frames are skipped. Returns `None` when no complete frame is
    /// buffered; partial data is kept for a later call.
    pub fn next_command(&mut self) -> Option<i16> {
        self.skip_frame();
        loop {
            let end = find_terminator(&self.ingress)?;
            self.frame_end = Some(end);
            match self.take_token() {
                Some(token) => return Some(parse_int(&token)),
                None => {
                    trace!("skipping empty frame");
                    self.skip_frame();
                }
            }
        }
    }

    /// Next argument of the current frame as an integer.
    pub fn next_int(&mut self) -> Option<i16> {
        self.take_token().map(|token| parse_int(&token))
    }

    /// Next argument of the current frame as a boolean.
    pub fn next_bool(&mut self) -> Option<bool> {
        self.take_token().map(|token| parse_bool(&token))
    }

    /// Next argument of the current frame as a string.
    pub fn next_str(&mut self) -> Option<String> {
        self.take_token()
            .map(|token| String::from_utf8_lossy(&token).into_owned())
    }

    /// Discard the rest of the current frame, including its terminator.
    pub fn skip_frame(&mut self) {
        if let Some(end) = self.frame_end.take() {
            self.ingress.advance(end + 1);
        }
    }

    /// Decode the next complete frame with all of its arguments.
    pub fn next_frame(&mut self) -> Option<CommandFrame> {
        let id = self.next_command()?;
        let mut args = Vec::new();
        while let Some(token) = self.take_raw_token() {
            args.push(String::from_utf8_lossy(&token).into_owned());
        }
        Some(CommandFrame { id, args })
    }

    /// Clear both directions.
    pub fn reset(&mut self) {
        self.egress.clear();
        self.sending = false;
        self.ingress.clear();
        self.frame_end = None;
    }

    fn take_token(&mut self) -> Option<BytesMut> {
        self.take_raw_token().filter(|token| !token.is_empty())
    }

    /// Consume one token and its delimiter. `None` only when no frame is
    /// under the cursor; an empty token comes back as an empty buffer.
    fn take_raw_token(&mut self) -> Option<BytesMut> {
        let end = self.frame_end?;
        let stop = self.ingress[..end]
            .iter()
            .position(|&b| b == ARG_SEPARATOR)
            .unwrap_or(end);
        let mut token = self.ingress.split_to(stop + 1);
        token.truncate(stop);
        self.frame_end = (stop < end).then(|| end - stop - 1);

        let lead = token.iter().take_while(|b| b.is_ascii_whitespace()).count();
        token.advance(lead);
        let trail = token
            .iter()
            .rev()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        token.truncate(token.len() - trail);
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_shift_register_batch() {
        let mut session = Session::new();
        session.begin(27);
        session.arg_int(0);
        session.arg_str("5");
        session.arg_int(1);
        session.commit();
        assert_eq!(&session.take_egress()[..], b"27,0,5,1;");
        assert_eq!(session.pending_egress(), 0);
    }

    #[test]
    fn round_trip_through_wire() {
        let mut sender = Session::new();
        sender.begin(27);
        sender.arg_int(0);
        sender.arg_int(5);
        sender.arg_int(1);
        sender.commit();

        let mut receiver = Session::new();
        receiver.feed(&sender.take_egress());
        assert_eq!(receiver.next_command(), Some(27));
        assert_eq!(receiver.next_int(), Some(0));
        assert_eq!(receiver.next_int(), Some(5));
        assert_eq!(receiver.next_int(), Some(1));
        assert_eq!(receiver.next_int(), None);
    }

    #[test]
    fn reassembles_split_frame() {
        let mut session = Session::new();
        session.feed(b"27,0,5,");
        assert_eq!(session.next_command(), None);
        assert_eq!(session.next_command(), None);

        session.feed(b"1;");
        let frame = session.next_frame().unwrap();
        assert_eq!(frame.id, 27);
        assert_eq!(frame.args, vec!["0", "5", "1"]);
        assert_eq!(session.next_frame(), None);
    }

    #[test]
    fn begin_auto_commits_open_frame() {
        let mut session = Session::new();
        session.begin(9);
        session.begin(2);
        session.arg_int(3);
        session.arg_int(254);
        session.commit();
        assert_eq!(&session.take_egress()[..], b"9;2,3,254;");
    }

    #[test]
    fn args_without_open_frame_are_ignored() {
        let mut session = Session::new();
        session.arg_int(5);
        session.arg_bool(true);
        session.arg_str("x");
        session.commit();
        assert_eq!(session.pending_egress(), 0);

        session.begin(7);
        session.arg_bool(false);
        session.commit();
        session.arg_int(1);
        assert_eq!(&session.take_egress()[..], b"7,false;");
    }

    #[test]
    fn drain_into_takes_only_what_fits() {
        let mut session = Session::new();
        session.send(&CommandFrame::new(2).with_int(3).with_int(127));

        assert_eq!(session.drain_into(&mut []), 9);

        let mut out = [0xAAu8; 5];
        assert_eq!(session.drain_into(&mut out), 4);
        assert_eq!(&out, b"2,3,\0");
        assert_eq!(session.pending_egress(), 4);

        let mut rest = [0u8; 16];
        assert_eq!(session.drain_into(&mut rest), 4);
        assert_eq!(&rest[..5], b"127;\0");
        assert_eq!(session.pending_egress(), 0);
    }

    #[test]
    fn decodes_partial_frames_across_feeds() {
        let mut session = Session::new();
        session.feed(b"7,sw");
        assert_eq!(session.next_command(), None);
        assert_eq!(session.pending_ingress(), 4);

        session.feed(b"1,1;");
        assert_eq!(session.next_command(), Some(7));
        assert_eq!(session.next_str().as_deref(), Some("sw1"));
        assert_eq!(session.next_bool(), Some(false));
        assert_eq!(session.next_int(), None);
        assert_eq!(session.next_command(), None);
        assert_eq!(session.pending_ingress(), 0);
    }

    #[test]
    fn next_command_skips_unread_arguments() {
        let mut session = Session::new();
        session.feed(b"10,1,Mega,SN,1.0;6,enc,2;");
        assert_eq!(session.next_command(), Some(10));
        assert_eq!(session.next_int(), Some(1));
        assert_eq!(session.next_command(), Some(6));
        assert_eq!(session.next_str().as_deref(), Some("enc"));
        assert_eq!(session.next_int(), Some(2));
        assert_eq!(session.next_command(), None);
    }

    #[test]
    fn skips_empty_frames_and_whitespace() {
        let mut session = Session::new();
        session.feed(b";\r\n ;\r\n 30 , mux , 4 , 1 ;");
        assert_eq!(session.next_command(), Some(30));
        assert_eq!(session.next_str().as_deref(), Some("mux"));
        assert_eq!(session.next_int(), Some(4));
        assert_eq!(session.next_int(), Some(1));
        assert_eq!(session.next_int(), None);
    }

    #[test]
    fn absent_arguments_are_none() {
        let mut session = Session::new();
        session.feed(b"7,,true;");
        assert_eq!(session.next_command(), Some(7));
        assert_eq!(session.next_str(), None);
        assert_eq!(session.next_bool(), Some(true));
        assert_eq!(session.next_bool(), None);

        assert_eq!(session.next_int(), None);
    }

    #[test]
    fn next_frame_collects_all_arguments() {
        let mut session = Session::new();
        session.feed(b"10,1,Mega,SN-7,2.5.1;28,a");
        let frame = session.next_frame().unwrap();
        assert_eq!(frame.id, 10);
        assert_eq!(frame.args, vec!["1", "Mega", "SN-7", "2.5.1"]);
        assert_eq!(session.next_frame(), None);
        assert_eq!(session.pending_ingress(), 4);
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = Session::new();
        session.begin(9);
        session.feed(b"10,1");
        session.reset();
        assert!(!session.is_sending());
        assert_eq!(session.pending_egress(), 0);
        assert_eq!(session.pending_ingress(), 0);
    }
}
