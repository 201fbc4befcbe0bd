use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::codec::{encode_frame, find_terminator, parse_frame, CommandFrame};
use crate::error::FrameError;

/// [`tokio_util::codec`] adapter for command frames, for use with
/// `FramedRead`/`FramedWrite` over async serial streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandCodec;

impl CommandCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for CommandCodec {
    type Item = CommandFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(end) = find_terminator(src) {
            let body = src.split_to(end);
            src.advance(1);
            if let Some(frame) = parse_frame(&body) {
                return Ok(Some(frame));
            }
            trace!("skipping empty frame");
        }
        Ok(None)
    }
}

impl Encoder<CommandFrame> for CommandCodec {
    type Error = FrameError;

    fn encode(&mut self, item: CommandFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(&item, dst);
        Ok(())
    }
}

impl<'a> Encoder<&'a CommandFrame> for CommandCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a CommandFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_frame(item, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::commands::{BUTTON_CHANGE, GET_INFO, INFO};

    #[test]
    fn decode_waits_for_terminator() {
        let mut codec = CommandCodec::new();
        let mut buf = BytesMut::from(&b";7,sw1,"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"7,sw1,");

        buf.extend_from_slice(b"1;");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.id, BUTTON_CHANGE);
        assert_eq!(frame.str_arg(0), Some("sw1"));
        assert_eq!(frame.int_arg(1), Some(1));
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn framed_read_yields_frames() {
        let wire: &[u8] = b"10,1,Mega,SN-1,2.0.0;7,btn,0;";
        let mut frames = FramedRead::new(wire, CommandCodec::new());

        let info = frames.next().await.unwrap().unwrap();
        assert_eq!(info.id, INFO);
        assert_eq!(info.str_arg(1), Some("Mega"));

        let button = frames.next().await.unwrap().unwrap();
        assert_eq!(button.id, BUTTON_CHANGE);
        assert_eq!(button.int_arg(1), Some(0));

        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_write_encodes_frames() {
        let mut sink = FramedWrite::new(Vec::new(), CommandCodec::new());
        sink.send(CommandFrame::new(GET_INFO)).await.unwrap();
        sink.send(CommandFrame::new(2).with_int(4).with_int(254))
            .await
            .unwrap();
        assert_eq!(sink.get_ref().as_slice(), b"9;2,4,254;");
    }
}
