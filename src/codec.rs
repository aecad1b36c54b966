use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{self, Frame};
use crate::Error;

pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

#[derive(Clone, Copy, Debug)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> FrameCodec {
        FrameCodec { max_frame_size }
    }

    fn too_large(&self) -> Error {
        format!("frame size exceeds limit of {} bytes", self.max_frame_size).into()
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            // The buffer starts with the frame still being received, so its length is that frame's
            // size so far. A client that never finishes a frame would otherwise grow it forever.
            Err(frame::Error::Incomplete) if src.len() > self.max_frame_size => {
                return Err(self.too_large());
            }
            Err(frame::Error::Incomplete) => return Ok(None), // Not enough data to parse a frame.
            Err(err) => return Err(err.into()),
        };

        let position = cursor.position() as usize;
        if position > self.max_frame_size {
            return Err(self.too_large());
        }

        // Remove the parsed frame from the buffer.
        src.advance(position);

        Ok(Some(frame))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&frame.serialize());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn decode_waits_for_complete_frame() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n$3\r\nfo"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"o\r\n");

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Array(vec![
                Frame::Bulk(Bytes::from("GET")),
                Frame::Bulk(Bytes::from("foo")),
            ]))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_pipelined_frames() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"+a\r\n+b\r\n"[..]);

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Simple("a".to_string()))
        );
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Simple("b".to_string()))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_rejects_oversized_frame() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::from(&b"$100\r\n0123456789"[..]);

        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn decode_rejects_complete_oversized_frame() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::from(&b"$10\r\n0123456789\r\n"[..]);

        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn decode_limit_applies_per_frame() {
        let mut codec = FrameCodec::new(64);
        let ping = b"*1\r\n$4\r\nPING\r\n";
        let mut buf = BytesMut::from(&ping.repeat(10)[..]);
        assert!(buf.len() > 64);

        for _ in 0..10 {
            assert_eq!(
                codec.decode(&mut buf).unwrap(),
                Some(Frame::Array(vec![Frame::Bulk(Bytes::from("PING"))]))
            );
        }
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn encode_appends_serialized_frame() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();

        codec.encode(Frame::Integer(7), &mut buf).unwrap();
        codec.encode(Frame::Null, &mut buf).unwrap();

        assert_eq!(&buf[..], b":7\r\n$-1\r\n");
    }
}
