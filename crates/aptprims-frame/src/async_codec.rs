//! `tokio_util` codec for APT messages.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_message, Header, HEADER_SIZE, MAX_PAYLOAD};
use crate::error::FrameError;
use crate::message::Message;

/// Frames an async byte stream into [`Message`]s.
#[derive(Debug, Clone)]
pub struct AptCodec {
    max_payload_size: usize,
}

impl AptCodec {
    /// Create a codec accepting any payload the length field can describe.
    pub fn new() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
        }
    }

    /// Create a codec with a smaller payload limit.
    pub fn with_max_payload(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }
}

impl Default for AptCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for AptCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let decoded = decode_frame(src, self.max_payload_size)?;
        if decoded.is_none() && src.len() >= HEADER_SIZE {
            let total = Header::parse(src)?.frame_len();
            src.reserve(total - src.len());
        }
        Ok(decoded)
    }
}

impl Encoder<&Message> for AptCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if let Some(data) = item.data() {
            if data.len() > self.max_payload_size {
                return Err(FrameError::PayloadTooLarge {
                    size: data.len(),
                    max: self.max_payload_size,
                });
            }
        }
        encode_message(item, dst);
        Ok(())
    }
}

impl Encoder<Message> for AptCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&Message>::encode(self, &item, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::opcode::{HW_GET_INFO, HW_REQ_INFO, MOT_MOVE_HOMED};

    #[test]
    fn decode_waits_for_payload() {
        let msg = Message::with_data(HW_GET_INFO, vec![7u8; 84]).unwrap();
        let wire = msg.pack();
        let mut codec = AptCodec::new();

        let mut buf = BytesMut::from(&wire[..10]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.capacity() >= wire.len());

        buf.extend_from_slice(&wire[10..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(msg));
        assert!(buf.is_empty());
    }

    #[test]
    fn encode_respects_limit() {
        let mut codec = AptCodec::with_max_payload(2);
        let mut buf = BytesMut::new();
        let msg = Message::with_data(HW_GET_INFO, vec![0u8; 3]).unwrap();
        let err = codec.encode(&msg, &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 3, max: 2 }));
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (client, server) = tokio::io::duplex(64);
        let mut sink = FramedWrite::new(client, AptCodec::new());
        let mut stream = FramedRead::new(server, AptCodec::new());

        let request = Message::new(HW_REQ_INFO);
        let reply = Message::with_data(HW_GET_INFO, vec![0xA5; 90]).unwrap();

        sink.send(&request).await.unwrap();
        sink.send(reply.clone()).await.unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), request);
        assert_eq!(stream.next().await.unwrap().unwrap(), reply);
    }

    #[tokio::test]
    async fn framed_read_handles_split_writes() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut stream = FramedRead::new(server, AptCodec::new());
        let wire = Message::with_params(MOT_MOVE_HOMED, 1, 0).pack();

        let writer = tokio::spawn(async move {
            for byte in wire.iter() {
                client.write_all(&[*byte]).await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let msg = stream.next().await.unwrap().unwrap();
        assert_eq!(msg.params(), Some((1, 0)));
        writer.await.unwrap();
    }
}
