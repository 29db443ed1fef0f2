use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::endpoint::{is_extended, EXTENDED_FLAG};
use crate::error::{FrameError, Result};
use crate::message::{Message, Payload};

/// Frame header: opcode (2) + params or length (2) + destination (1) + source (1).
pub const HEADER_SIZE: usize = 6;

/// Largest extended payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// A parsed 6-byte frame header.
///
/// This is what a header-only decode of a long frame yields: the declared
/// payload length is known but the payload itself has not been read. The raw
/// destination byte is kept as received, with bit 7 set for long frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    opcode: u16,
    field: [u8; 2],
    raw_destination: u8,
    source: u8,
}

impl Header {
    /// Parse the header at the front of `src`. Bytes beyond the header are ignored.
    pub fn parse(src: &[u8]) -> Result<Self> {
        if src.len() < HEADER_SIZE {
            return Err(FrameError::MalformedHeader { len: src.len() });
        }
        Ok(Self {
            opcode: u16::from_le_bytes([src[0], src[1]]),
            field: [src[2], src[3]],
            raw_destination: src[4],
            source: src[5],
        })
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    /// Destination byte as received.
    pub fn raw_destination(&self) -> u8 {
        self.raw_destination
    }

    /// Destination endpoint with the extended flag cleared.
    pub fn destination(&self) -> u8 {
        self.raw_destination & !EXTENDED_FLAG
    }

    pub fn source(&self) -> u8 {
        self.source
    }

    /// True if a payload of [`payload_len`](Self::payload_len) bytes follows.
    pub fn has_payload(&self) -> bool {
        is_extended(self.raw_destination)
    }

    /// Declared payload length for a long frame.
    pub fn payload_len(&self) -> Option<usize> {
        self.has_payload()
            .then(|| usize::from(u16::from_le_bytes(self.field)))
    }

    /// Inline parameters for a short frame.
    pub fn params(&self) -> Option<(u8, u8)> {
        (!self.has_payload()).then_some((self.field[0], self.field[1]))
    }

    /// Total frame size implied by this header.
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + self.payload_len().unwrap_or(0)
    }

    /// Bytes still needed after the header to complete the frame.
    pub fn remaining(&self) -> usize {
        self.payload_len().unwrap_or(0)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let [op_lo, op_hi] = self.opcode.to_le_bytes();
        [
            op_lo,
            op_hi,
            self.field[0],
            self.field[1],
            self.raw_destination,
            self.source,
        ]
    }

    /// Build the message for this header from its payload bytes.
    fn into_message(self, data: Option<Bytes>) -> Message {
        let payload = match data {
            Some(data) => Payload::Extended(data),
            None => Payload::Inline {
                param1: self.field[0],
                param2: self.field[1],
            },
        };
        Message::from_parts(self.opcode, self.destination(), self.source, payload)
    }
}

/// Result of [`unpack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete message.
    Message(Message),
    /// A long-frame header whose payload was not read.
    Header(Header),
}

impl Decoded {
    pub fn opcode(&self) -> u16 {
        match self {
            Decoded::Message(msg) => msg.opcode(),
            Decoded::Header(header) => header.opcode(),
        }
    }

    /// The complete message, if the payload was decoded.
    pub fn into_message(self) -> Option<Message> {
        match self {
            Decoded::Message(msg) => Some(msg),
            Decoded::Header(_) => None,
        }
    }

    /// Total frame size on the wire.
    pub fn frame_len(&self) -> usize {
        match self {
            Decoded::Message(msg) => msg.wire_len(),
            Decoded::Header(header) => header.frame_len(),
        }
    }
}

/// Encode a message into the wire format.
///
/// Short frame (inline parameters):
/// ```text
/// ┌──────────────┬────────┬────────┬─────────────┬────────┐
/// │ Opcode (2B)  │ Param1 │ Param2 │ Destination │ Source │
/// │ LE           │ (1B)   │ (1B)   │ bit7 = 0    │ (1B)   │
/// └──────────────┴────────┴────────┴─────────────┴────────┘
/// ```
///
/// Long frame (extended payload):
/// ```text
/// ┌──────────────┬────────────┬─────────────┬────────┬──────────────┐
/// │ Opcode (2B)  │ Length     │ Destination │ Source │ Payload      │
/// │ LE           │ (2B LE)    │ | 0x80      │ (1B)   │ (Length B)   │
/// └──────────────┴────────────┴─────────────┴────────┴──────────────┘
/// ```
pub fn encode_message(msg: &Message, dst: &mut BytesMut) {
    dst.reserve(msg.wire_len());
    dst.put_slice(&msg.header_bytes());
    if let Some(data) = msg.data() {
        dst.put_slice(data);
    }
}

/// Header-only decode: parse the 6-byte header without touching any payload.
pub fn decode_header(src: &[u8]) -> Result<Header> {
    Header::parse(src)
}

/// Decode a complete message from the front of `src`.
///
/// A long frame needs all of its declared payload bytes; anything after the
/// frame is ignored.
pub fn decode_message(src: &[u8]) -> Result<Message> {
    let header = Header::parse(src)?;
    let data = match header.payload_len() {
        Some(declared) => {
            let available = src.len() - HEADER_SIZE;
            if available < declared {
                return Err(FrameError::TruncatedPayload {
                    declared,
                    available,
                });
            }
            Some(Bytes::copy_from_slice(
                &src[HEADER_SIZE..HEADER_SIZE + declared],
            ))
        }
        None => None,
    };
    Ok(header.into_message(data))
}

/// Decode `src`, optionally stopping after the header.
///
/// With `header_only`, a long frame yields [`Decoded::Header`] so the caller
/// can learn how many payload bytes to read next. A short frame is always a
/// complete [`Decoded::Message`].
pub fn unpack(src: &[u8], header_only: bool) -> Result<Decoded> {
    let header = Header::parse(src)?;
    if header_only && header.has_payload() {
        return Ok(Decoded::Header(header));
    }
    decode_message(src).map(Decoded::Message)
}

/// Decode a message from a stream buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Message>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let header = Header::parse(src)?;
    let payload_len = header.remaining();

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let data = header
        .has_payload()
        .then(|| src.split_to(payload_len).freeze());

    Ok(Some(header.into_message(data)))
}

/// Configuration for the message reader and writer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum extended payload size in bytes. Default: 65535.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBuilder;

    const IDENTIFY_WIRE: [u8; 11] = [
        0x23, 0x02, 0x05, 0x00, 0xD0, 0x01, 0x01, 0x02, 0x03, 0x04, 0x05,
    ];

    fn identify_with_data() -> Message {
        Message::builder(0x0223u16)
            .destination(0x50u8)
            .source(0x01u8)
            .data(vec![1u8, 2, 3, 4, 5])
            .build()
            .unwrap()
    }

    #[test]
    fn test_encode_extended_payload() {
        let msg = identify_with_data();
        assert_eq!(msg.pack().as_ref(), &IDENTIFY_WIRE);

        let decoded = decode_message(&IDENTIFY_WIRE).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.destination(), 0x50);
        assert_eq!(decoded.data().unwrap().as_ref(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_encode_inline_params() {
        let msg = MessageBuilder::new(0x0211u16)
            .params(0x01u8, 0x00u8)
            .destination(0x50u8)
            .source(0x01u8)
            .build()
            .unwrap();
        let wire = msg.pack();
        assert_eq!(wire.as_ref(), &[0x11, 0x02, 0x01, 0x00, 0x50, 0x01]);

        let decoded = decode_message(&wire).unwrap();
        assert_eq!(decoded.opcode(), 0x0211);
        assert_eq!(decoded.params(), Some((1, 0)));
        assert_eq!(decoded.destination(), 0x50);
        assert_eq!(decoded.source(), 0x01);
    }

    #[test]
    fn test_header_only_decode() {
        let header = match unpack(&IDENTIFY_WIRE[..HEADER_SIZE], true).unwrap() {
            Decoded::Header(header) => header,
            other => panic!("expected header-only result, got {other:?}"),
        };
        assert_eq!(header.opcode(), 0x0223);
        assert_eq!(header.payload_len(), Some(5));
        assert_eq!(header.raw_destination(), 0xD0);
        assert_eq!(header.destination(), 0x50);
        assert_eq!(header.source(), 0x01);
        assert_eq!(header.frame_len(), IDENTIFY_WIRE.len());
        assert_eq!(&header.to_bytes()[..], &IDENTIFY_WIRE[..HEADER_SIZE]);
    }

    #[test]
    fn test_header_only_short_frame_is_complete() {
        let wire = Message::with_params(0x0211, 1, 0).pack();
        let decoded = unpack(&wire, true).unwrap();
        assert_eq!(decoded, Decoded::Message(Message::with_params(0x0211, 1, 0)));
    }

    #[test]
    fn test_full_unpack_long_frame() {
        let decoded = unpack(&IDENTIFY_WIRE, false).unwrap();
        assert_eq!(decoded.frame_len(), IDENTIFY_WIRE.len());
        assert_eq!(decoded.into_message(), Some(identify_with_data()));
    }

    #[test]
    fn test_discriminator_covers_every_destination_byte() {
        for dest in 0..=u8::MAX {
            let wire = [0x34, 0x12, 0x02, 0x00, dest, 0x01, 0xAA, 0xBB];
            let header = decode_header(&wire).unwrap();
            let msg = decode_message(&wire).unwrap();
            if dest & 0x80 != 0 {
                assert_eq!(header.payload_len(), Some(2));
                assert_eq!(msg.data().unwrap().as_ref(), &[0xAA, 0xBB]);
            } else {
                assert_eq!(header.payload_len(), None);
                assert_eq!(msg.params(), Some((0x02, 0x00)));
            }
            assert_eq!(msg.destination(), dest & 0x7F);
        }
    }

    #[test]
    fn test_decode_truncated_payload() {
        let wire = [0x23, 0x02, 0x05, 0x00, 0xD0, 0x01, 0x01, 0x02, 0x03];
        let err = decode_message(&wire).unwrap_err();
        assert!(matches!(
            err,
            FrameError::TruncatedPayload {
                declared: 5,
                available: 3
            }
        ));
        assert!(unpack(&wire, false).is_err());
        assert!(unpack(&wire, true).is_ok());
    }

    #[test]
    fn test_decode_malformed_header() {
        for len in 0..HEADER_SIZE {
            let err = unpack(&IDENTIFY_WIRE[..len], true).unwrap_err();
            assert!(matches!(err, FrameError::MalformedHeader { len: l } if l == len));
        }
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut wire = IDENTIFY_WIRE.to_vec();
        wire.extend_from_slice(&[0xEE, 0xEE]);
        let msg = decode_message(&wire).unwrap();
        assert_eq!(msg, identify_with_data());
        assert_eq!(msg.wire_len(), IDENTIFY_WIRE.len());
    }

    #[test]
    fn test_encode_is_pure() {
        let msg = identify_with_data();
        assert_eq!(msg.pack(), msg.pack());

        let mut buf = BytesMut::new();
        encode_message(&msg, &mut buf);
        encode_message(&msg, &mut buf);
        assert_eq!(&buf[..IDENTIFY_WIRE.len()], &buf[IDENTIFY_WIRE.len()..]);
    }

    #[test]
    fn test_roundtrip_payload_sizes() {
        for len in [0usize, 1, 255, 256, 4096, MAX_PAYLOAD] {
            let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let msg = Message::builder(0xFFFFu16)
                .destination(0x7Fu8)
                .source(0xFFu8)
                .data(data)
                .build()
                .unwrap();
            let wire = msg.pack();
            assert_eq!(wire.len(), HEADER_SIZE + len);
            assert_eq!(Message::unpack(&wire).unwrap(), msg);
        }
    }

    #[test]
    fn test_stream_decode_incomplete() {
        let mut buf = BytesMut::from(&IDENTIFY_WIRE[..4]);
        assert!(decode_frame(&mut buf, MAX_PAYLOAD).unwrap().is_none());

        let mut buf = BytesMut::from(&IDENTIFY_WIRE[..8]);
        assert!(decode_frame(&mut buf, MAX_PAYLOAD).unwrap().is_none());
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn test_stream_decode_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_message(&identify_with_data(), &mut buf);
        encode_message(&Message::new(0x0443), &mut buf);

        let first = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(first, identify_with_data());

        let second = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(second, Message::new(0x0443));

        assert!(buf.is_empty());
    }

    #[test]
    fn test_stream_decode_payload_too_large() {
        let mut buf = BytesMut::from(&IDENTIFY_WIRE[..]);
        let result = decode_frame(&mut buf, 4);
        assert!(matches!(
            result,
            Err(FrameError::PayloadTooLarge { size: 5, max: 4 })
        ));
    }

    #[test]
    fn test_decode_does_not_borrow_input() {
        let mut wire = IDENTIFY_WIRE.to_vec();
        let msg = decode_message(&wire).unwrap();
        wire.fill(0);
        assert_eq!(msg.data().unwrap().as_ref(), &[1, 2, 3, 4, 5]);
    }
}
