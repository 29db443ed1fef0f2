use std::hash::{Hash, Hasher};

use bytes::{Bytes, BytesMut};

use crate::codec::{encode_message, HEADER_SIZE, MAX_PAYLOAD};
use crate::endpoint::{DEFAULT_DESTINATION, DEFAULT_SOURCE, EXTENDED_FLAG};
use crate::error::{FrameError, Result};

/// What a message carries besides its opcode and endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Payload {
    /// Two parameter bytes carried in the header (short frame).
    Inline { param1: u8, param2: u8 },
    /// A length-prefixed body following the header (long frame).
    Extended(Bytes),
}

/// A logical APT message.
///
/// Construct with [`Message::new`], [`Message::with_params`],
/// [`Message::with_data`] or [`Message::builder`]. Every constructed message
/// is encodable: the destination never has bit 7 set and an extended payload
/// never exceeds 65535 bytes.
///
/// Equality is defined on the encoded bytes.
#[derive(Debug, Clone)]
pub struct Message {
    opcode: u16,
    destination: u8,
    source: u8,
    payload: Payload,
}

impl Message {
    /// A short-frame message with both parameters zero and default endpoints.
    pub fn new(opcode: u16) -> Self {
        Self::with_params(opcode, 0, 0)
    }

    /// A short-frame message with default endpoints.
    pub fn with_params(opcode: u16, param1: u8, param2: u8) -> Self {
        Self {
            opcode,
            destination: DEFAULT_DESTINATION,
            source: DEFAULT_SOURCE,
            payload: Payload::Inline { param1, param2 },
        }
    }

    /// A long-frame message with default endpoints.
    pub fn with_data(opcode: u16, data: impl Into<Bytes>) -> Result<Self> {
        Self::builder(opcode).data(data).build()
    }

    /// Start building a message with explicit fields.
    pub fn builder(opcode: impl Into<u32>) -> MessageBuilder {
        MessageBuilder::new(opcode)
    }

    /// Assemble a message from fields already known to be valid.
    pub(crate) fn from_parts(opcode: u16, destination: u8, source: u8, payload: Payload) -> Self {
        debug_assert_eq!(destination & EXTENDED_FLAG, 0);
        Self {
            opcode,
            destination,
            source,
            payload,
        }
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    /// Destination endpoint, without the extended flag.
    pub fn destination(&self) -> u8 {
        self.destination
    }

    pub fn source(&self) -> u8 {
        self.source
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Inline parameters, if this is a short-frame message.
    pub fn params(&self) -> Option<(u8, u8)> {
        match self.payload {
            Payload::Inline { param1, param2 } => Some((param1, param2)),
            Payload::Extended(_) => None,
        }
    }

    /// Extended payload bytes, if this is a long-frame message.
    pub fn data(&self) -> Option<&Bytes> {
        match &self.payload {
            Payload::Inline { .. } => None,
            Payload::Extended(data) => Some(data),
        }
    }

    pub fn has_data(&self) -> bool {
        matches!(self.payload, Payload::Extended(_))
    }

    /// Total encoded size: header plus any extended payload.
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.data().map_or(0, Bytes::len)
    }

    /// The 6 header bytes this message encodes to.
    pub fn header_bytes(&self) -> [u8; HEADER_SIZE] {
        let [op_lo, op_hi] = self.opcode.to_le_bytes();
        match &self.payload {
            Payload::Inline { param1, param2 } => {
                [op_lo, op_hi, *param1, *param2, self.destination, self.source]
            }
            Payload::Extended(data) => {
                // Length is bounded by construction.
                let [len_lo, len_hi] = (data.len() as u16).to_le_bytes();
                [
                    op_lo,
                    op_hi,
                    len_lo,
                    len_hi,
                    self.destination | EXTENDED_FLAG,
                    self.source,
                ]
            }
        }
    }

    /// Encode into a fresh buffer.
    pub fn pack(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.wire_len());
        encode_message(self, &mut dst);
        dst.freeze()
    }

    /// Decode a complete message from the front of `src`.
    pub fn unpack(src: &[u8]) -> Result<Self> {
        crate::codec::decode_message(src)
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.header_bytes() == other.header_bytes()
            && self.data().map(|d| &d[..]) == other.data().map(|d| &d[..])
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.header_bytes().hash(state);
        if let Some(data) = self.data() {
            data[..].hash(state);
        }
    }
}

/// Builder for messages with explicit endpoints.
///
/// Values are accepted as `u32` so that unchecked input (CLI arguments,
/// configuration) can be passed through and range-checked in [`build`].
///
/// [`build`]: MessageBuilder::build
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    opcode: u32,
    destination: u32,
    source: u32,
    params: Option<(u32, u32)>,
    data: Option<Bytes>,
}

impl MessageBuilder {
    pub fn new(opcode: impl Into<u32>) -> Self {
        Self {
            opcode: opcode.into(),
            destination: u32::from(DEFAULT_DESTINATION),
            source: u32::from(DEFAULT_SOURCE),
            params: None,
            data: None,
        }
    }

    pub fn destination(mut self, destination: impl Into<u32>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn source(mut self, source: impl Into<u32>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the inline parameters. Conflicts with [`data`](Self::data).
    pub fn params(mut self, param1: impl Into<u32>, param2: impl Into<u32>) -> Self {
        self.params = Some((param1.into(), param2.into()));
        self
    }

    /// Set the extended payload. Conflicts with [`params`](Self::params).
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Validate the fields and produce the message.
    pub fn build(self) -> Result<Message> {
        let opcode = narrow::<u16>("opcode", self.opcode)?;
        let destination = narrow::<u8>("destination", self.destination)?;
        let source = narrow::<u8>("source", self.source)?;

        if destination & EXTENDED_FLAG != 0 {
            return Err(FrameError::InvalidConstruction(format!(
                "destination 0x{destination:02X} has the extended-payload bit set"
            )));
        }

        let payload = match (self.params, self.data) {
            (Some(_), Some(_)) => {
                return Err(FrameError::InvalidConstruction(
                    "inline parameters and extended payload are mutually exclusive".to_string(),
                ));
            }
            (_, Some(data)) => {
                if data.len() > MAX_PAYLOAD {
                    return Err(FrameError::PayloadTooLarge {
                        size: data.len(),
                        max: MAX_PAYLOAD,
                    });
                }
                Payload::Extended(data)
            }
            (Some((param1, param2)), None) => Payload::Inline {
                param1: narrow::<u8>("param1", param1)?,
                param2: narrow::<u8>("param2", param2)?,
            },
            (None, None) => Payload::Inline {
                param1: 0,
                param2: 0,
            },
        };

        Ok(Message {
            opcode,
            destination,
            source,
            payload,
        })
    }
}

fn narrow<T: TryFrom<u32>>(field: &str, value: u32) -> Result<T> {
    T::try_from(value).map_err(|_| {
        FrameError::InvalidConstruction(format!(
            "{field} {value} does not fit in {} bits",
            std::mem::size_of::<T>() * 8
        ))
    })
}

/// Convert text to payload bytes, one byte per character ordinal.
///
/// Characters above U+00FF have no single-byte ordinal and are rejected.
pub fn text_payload(text: &str) -> Result<Bytes> {
    text.chars()
        .map(|c| {
            u8::try_from(c).map_err(|_| {
                FrameError::InvalidConstruction(format!(
                    "character {c:?} (U+{:04X}) is outside the single-byte range",
                    u32::from(c)
                ))
            })
        })
        .collect::<Result<Vec<u8>>>()
        .map(Bytes::from)
}
