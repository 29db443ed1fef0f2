//! APT message framing for motion-control hardware on a serial link.
//!
//! Every message starts with a fixed 6-byte header:
//! - A 2-byte little-endian opcode
//! - Two inline parameter bytes, or a 2-byte little-endian payload length
//! - A destination byte whose bit 7 flags a length-prefixed payload
//! - A source byte
//!
//! The header alone is enough to learn how many payload bytes follow, so a
//! message can be read header first without buffering guesswork.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod message;
pub mod opcode;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::AptCodec;
pub use codec::{
    decode_frame, decode_header, decode_message, encode_message, unpack, Decoded, FrameConfig,
    Header, HEADER_SIZE, MAX_PAYLOAD,
};
pub use endpoint::{DEFAULT_DESTINATION, DEFAULT_SOURCE, EXTENDED_FLAG, GENERIC_USB, HOST};
pub use error::{FrameError, Result};
pub use message::{text_payload, Message, MessageBuilder, Payload};
pub use reader::MessageReader;
pub use writer::MessageWriter;
