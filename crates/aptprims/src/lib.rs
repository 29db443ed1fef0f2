//! APT motion-control message codec.
//!
//! aptprims encodes and decodes the fixed-header, optionally length-prefixed
//! messages used to command Thorlabs-style positioning hardware over a serial
//! link, and reads/writes them over any byte stream.
//!
//! # Crate Structure
//!
//! - [`frame`]: message model, codec, endpoints, opcodes, stream reader/writer
//!   (and the `tokio_util` codec behind the `async` feature)

/// Re-export frame types.
pub mod frame {
    pub use aptprims_frame::*;
}

pub use aptprims_frame::{
    decode_header, decode_message, encode_message, unpack, Decoded, FrameError, Header, Message,
    MessageBuilder, Payload,
};
