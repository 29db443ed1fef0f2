/// Errors that can occur while building, encoding or decoding APT messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer than the 6 header bytes were supplied to a decode call.
    #[error("malformed header ({len} bytes, need 6)")]
    MalformedHeader { len: usize },

    /// A long frame declared more payload bytes than were supplied.
    #[error("truncated payload (declared {declared} bytes, {available} available)")]
    TruncatedPayload { declared: usize, available: usize },

    /// The message could not be constructed from the given fields.
    #[error("invalid message: {0}")]
    InvalidConstruction(String),

    /// The payload does not fit the 16-bit length field or the configured maximum.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing messages.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed between frames, or accepted no more bytes.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
