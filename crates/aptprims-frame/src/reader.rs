use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::codec::{decode_frame, FrameConfig, Header, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 1024;

/// Reads complete messages from any `Read` stream.
///
/// Handles partial reads internally, so callers always get complete messages.
/// Serial devices commonly deliver a frame a few bytes at a time.
///
/// A frame whose declared payload exceeds the configured maximum is reported
/// once as [`FrameError::PayloadTooLarge`] and then skipped, so reading can
/// continue with the next frame.
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    discard: usize,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            discard: 0,
        }
    }

    /// Wait for the next header and return it without consuming anything.
    ///
    /// For a long frame this tells the caller how many payload bytes the
    /// following [`read_message`](Self::read_message) will wait for.
    pub fn peek_header(&mut self) -> Result<Header> {
        loop {
            self.skip_discarded();
            if self.discard == 0 && self.buf.len() >= HEADER_SIZE {
                break;
            }
            self.fill()?;
        }
        let header = Header::parse(&self.buf)?;
        tracing::trace!(
            opcode = header.opcode(),
            payload_len = header.remaining(),
            "peeked header"
        );
        Ok(header)
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the stream ends between
    /// frames. A stream that ends inside a frame is reported as
    /// [`FrameError::MalformedHeader`] or [`FrameError::TruncatedPayload`].
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            self.skip_discarded();
            if self.discard == 0 {
                match decode_frame(&mut self.buf, self.config.max_payload_size) {
                    Ok(Some(msg)) => {
                        tracing::trace!(
                            opcode = msg.opcode(),
                            len = msg.wire_len(),
                            "read message"
                        );
                        return Ok(msg);
                    }
                    Ok(None) => {}
                    Err(FrameError::PayloadTooLarge { size, max }) => {
                        tracing::warn!(size, max, "skipping oversized frame");
                        self.buf.advance(HEADER_SIZE);
                        self.discard = size;
                        self.skip_discarded();
                        return Err(FrameError::PayloadTooLarge { size, max });
                    }
                    Err(err) => return Err(err),
                }
            }
            self.fill()?;
        }
    }

    /// Number of bytes buffered but not yet returned as a message.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    fn skip_discarded(&mut self) {
        let skipped = self.discard.min(self.buf.len());
        if skipped > 0 {
            self.buf.advance(skipped);
            self.discard -= skipped;
        }
    }

    fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(self.closed_error());
            }

            self.buf.extend_from_slice(&chunk[..read]);
            return Ok(());
        }
    }

    /// Error for end of stream given what is still buffered.
    fn closed_error(&self) -> FrameError {
        if self.buf.is_empty() {
            return FrameError::ConnectionClosed;
        }
        tracing::debug!(buffered = self.buf.len(), "stream closed mid-frame");
        match Header::parse(&self.buf) {
            Ok(header) => FrameError::TruncatedPayload {
                declared: header.remaining(),
                available: self.buf.len() - HEADER_SIZE,
            },
            Err(err) => err,
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
