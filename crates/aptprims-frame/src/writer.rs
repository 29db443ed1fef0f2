use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_message, FrameConfig};
use crate::error::{FrameError, Result};
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes complete messages to any `Write` stream.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> MessageWriter<T> {
    /// Create a new message writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new message writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and write a complete message (blocking), then flush.
    pub fn write_message(&mut self, msg: &Message) -> Result<()> {
        if let Some(data) = msg.data() {
            if data.len() > self.config.max_payload_size {
                return Err(FrameError::PayloadTooLarge {
                    size: data.len(),
                    max: self.config.max_payload_size,
                });
            }
        }

        self.buf.clear();
        encode_message(msg, &mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        tracing::trace!(opcode = msg.opcode(), len = offset, "wrote message");
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent writes.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::decode_message;
    use crate::opcode::{MOD_SET_CHANENABLESTATE, MOT_MOVE_ABSOLUTE, MOT_MOVE_HOME};

    #[test]
    fn write_short_frame() {
        let mut writer = MessageWriter::new(Cursor::new(Vec::<u8>::new()));
        writer
            .write_message(&Message::with_params(MOD_SET_CHANENABLESTATE, 1, 1))
            .unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, vec![0x10, 0x02, 0x01, 0x01, 0x50, 0x01]);
    }

    #[test]
    fn write_long_frame() {
        let msg = Message::with_data(MOT_MOVE_ABSOLUTE, vec![0x01, 0x00, 0x80, 0x07, 0x00, 0x00]).unwrap();
        let mut writer = MessageWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_message(&msg).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(
            wire,
            vec![0x53, 0x04, 0x06, 0x00, 0xD0, 0x01, 0x01, 0x00, 0x80, 0x07, 0x00, 0x00]
        );
        assert_eq!(decode_message(&wire).unwrap(), msg);
    }

    #[test]
    fn payload_too_large_rejected() {
        let cfg = FrameConfig {
            max_payload_size: 4,
        };
        let mut writer = MessageWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let msg = Message::with_data(MOT_MOVE_ABSOLUTE, b"oversized".to_vec()).unwrap();
        let err = writer.write_message(&msg).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 9, max: 4 }));
        assert!(writer.get_ref().get_ref().is_empty());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = MessageWriter::new(sink);

        writer.write_message(&Message::new(MOT_MOVE_HOME)).unwrap();

        assert!(flag.load(Ordering::SeqCst));
        assert_eq!(writer.get_ref().data.len(), 6);
    }

    #[test]
    fn handles_interrupted_and_would_block() {
        for kind in [ErrorKind::Interrupted, ErrorKind::WouldBlock] {
            let mut writer = MessageWriter::new(FailOnceWriter {
                kind,
                write_failed: false,
                flush_failed: false,
                data: Vec::new(),
            });
            writer.write_message(&Message::new(MOT_MOVE_HOME)).unwrap();
            assert_eq!(writer.into_inner().data, Message::new(MOT_MOVE_HOME).pack().to_vec());
        }
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = MessageWriter::new(ZeroWriter);
        let err = writer.write_message(&Message::new(MOT_MOVE_HOME)).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = MessageWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.set_max_payload_size(8);
        assert_eq!(writer.config().max_payload_size, 8);

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailOnceWriter {
        kind: ErrorKind,
        write_failed: bool,
        flush_failed: bool,
        data: Vec<u8>,
    }

    impl Write for FailOnceWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.write_failed {
                self.write_failed = true;
                return Err(std::io::Error::from(self.kind));
            }
            // Short writes exercise the offset loop.
            let n = buf.len().min(4);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_failed {
                self.flush_failed = true;
                return Err(std::io::Error::from(self.kind));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
