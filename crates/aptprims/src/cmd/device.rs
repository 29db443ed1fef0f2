use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::Duration;

use aptprims_frame::{FrameError, Message, MessageReader};

const QUEUE_DEPTH: usize = 16;

/// Outcome of one bounded wait on a [`DeviceReader`].
#[derive(Debug)]
pub enum Received {
    Message(Message),
    /// The device ended between frames.
    Closed,
    /// Nothing arrived within the timeout.
    Idle,
}

/// Reads messages from a device on a background thread.
///
/// A blocking `read` on a quiet device cannot be interrupted portably, so the
/// thread owns the reader and the caller waits with a timeout instead. The
/// thread is left behind when the caller stops waiting.
pub struct DeviceReader {
    rx: Receiver<Result<Message, FrameError>>,
}

impl DeviceReader {
    pub fn spawn<R>(reader: MessageReader<R>) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(QUEUE_DEPTH);
        thread::Builder::new()
            .name("aptprims-device-reader".to_string())
            .spawn(move || read_loop(reader, tx))?;
        Ok(Self { rx })
    }

    /// Wait up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Received, FrameError> {
        match self.rx.recv_timeout(timeout) {
            Ok(Ok(msg)) => Ok(Received::Message(msg)),
            Ok(Err(FrameError::ConnectionClosed)) | Err(RecvTimeoutError::Disconnected) => {
                Ok(Received::Closed)
            }
            Ok(Err(err)) => Err(err),
            Err(RecvTimeoutError::Timeout) => Ok(Received::Idle),
        }
    }
}

fn read_loop<R: Read>(mut reader: MessageReader<R>, tx: SyncSender<Result<Message, FrameError>>) {
    loop {
        let result = reader.peek_header().and_then(|header| {
            tracing::debug!(
                opcode = header.opcode(),
                remaining = header.remaining(),
                "header received"
            );
            reader.read_message()
        });

        // Oversized frames are skipped by the reader; anything else ends the stream.
        let fatal = matches!(&result, Err(err) if !matches!(err, FrameError::PayloadTooLarge { .. }));
        if tx.send(result).is_err() || fatal {
            return;
        }
    }
}
