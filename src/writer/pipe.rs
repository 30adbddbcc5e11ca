use std::{
    io::{self, Read},
    sync::Mutex,
};

use bytes::{Buf, Bytes};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::error::{Error, Result};

/// Creates an in-process byte pipe.
///
/// Every `write` on the [`PipeWriter`] is queued as a single chunk, so the
/// bytes of one call always reach the reader contiguously. The queue is
/// unbounded, writers never wait on the reader.
pub fn pipe() -> (PipeWriter, PipeReader) {
    let (sender, receiver) = unbounded_channel();

    let writer = PipeWriter {
        sender: Mutex::new(Some(sender)),
    };
    let reader = PipeReader {
        receiver,
        current: Bytes::new(),
    };

    (writer, reader)
}

pub struct PipeWriter {
    sender: Mutex<Option<UnboundedSender<Bytes>>>,
}

impl PipeWriter {
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        let sender = sender.as_ref().ok_or(Error::ClosedPipe)?;

        if buf.is_empty() {
            return Ok(0);
        }

        sender
            .send(Bytes::copy_from_slice(buf))
            .map_err(|_| Error::ClosedPipe)?;

        Ok(buf.len())
    }

    /// Closes the write end. The reader sees end-of-stream once it drained
    /// everything queued before this call.
    pub fn close(&self) -> Result<()> {
        let mut sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        sender.take().map(drop).ok_or(Error::ClosedPipe)
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }
}

/// Blocking read end of a [`pipe`].
///
/// NOTE: reads block the calling thread, never use this from within a tokio
/// runtime context.
pub struct PipeReader {
    receiver: UnboundedReceiver<Bytes>,
    current: Bytes,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.current.is_empty() {
            match self.receiver.blocking_recv() {
                Some(chunk) => self.current = chunk,
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);

        Ok(n)
    }
}
