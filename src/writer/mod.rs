//! Byte sink adapter that turns raw writes into log entries.
//!
//! An [`EntryWriter`] hands every write to a background worker through an
//! in-process pipe. The worker splits the stream into lines and logs each
//! one at the level the writer was created with. This allows components
//! which only know how to write text, like a child process or a library
//! printing to any `io::Write`, to go through the regular logging pipeline.
//!
//! ```no_run
//! use std::io::Write;
//! use std::sync::Arc;
//!
//! use log::{Level, LevelFilter};
//! use logpipe::logging::Builder;
//!
//! let logger = Arc::new(
//!     Builder::new()
//!         .with_level(LevelFilter::Info)
//!         .with_stderr_sink()
//!         .build()?,
//! );
//!
//! let mut writer = logger.writer_level(Level::Warn)?;
//! writer.write_all(b"first line\nsecond line\n")?;
//! writer.wait()?;
//! # Ok::<(), eyre::Report>(())
//! ```

mod pipe;
mod splitter;
mod target;

use std::{
    io::{self, Read},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    thread::JoinHandle,
};

use log::Level;
use tokio::io::AsyncWrite;

use crate::error::{Error, Result};

pub use pipe::{pipe, PipeReader, PipeWriter};
pub use splitter::{LineSplitter, MAX_LINE_SIZE};
pub use target::{LineTarget, LogTarget, TracingTarget, DEFAULT_TARGET};

pub struct Builder {
    target: Arc<dyn LineTarget>,
    level: Level,
    max_line_size: usize,
    thread_name: String,
}

impl Builder {
    pub fn new(target: impl LineTarget) -> Self {
        Self {
            target: Arc::new(target),
            level: Level::Info,
            max_line_size: MAX_LINE_SIZE,
            thread_name: "logpipe-writer".to_string(),
        }
    }

    pub fn with_level(self, level: Level) -> Self {
        Self { level, ..self }
    }

    pub fn with_max_line_size(self, max_line_size: usize) -> Self {
        Self {
            max_line_size,
            ..self
        }
    }

    pub fn with_thread_name(self, name: impl Into<String>) -> Self {
        Self {
            thread_name: name.into(),
            ..self
        }
    }

    pub fn spawn(self) -> Result<EntryWriter> {
        let (writer, reader) = pipe();
        let level = self.level;
        let target = self.target;
        let splitter = LineSplitter::with_max_line_size(reader, self.max_line_size);

        let worker = std::thread::Builder::new()
            .name(self.thread_name)
            .spawn(move || drain(splitter, target.as_ref(), level))
            .map_err(Error::Spawn)?;

        Ok(EntryWriter {
            pipe: writer,
            worker: Some(worker),
            level,
        })
    }
}

/// Write end of a logging pipe.
///
/// Writes are accepted whole and never wait for the lines to be logged.
/// Lines are delimited by `\n` or cut at the configured maximum line size.
/// A partial line still pending when the writer closes is logged as is.
///
/// Dropping the writer closes it, the worker drains what was written and
/// exits on its own.
pub struct EntryWriter {
    pipe: PipeWriter,
    worker: Option<JoinHandle<()>>,
    level: Level,
}

impl EntryWriter {
    pub fn new(target: impl LineTarget, level: Level) -> Result<Self> {
        Builder::new(target).with_level(level).spawn()
    }

    pub fn builder(target: impl LineTarget) -> Builder {
        Builder::new(target)
    }

    /// Writer logging through the logger installed in the `log` facade.
    pub fn global(level: Level) -> Result<Self> {
        Self::new(LogTarget::global(), level)
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn is_closed(&self) -> bool {
        self.pipe.is_closed()
    }

    /// Queues `buf` for logging and returns its full length.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.pipe.write(buf).map(|_| buf.len()).map_err(Into::into)
    }

    /// Closes the writer without waiting for pending lines to be logged.
    ///
    /// Closing an already closed writer fails with [`Error::ClosedPipe`].
    pub fn close(&self) -> Result<()> {
        self.pipe.close()
    }

    /// Closes the writer if needed and blocks until every pending line was
    /// handed to the logger.
    pub fn wait(mut self) -> Result<()> {
        if !self.pipe.is_closed() {
            self.pipe.close()?;
        }

        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| Error::WorkerPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for EntryWriter {
    fn drop(&mut self) {
        if !self.pipe.is_closed() {
            let _ = self.pipe.close();
        }
    }
}

impl io::Write for EntryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        EntryWriter::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for &EntryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        EntryWriter::write(*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsyncWrite for EntryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(EntryWriter::write(&self, buf))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(self.close().map_err(Into::into))
    }
}

/// Worker loop: logs every line produced by `lines` until the stream ends
/// or fails.
/// Only lines and read failures reach the target.
fn drain<R: Read>(lines: LineSplitter<R>, target: &dyn LineTarget, level: Level) {
    for line in lines {
        match line {
            Ok(line) => target.log_line(level, &String::from_utf8_lossy(&line)),
            Err(err) => {
                target.report_error(&err);
                break;
            }
        }
    }
}
