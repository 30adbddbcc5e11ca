//! Shared helpers for the integration tests.

use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use log::LevelFilter;
use logpipe::logging::{Builder, Logger};

/// In-memory buffer that can be handed to a sink and inspected afterwards.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Logged lines, the way a reader of the log output would split them.
    pub fn lines(&self) -> Vec<String> {
        let contents = self.contents();
        let trimmed = contents.strip_suffix('\n').unwrap_or(&contents);

        if trimmed.is_empty() {
            return Vec::new();
        }

        trimmed.split('\n').map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Plain text logger without colors or timestamps, writing into `buffer`.
#[allow(dead_code)]
pub fn plain_logger(buffer: &SharedBuffer) -> Arc<Logger> {
    let logger = plain_builder(buffer)
        .build()
        .expect("building a logger into memory never fails");

    Arc::new(logger)
}

#[allow(dead_code)]
pub fn plain_builder(buffer: &SharedBuffer) -> Builder {
    Builder::new()
        .with_level(LevelFilter::Trace)
        .with_writer_sink(buffer.clone())
        .with_ansi(false)
        .with_timestamp(false)
}
