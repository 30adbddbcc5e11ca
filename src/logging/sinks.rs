use std::{
    fs::File,
    io::{LineWriter, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use eyre::Context;

use super::{LogFormatter, LogSink};

pub struct FileSink {
    file: Mutex<LineWriter<File>>,
    file_path: PathBuf,
    formatter: Box<dyn LogFormatter>,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>, formatter: Box<dyn LogFormatter>) -> eyre::Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed creating log directory {}", parent.display())
            })?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed opening or creating log file {}", path.display()))?;

        Ok(Self {
            file: Mutex::new(LineWriter::new(file)),
            file_path: path.to_path_buf(),
            formatter,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl LogSink for FileSink {
    fn write_log(&self, record: &log::Record) -> eyre::Result<()> {
        let mut file = self.file.lock().map_err(|e| eyre::eyre!(e.to_string()))?;
        writeln!(file, "{}", self.formatter.format(record))?;
        file.flush().context("Can't flush file")
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

pub struct StderrSink {
    handle: std::io::Stderr,
    formatter: Box<dyn LogFormatter>,
}

impl StderrSink {
    pub fn new(formatter: Box<dyn LogFormatter>) -> Self {
        Self {
            handle: std::io::stderr(),
            formatter,
        }
    }
}

impl LogSink for StderrSink {
    fn write_log(&self, record: &log::Record) -> eyre::Result<()> {
        let mut writer = self.handle.lock();

        writeln!(writer, "{}", self.formatter.format(record))?;
        writer.flush().context("Can't flush stderr")
    }

    fn flush(&self) {
        let _ = self.handle.lock().flush();
    }
}

/// Sink writing formatted records into any writer, for example an in-memory
/// buffer shared with a test.
pub struct WriterSink<W> {
    writer: Mutex<W>,
    formatter: Box<dyn LogFormatter>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W, formatter: Box<dyn LogFormatter>) -> Self {
        Self {
            writer: Mutex::new(writer),
            formatter,
        }
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write_log(&self, record: &log::Record) -> eyre::Result<()> {
        let line = self.formatter.format(record);
        let mut writer = self.writer.lock().map_err(|e| eyre::eyre!(e.to_string()))?;

        writeln!(writer, "{}", line).context("Can't write log record")
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

pub struct NullSink {}

impl NullSink {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for NullSink {
    fn write_log(&self, _record: &log::Record) -> eyre::Result<()> {
        Ok(())
    }

    fn flush(&self) {}
}
