use std::{io::Write, path::PathBuf, sync::Arc};

use eyre::Context;
use log::{Level, LevelFilter, Log};

use super::{
    formatters::{DefaultFormatter, JsonFormatter},
    sinks::{FileSink, NullSink, StderrSink, WriterSink},
    LogFormatter, LogSink,
};
use crate::writer::{EntryWriter, LogTarget};

#[derive(Debug, Clone)]
pub struct Config {
    pub enabled: bool,
    pub datetime_format: String,
    pub use_ansi: bool,
    pub show_timestamp: bool,
}

impl Config {
    pub fn new() -> Self {
        Self {
            enabled: true,
            datetime_format: "%Y-%m-%d %H:%M:%S".to_string(),
            use_ansi: true,
            show_timestamp: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Logger {
    filter: LevelFilter,
    sink: Box<dyn LogSink>,
    config: Config,
}

impl Logger {
    pub fn new(filter: LevelFilter, sink: Box<dyn LogSink>, config: Config) -> Self {
        Self {
            filter,
            sink,
            config,
        }
    }

    pub fn filter(&self) -> LevelFilter {
        self.filter
    }

    /// Installs the logger as the global `log` logger.
    pub fn init(self) -> eyre::Result<()> {
        log::set_max_level(self.filter);
        log::set_boxed_logger(Box::new(self)).context("Failed registering boxed logger")?;

        Ok(())
    }

    /// Byte sink logging every line written to it at info level.
    pub fn writer(self: &Arc<Self>) -> crate::Result<EntryWriter> {
        self.writer_level(Level::Info)
    }

    pub fn writer_level(self: &Arc<Self>, level: Level) -> crate::Result<EntryWriter> {
        let logger: Arc<dyn Log> = self.clone();
        EntryWriter::new(LogTarget::new(logger), level)
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.config.enabled && self.filter >= metadata.level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Err(err) = self.sink.write_log(record) {
            let _ = writeln!(std::io::stderr(), "logpipe: failed writing log record: {:#}", err);
        }
    }

    fn flush(&self) {
        self.sink.flush()
    }
}

type SinkConstructor =
    Box<dyn Fn(Box<dyn LogFormatter + 'static>) -> eyre::Result<Box<dyn LogSink + 'static>>>;

pub struct Builder {
    filter: LevelFilter,
    constructor: SinkConstructor,
    formatter_builder: Box<dyn Fn(Config) -> Box<dyn LogFormatter + 'static>>,
    config: Config,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            filter: LevelFilter::Off,
            constructor: Box::new(|_| Ok(Box::new(NullSink::new()))),
            formatter_builder: Box::new(|config| Box::new(DefaultFormatter::new(config))),
            config: Config::new(),
        }
    }

    pub fn with_level(self, filter: LevelFilter) -> Self {
        Self { filter, ..self }
    }

    pub fn with_file_sink(self, path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        Self {
            constructor: Box::new(move |formatter| {
                let sink = FileSink::new(&path, formatter)?;
                Ok(Box::new(sink))
            }),
            ..self
        }
    }

    pub fn with_stderr_sink(self) -> Self {
        Self {
            constructor: Box::new(move |formatter| {
                let sink = StderrSink::new(formatter);
                Ok(Box::new(sink))
            }),
            ..self
        }
    }

    pub fn with_writer_sink<W>(self, writer: W) -> Self
    where
        W: Write + Clone + Send + 'static,
    {
        Self {
            constructor: Box::new(move |formatter| {
                let sink = WriterSink::new(writer.clone(), formatter);
                Ok(Box::new(sink))
            }),
            ..self
        }
    }

    pub fn with_json_formatter(self) -> Self {
        Self {
            formatter_builder: Box::new(|config| Box::new(JsonFormatter::new(config))),
            ..self
        }
    }

    pub fn with_ansi(mut self, use_ansi: bool) -> Self {
        self.config.use_ansi = use_ansi;
        self
    }

    pub fn with_timestamp(mut self, show_timestamp: bool) -> Self {
        self.config.show_timestamp = show_timestamp;
        self
    }

    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.config.datetime_format = format.into();
        self
    }

    pub fn build(&self) -> eyre::Result<Logger> {
        let sink = ((self.constructor)((self.formatter_builder)(self.config.clone())))?;
        Ok(Logger::new(self.filter, sink, self.config.clone()))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
