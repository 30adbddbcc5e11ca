mod formatters;
mod logger;
mod sinks;

pub use formatters::{DefaultFormatter, JsonFormatter};
pub use logger::{Builder, Config, Logger};
pub use sinks::{FileSink, NullSink, StderrSink, WriterSink};

pub trait LogFormatter: Sync + Send {
    fn format(&self, record: &log::Record) -> String;
}

pub trait LogSink: Sync + Send {
    fn write_log(&self, record: &log::Record) -> eyre::Result<()>;
    fn flush(&self);
}
