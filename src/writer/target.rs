use std::{io, sync::Arc};

use log::{Level, Log, Metadata, Record};

/// Default record target used for lines routed through a writer.
pub const DEFAULT_TARGET: &str = "logpipe";

/// The part of a logger an [`EntryWriter`](super::EntryWriter) talks to.
pub trait LineTarget: Send + Sync + 'static {
    /// Emits one completed line.
    fn log_line(&self, level: Level, line: &str);

    /// Reports a failure of the stream feeding the writer.
    fn report_error(&self, err: &io::Error);
}

/// Routes lines into a [`log::Log`] implementation.
#[derive(Clone)]
pub struct LogTarget {
    logger: Arc<dyn Log>,
    target: String,
}

impl LogTarget {
    pub fn new(logger: Arc<dyn Log>) -> Self {
        Self {
            logger,
            target: DEFAULT_TARGET.to_string(),
        }
    }

    /// Target forwarding to whatever logger is installed in the `log` facade.
    pub fn global() -> Self {
        Self::new(Arc::new(GlobalLogger))
    }

    pub fn with_target(self, target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..self
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn emit(&self, level: Level, args: std::fmt::Arguments<'_>) {
        let metadata = Metadata::builder()
            .level(level)
            .target(&self.target)
            .build();

        if !self.logger.enabled(&metadata) {
            return;
        }

        self.logger.log(
            &Record::builder()
                .metadata(metadata)
                .args(args)
                .module_path_static(Some(module_path!()))
                .build(),
        );
    }
}

impl LineTarget for LogTarget {
    fn log_line(&self, level: Level, line: &str) {
        self.emit(level, format_args!("{}", line));
    }

    fn report_error(&self, err: &io::Error) {
        self.emit(
            Level::Error,
            format_args!("Error while reading from Writer: {}", err),
        );
    }
}

struct GlobalLogger;

impl Log for GlobalLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record) {
        log::logger().log(record)
    }

    fn flush(&self) {
        log::logger().flush()
    }
}

/// Routes lines into the current `tracing` dispatcher as events.
///
/// `tracing` needs static targets, every event is emitted under
/// [`DEFAULT_TARGET`].
#[derive(Clone, Copy, Default)]
pub struct TracingTarget;

impl LineTarget for TracingTarget {
    fn log_line(&self, level: Level, line: &str) {
        match level {
            Level::Error => tracing::error!(target: "logpipe", "{}", line),
            Level::Warn => tracing::warn!(target: "logpipe", "{}", line),
            Level::Info => tracing::info!(target: "logpipe", "{}", line),
            Level::Debug => tracing::debug!(target: "logpipe", "{}", line),
            Level::Trace => tracing::trace!(target: "logpipe", "{}", line),
        }
    }

    fn report_error(&self, err: &io::Error) {
        tracing::error!(target: "logpipe", "Error while reading from Writer: {}", err);
    }
}
