use std::{fmt::Display, io::IsTerminal, path::PathBuf};

use clap::{Parser, ValueEnum};
use eyre::Context;
use log::{Level, LevelFilter};
use logpipe::{
    logging,
    writer::{EntryWriter, LineTarget, LogTarget, TracingTarget, MAX_LINE_SIZE},
};
use tokio::io::AsyncRead;

use crate::config::{ConfigManager, LocalConfigManager};

/// Target of logpipe's own messages, kept apart from the piped lines.
const CLI_TARGET: &str = "logpipe::cli";

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputType {
    Text,
    Json,
}

impl Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputType::Text => write!(f, "text"),
            OutputType::Json => write!(f, "json"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, long_version = "")]
#[command(about = "Pipe standard input through a structured logger, one entry per line.", long_about = None, disable_help_subcommand = true)]
pub struct LogPipe {
    #[arg(
        short,
        long,
        default_value = "info",
        help = "The level every line read from stdin is logged at."
    )]
    pub level: Level,

    #[arg(
        long,
        default_value = "trace",
        help = "Drop entries above this level. Use `off` to silence the logger."
    )]
    pub max_level: LevelFilter,

    #[arg(
        short,
        long,
        default_value = logpipe::writer::DEFAULT_TARGET,
        help = "The target attached to every entry."
    )]
    pub target: String,

    #[arg(long, short, value_enum, default_value_t = OutputType::Text)]
    pub output: OutputType,

    #[arg(
        short,
        long,
        num_args = 0..=1,
        value_name = "PATH",
        help = "Write entries to a file instead of stderr. Without a path the file lives in the logpipe data dir."
    )]
    pub file: Option<Option<PathBuf>>,

    #[arg(long, help = "Never colorize output.")]
    pub no_color: bool,

    #[arg(long, help = "Leave out the timestamp of each entry.")]
    pub no_timestamp: bool,

    #[arg(
        long,
        default_value_t = MAX_LINE_SIZE,
        value_parser = clap::value_parser!(usize),
        help = "Lines longer than this many bytes are split."
    )]
    pub max_line_size: usize,

    #[arg(
        long,
        conflicts_with_all = ["output", "file", "target"],
        help = "Emit entries through a tracing subscriber instead of the builtin logger."
    )]
    pub tracing: bool,

    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        help = "Also log what logpipe itself is doing, at debug level.",
        display_order = 999
    )]
    pub verbose: u8,
}

impl LogPipe {
    fn use_ansi(&self) -> bool {
        !self.no_color && self.file.is_none() && std::io::stderr().is_terminal()
    }

    fn logger_builder<T>(&self, config: &T) -> eyre::Result<logging::Builder>
    where
        T: ConfigManager,
    {
        let mut builder = logging::Builder::new()
            .with_level(self.max_level)
            .with_ansi(self.use_ansi())
            .with_timestamp(!self.no_timestamp);

        if self.output == OutputType::Json {
            builder = builder.with_json_formatter();
        }

        let builder = match &self.file {
            Some(Some(path)) => builder.with_file_sink(path),
            Some(None) => builder.with_file_sink(
                config
                    .get_log_path()
                    .context("Failed constructing file sink log path")?,
            ),
            None => builder.with_stderr_sink(),
        };

        Ok(builder)
    }

    fn setup_logging<T>(&self, config: &T) -> eyre::Result<()>
    where
        T: ConfigManager,
    {
        self.logger_builder(config)?.build()?.init()
    }

    fn setup_tracing(&self) {
        let max_level = match self.max_level.to_level() {
            Some(Level::Error) => tracing::Level::ERROR,
            Some(Level::Warn) => tracing::Level::WARN,
            Some(Level::Info) => tracing::Level::INFO,
            Some(Level::Debug) => tracing::Level::DEBUG,
            Some(Level::Trace) => tracing::Level::TRACE,
            None => return,
        };

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(max_level)
            .with_ansi(self.use_ansi())
            .with_writer(std::io::stderr);

        if self.no_timestamp {
            subscriber.without_time().init();
        } else {
            subscriber.init();
        }
    }

    fn spawn_writer(&self, target: impl LineTarget) -> eyre::Result<EntryWriter> {
        EntryWriter::builder(target)
            .with_level(self.level)
            .with_max_line_size(self.max_line_size)
            .spawn()
            .context("Failed starting log writer")
    }

    pub fn run(self) -> eyre::Result<()> {
        let config = LocalConfigManager::new();

        if self.tracing {
            self.setup_tracing();
        } else {
            self.setup_logging(&config)?;
        }

        if self.verbose > 0 {
            log::debug!(target: CLI_TARGET, "logpipe starting, output={} level={}", self.output, self.level);
        }

        let writer = if self.tracing {
            self.spawn_writer(TracingTarget)?
        } else {
            self.spawn_writer(LogTarget::global().with_target(&self.target))?
        };

        let copied = forward(tokio::io::stdin(), writer)?;

        if self.verbose > 0 {
            log::debug!(target: CLI_TARGET, "stdin closed after {} bytes", copied);
        }

        Ok(())
    }
}

/// Copies `input` into `writer` until EOF, then waits until every line was
/// logged. Returns the number of bytes copied.
pub fn forward<R>(mut input: R, mut writer: EntryWriter) -> eyre::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let copied = runtime
        .block_on(tokio::io::copy(&mut input, &mut writer))
        .context("Failed copying input into the log writer")?;

    writer.wait().context("Failed draining log writer")?;

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn lines(&self) -> Vec<String> {
            let contents = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
            contents.lines().map(str::to_string).collect()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Runs `input` through the same logger and writer `run` sets up, with
    /// the sink swapped for an in-memory buffer.
    fn pipe_through(args: &[&str], input: &[u8]) -> Vec<String> {
        let cmd = LogPipe::try_parse_from(args).unwrap();
        let buffer = Buffer::default();

        let logger = cmd
            .logger_builder(&LocalConfigManager::new())
            .unwrap()
            .with_writer_sink(buffer.clone())
            .build()
            .unwrap();
        let target = LogTarget::new(Arc::new(logger)).with_target(&cmd.target);
        let writer = cmd.spawn_writer(target).unwrap();

        let copied = forward(input, writer).unwrap();
        assert_eq!(copied, input.len() as u64);

        buffer.lines()
    }

    #[test]
    fn each_input_line_is_one_text_entry() {
        let lines = pipe_through(
            &["logpipe", "--no-timestamp", "--no-color", "-vv"],
            b"hello\nworld\n\nlast without newline",
        );

        assert_eq!(
            lines,
            vec!["INF: hello", "INF: world", "INF: ", "INF: last without newline"]
        );
    }

    #[test]
    fn each_input_line_is_one_json_entry() {
        let lines = pipe_through(
            &["logpipe", "--no-timestamp", "-o", "json", "-t", "http", "-l", "warn"],
            b"GET /\r\nPOST /login\nDELETE /session\n",
        );

        let entries: Vec<serde_json::Value> = lines
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        let messages: Vec<&str> = entries.iter().map(|e| e["msg"].as_str().unwrap()).collect();
        assert_eq!(messages, vec!["GET /", "POST /login", "DELETE /session"]);
        assert!(entries
            .iter()
            .all(|e| e["level"] == "warn" && e["target"] == "http"));
    }

    #[test]
    fn split_size_flag_reaches_the_writer() {
        let lines = pipe_through(
            &["logpipe", "--no-timestamp", "--no-color", "--max-line-size", "4"],
            b"abcdefghij\n",
        );

        assert_eq!(lines, vec!["INF: abcd", "INF: efgh", "INF: ij"]);
    }

    #[test]
    fn defaults() {
        let cmd = LogPipe::try_parse_from(["logpipe"]).unwrap();

        assert_eq!(cmd.level, Level::Info);
        assert_eq!(cmd.max_level, LevelFilter::Trace);
        assert_eq!(cmd.target, "logpipe");
        assert_eq!(cmd.output, OutputType::Text);
        assert_eq!(cmd.max_line_size, MAX_LINE_SIZE);
        assert!(cmd.file.is_none());
        assert!(!cmd.tracing);
        assert_eq!(cmd.verbose, 0);
    }

    #[test]
    fn verbose_counts_occurrences() {
        let cmd = LogPipe::try_parse_from(["logpipe", "-vvv"]).unwrap();
        assert_eq!(cmd.verbose, 3);
    }

    #[test]
    fn file_flag_with_and_without_path() {
        let cmd = LogPipe::try_parse_from(["logpipe", "--file"]).unwrap();
        assert_eq!(cmd.file, Some(None));

        let cmd = LogPipe::try_parse_from(["logpipe", "-f", "/tmp/out.log"]).unwrap();
        assert_eq!(cmd.file, Some(Some(PathBuf::from("/tmp/out.log"))));
    }

    #[test]
    fn levels_parse_case_insensitively() {
        let cmd =
            LogPipe::try_parse_from(["logpipe", "-l", "WARN", "--max-level", "debug", "-o", "json"])
                .unwrap();

        assert_eq!(cmd.level, Level::Warn);
        assert_eq!(cmd.max_level, LevelFilter::Debug);
        assert_eq!(cmd.output, OutputType::Json);
    }

    #[test]
    fn tracing_conflicts_with_file_output() {
        assert!(LogPipe::try_parse_from(["logpipe", "--tracing", "--file"]).is_err());
    }

    #[test]
    fn tracing_conflicts_with_custom_target() {
        assert!(LogPipe::try_parse_from(["logpipe", "--tracing", "-t", "http"]).is_err());
        assert!(LogPipe::try_parse_from(["logpipe", "--tracing"]).is_ok());
    }

    #[test]
    fn file_output_disables_colors() {
        let cmd = LogPipe::try_parse_from(["logpipe", "--file", "out.log"]).unwrap();
        assert!(!cmd.use_ansi());
    }
}
