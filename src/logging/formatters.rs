use core::fmt;

use serde_json::json;

use super::{logger::Config, LogFormatter};

pub struct DefaultFormatter {
    config: Config,
}

impl DefaultFormatter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn timestamp(&self) -> String {
        let color = if self.config.use_ansi {
            "\x1b[0;90m"
        } else {
            ""
        };

        let time = chrono::Local::now().format(&self.config.datetime_format);
        format!("{}[{}]{} ", color, time, self.reset())
    }

    fn format_level(&self, level: log::Level) -> &str {
        if self.config.use_ansi {
            match level {
                log::Level::Error => "\x1b[0;31mERR\x1b[0m",
                log::Level::Warn => "\x1b[0;33mWRN\x1b[0m",
                log::Level::Info => "\x1b[0;32mINF\x1b[0m",
                log::Level::Debug => "\x1b[0;34mDEB\x1b[0m",
                log::Level::Trace => "\x1b[0;37mTRC\x1b[0m",
            }
        } else {
            match level {
                log::Level::Error => "ERR",
                log::Level::Warn => "WRN",
                log::Level::Info => "INF",
                log::Level::Debug => "DEB",
                log::Level::Trace => "TRC",
            }
        }
    }

    fn reset(&self) -> &str {
        if self.config.use_ansi {
            "\x1b[0m"
        } else {
            ""
        }
    }

    fn format_msg(&self, args: &fmt::Arguments<'_>) -> String {
        let color = if self.config.use_ansi {
            "\x1b[0;1m"
        } else {
            ""
        };

        format!("{}{}{}", color, args, self.reset())
    }
}

impl LogFormatter for DefaultFormatter {
    fn format(&self, record: &log::Record) -> String {
        let timestamp = if self.config.show_timestamp {
            self.timestamp()
        } else {
            String::new()
        };

        format!(
            "{}{}: {}",
            timestamp,
            self.format_level(record.level()),
            self.format_msg(record.args()),
        )
    }
}

/// Renders each record as a single line JSON object.
pub struct JsonFormatter {
    config: Config,
}

impl JsonFormatter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl LogFormatter for JsonFormatter {
    fn format(&self, record: &log::Record) -> String {
        let mut json = json!({
            "level": record.level().as_str().to_lowercase(),
            "msg": record.args().to_string(),
            "target": record.target(),
        });

        if self.config.show_timestamp {
            json["time"] = chrono::Local::now().to_rfc3339().into();
        }

        json.to_string()
    }
}

#[cfg(test)]
mod tests {
    use log::{Level, Record};
    use serde_json::Value;

    use super::*;

    fn plain() -> Config {
        Config {
            use_ansi: false,
            show_timestamp: false,
            ..Config::new()
        }
    }

    fn render(formatter: &dyn LogFormatter, level: Level, msg: &str) -> String {
        formatter.format(
            &Record::builder()
                .level(level)
                .target("http")
                .args(format_args!("{}", msg))
                .build(),
        )
    }

    #[test]
    fn default_formatter_plain_output() {
        let formatter = DefaultFormatter::new(plain());

        assert_eq!(
            render(&formatter, Level::Warn, "disk at 91%"),
            "WRN: disk at 91%"
        );
    }

    #[test]
    fn default_formatter_colors_level_and_message() {
        let formatter = DefaultFormatter::new(Config {
            use_ansi: true,
            ..plain()
        });

        assert_eq!(
            render(&formatter, Level::Error, "boom"),
            "\x1b[0;31mERR\x1b[0m: \x1b[0;1mboom\x1b[0m"
        );
    }

    #[test]
    fn default_formatter_prefixes_timestamp() {
        let formatter = DefaultFormatter::new(Config {
            show_timestamp: true,
            datetime_format: "%Y".to_string(),
            ..plain()
        });

        let year = chrono::Local::now().format("%Y").to_string();
        assert_eq!(
            render(&formatter, Level::Info, "up"),
            format!("[{}] INF: up", year)
        );
    }

    #[test]
    fn json_formatter_fields() {
        let formatter = JsonFormatter::new(plain());

        let line = render(&formatter, Level::Info, "GET / \"quoted\"");
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "info");
        assert_eq!(value["msg"], "GET / \"quoted\"");
        assert_eq!(value["target"], "http");
        assert!(value.get("time").is_none());
    }

    #[test]
    fn json_formatter_adds_time_when_enabled() {
        let formatter = JsonFormatter::new(Config {
            show_timestamp: true,
            ..plain()
        });

        let value: Value = serde_json::from_str(&render(&formatter, Level::Debug, "tick")).unwrap();
        let time = value["time"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok());
    }
}
