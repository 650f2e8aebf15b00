//
// logger.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::fs::File;
use std::io::prelude::*;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::Once;
use std::time::SystemTime;

use chrono::DateTime;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_LENS_BACKTRACE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\s*\d+:\s*[<]?(lens|relay)::").ok());
static RE_BACKTRACE_HEADER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\s*Stack\s+backtrace:?\s*$").ok());

/// Hoists the first frame of our own crates above an error backtrace so the
/// origin of the error can be read without scrolling through the whole trace.
fn annotate(message: String) -> String {
    let (Some(re_frame), Some(re_header)) = (&*RE_LENS_BACKTRACE, &*RE_BACKTRACE_HEADER) else {
        return message;
    };

    let mut lines = message.split('\n').collect::<Vec<_>>();

    let mut occurred: Option<String> = None;
    let mut backtrace_index: Option<usize> = None;

    for (index, line) in lines.iter().enumerate() {
        if re_header.is_match(line) {
            backtrace_index = Some(index);
            continue;
        }

        if re_frame.is_match(line) {
            let end = usize::min(index + 1, lines.len() - 1);
            occurred = Some(lines[index..=end].join("\n"));
            break;
        }
    }

    match (occurred, backtrace_index) {
        (Some(occurred), Some(index)) => {
            let insertion = ["Occurred at:", occurred.as_str(), ""].join("\n");
            lines.insert(index, insertion.as_str());
            lines.join("\n")
        },
        _ => message,
    }
}

fn is_internal(record: &log::Record) -> bool {
    let target = record.target();
    let crates = ["lens", "relay", "stdext"];

    // Targets default to module paths such as `lens::data_explorer`, so the
    // first segment names the crate. A target without `::` was set by hand
    // at the call site.
    match target.find("::") {
        None => true,
        Some(loc) => crates.contains(&&target[0..loc]),
    }
}

static ONCE: Once = Once::new();
static LOGGER: Logger = Logger::new();

struct LoggerInner {
    /// The log level (set with the RUST_LOG environment variable)
    level: log::Level,

    /// The file we log to. When `None`, records go to stderr.
    file: Option<File>,
}

struct Logger {
    inner: Mutex<Option<LoggerInner>>,
}

impl Logger {
    const fn new() -> Self {
        let inner = Mutex::new(None);
        Self { inner }
    }

    fn initialize(&self, level: log::Level, file: Option<File>) {
        if let Ok(mut inner) = self.inner.lock() {
            *inner = Some(LoggerInner { level, file });
        }
    }

    fn enabled(level: log::Level, metadata: &log::Metadata) -> bool {
        metadata.level() <= level
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let Ok(guard) = self.inner.lock() else {
            return false;
        };
        match guard.as_ref() {
            Some(inner) => Logger::enabled(inner.level, metadata),
            None => false,
        }
    }

    fn log(&self, record: &log::Record) {
        if !is_internal(record) && record.level() > log::Level::Warn {
            // Foreign crates only get through with warnings and errors
            return;
        }

        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        let Some(inner) = guard.as_mut() else {
            return;
        };

        if !Logger::enabled(inner.level, record.metadata()) {
            return;
        }

        let now: DateTime<Utc> = SystemTime::now().into();
        let timestamp = now.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true);

        let prefix = format!(
            "{} [{}] {} {}:{}",
            timestamp,
            "lens",
            record.level(),
            record.file().unwrap_or("?"),
            record.line().unwrap_or(0),
        );

        let message = annotate(format!("{}", record.args()));
        let message = format!("{prefix}: {message}");

        match inner.file.as_mut() {
            Some(file) => {
                if let Err(error) = writeln!(file, "{}", message) {
                    eprintln!("Error writing to log file: {error:?}");
                }
            },
            // stdout is reserved for protocol output of the binary
            None => eprintln!("{message}"),
        }
    }

    fn flush(&self) {
        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        if let Some(file) = guard.as_mut().and_then(|inner| inner.file.as_mut()) {
            if let Err(error) = file.flush() {
                eprintln!("Error flushing log file: {error:?}");
            }
        }
    }
}

pub fn initialize(file: Option<&str>) {
    ONCE.call_once(|| {
        let level_envvar = std::env::var("RUST_LOG").unwrap_or("info".into());

        let level = match log::Level::from_str(level_envvar.as_str()) {
            Ok(level) => level,
            Err(err) => {
                eprintln!("Error parsing RUST_LOG, defaulting to `info`: {err:?}");
                log::Level::Info
            },
        };

        log::set_max_level(level.to_level_filter());

        let file = match file {
            None => None,
            Some(file) => {
                let file = std::fs::OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(file);

                match file {
                    Ok(file) => Some(file),
                    Err(error) => {
                        eprintln!("Error initializing log: {error:?}");
                        None
                    },
                }
            },
        };

        LOGGER.initialize(level, file);
        if let Err(error) = log::set_logger(&LOGGER) {
            eprintln!("Error installing logger: {error:?}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_hoists_own_frame() {
        let message = [
            "Something failed",
            "Stack backtrace:",
            "   0: std::backtrace::Backtrace::create",
            "   1: lens::data_explorer::table_view::TableView::recompute",
            "             at ./src/data_explorer/table_view.rs:10:5",
        ]
        .join("\n");

        let annotated = annotate(message);
        let lines: Vec<&str> = annotated.lines().collect();
        assert_eq!(lines[1], "Occurred at:");
        assert!(lines[2].contains("lens::data_explorer::table_view"));
    }

    #[test]
    fn test_annotate_leaves_plain_messages() {
        let message = String::from("Nothing to see");
        assert_eq!(annotate(message.clone()), message);
    }

    #[test]
    fn test_logs_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lens.log");
        initialize(path.to_str());

        log::info!("hello from the logger test");
        log::logger().flush();

        // Another test may have installed the logger first, in which case
        // the records went elsewhere.
        if let Ok(contents) = std::fs::read_to_string(&path) {
            if !contents.is_empty() {
                assert!(contents.contains("[lens] INFO"));
                assert!(contents.contains("hello from the logger test"));
            }
        }
    }
}
