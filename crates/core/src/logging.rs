use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }
}

/// Destination for workflow progress messages.
///
/// Services take a `&dyn LogSink` so the same code can report to stdout (CLI),
/// to the log panel (desktop app) or to a buffer (tests).
pub trait LogSink: Send + Sync {
    fn log(&self, record: LogRecord);
}

#[derive(Default)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn log(&self, _record: LogRecord) {}
}

#[derive(Default)]
pub struct VecLogSink {
    records: Mutex<Vec<LogRecord>>,
}

impl VecLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|record| record.level == level && record.message.contains(needle))
    }
}

impl LogSink for VecLogSink {
    fn log(&self, record: LogRecord) {
        if let Ok(mut guard) = self.records.lock() {
            guard.push(record);
        }
    }
}

#[derive(Default, Clone)]
pub struct StdoutLogSink {
    min_level: Option<LogLevel>,
    stderr: bool,
}

impl StdoutLogSink {
    /// Drops `Debug` records unless `verbose` is set.
    pub fn with_verbosity(verbose: bool) -> Self {
        Self {
            min_level: if verbose { None } else { Some(LogLevel::Info) },
            stderr: false,
        }
    }

    /// Writes to stderr instead, leaving stdout for command output.
    pub fn on_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    fn accepts(&self, level: LogLevel) -> bool {
        match self.min_level {
            Some(LogLevel::Info) => level != LogLevel::Debug,
            _ => true,
        }
    }
}

impl LogSink for StdoutLogSink {
    fn log(&self, record: LogRecord) {
        if !self.accepts(record.level) {
            return;
        }
        if self.stderr {
            eprintln!("[{}] {}", record.level, record.message);
        } else {
            println!("[{}] {}", record.level, record.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_keeps_order() {
        let sink = VecLogSink::new();
        sink.log(LogRecord::info("first"));
        sink.log(LogRecord::warn("second"));
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert!(sink.contains(LogLevel::Warn, "sec"));
        assert!(!sink.contains(LogLevel::Error, "sec"));
    }

    #[test]
    fn quiet_stdout_sink_skips_debug() {
        let sink = StdoutLogSink::with_verbosity(false);
        assert!(!sink.accepts(LogLevel::Debug));
        assert!(sink.accepts(LogLevel::Warn));
        assert!(StdoutLogSink::with_verbosity(true).accepts(LogLevel::Debug));
    }
}
