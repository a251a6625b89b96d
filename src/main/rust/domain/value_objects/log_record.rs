use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// A line produced by the transcoder
    Output,
    /// A lifecycle message from the session manager
    Notice,
    /// A spawn or I/O diagnostic
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    timestamp: DateTime<Local>,
    elapsed_secs: Option<u64>,
    kind: LogKind,
    text: String,
}

impl LogRecord {
    pub fn output(elapsed: Duration, text: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            elapsed_secs: Some(elapsed.as_secs()),
            kind: LogKind::Output,
            text: text.into(),
        }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::untimed(LogKind::Notice, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::untimed(LogKind::Error, text)
    }

    fn untimed(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            elapsed_secs: None,
            kind,
            text: text.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn elapsed_secs(&self) -> Option<u64> {
        self.elapsed_secs
    }

    pub fn kind(&self) -> LogKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.elapsed_secs {
            Some(secs) => write!(f, "[{}s] {}", secs, self.text),
            None => f.write_str(&self.text),
        }
    }
}
