//! Progress reporting
//!
//! The orchestrator never prints directly. Everything user-visible goes through a
//! [`Reporter`], so tests can capture the exact sequence of lines.

use crossterm::style::{Color, Stylize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Sink for progress lines
pub trait Reporter: Send + Sync {
    fn report(&self, level: LogLevel, message: &str);

    fn info(&self, message: &str) {
        self.report(LogLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.report(LogLevel::Success, message);
    }

    fn warn(&self, message: &str) {
        self.report(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.report(LogLevel::Error, message);
    }
}

/// Styled console output, mirrored into `tracing` at debug level
pub struct ConsoleReporter {
    no_color: bool,
}

impl ConsoleReporter {
    pub fn new(no_color: bool) -> Self {
        Self { no_color }
    }

    fn render(&self, level: LogLevel, message: &str) -> String {
        let (symbol, color) = match level {
            LogLevel::Info => ("ℹ", Color::Blue),
            LogLevel::Success => ("✓", Color::Green),
            LogLevel::Warning => ("⚠", Color::Yellow),
            LogLevel::Error => ("✗", Color::Red),
        };

        if self.no_color {
            format!("{} {}", symbol, message)
        } else {
            format!("{} {}", symbol.with(color), message)
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, level: LogLevel, message: &str) {
        tracing::debug!(?level, "{}", message);

        let line = self.render(level, message);
        match level {
            LogLevel::Error | LogLevel::Warning => eprintln!("{}", line),
            LogLevel::Info | LogLevel::Success => println!("{}", line),
        }
    }
}

/// Reporter that keeps every line in memory
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, message)| message).collect()
    }

    /// Index of the first line containing `needle`
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.messages().iter().position(|line| line.contains(needle))
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.position(needle).is_some()
    }

    /// True when every needle appears on a line after the previous needle's line
    pub fn contains_in_order(&self, needles: &[&str]) -> bool {
        let messages = self.messages();
        let mut start = 0;
        for needle in needles {
            match messages[start..].iter().position(|line| line.contains(needle)) {
                Some(offset) => start += offset + 1,
                None => return false,
            }
        }
        true
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, level: LogLevel, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((level, message.to_string()));
    }
}
