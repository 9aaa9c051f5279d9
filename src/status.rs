//! Operator-facing status lines
//!
//! Info and success lines go to stdout, warnings and errors to stderr. Each
//! line carries a marker that is colored when the stream is a terminal.

use std::io::{self, IsTerminal, Write};

/// Sink for the status lines a workflow emits while it runs.
pub trait Reporter {
    fn info(&mut self, msg: &str);
    fn success(&mut self, msg: &str);
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
}

impl Level {
    pub fn marker(self) -> &'static str {
        match self {
            Level::Info => "[INFO]",
            Level::Success => "[OK]",
            Level::Warn => "[WARN]",
            Level::Error => "[ERROR]",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Level::Info => "\x1b[34m",
            Level::Success => "\x1b[32m",
            Level::Warn => "\x1b[33m",
            Level::Error => "\x1b[31m",
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Level::Warn | Level::Error)
    }
}

/// Render one status line without a trailing newline.
pub fn render(level: Level, msg: &str, color: bool) -> String {
    if color {
        format!("{}{}\x1b[0m {}", level.color(), level.marker(), msg)
    } else {
        format!("{} {}", level.marker(), msg)
    }
}

/// Writes status lines to stdout/stderr.
pub struct ConsoleReporter {
    color_stdout: bool,
    color_stderr: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            color_stdout: io::stdout().is_terminal(),
            color_stderr: io::stderr().is_terminal(),
        }
    }

    fn emit(&mut self, level: Level, msg: &str) {
        // A closed stdout/stderr is not worth failing the operation over.
        if level.to_stderr() {
            let _ = writeln!(io::stderr(), "{}", render(level, msg, self.color_stderr));
        } else {
            let _ = writeln!(io::stdout(), "{}", render(level, msg, self.color_stdout));
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn info(&mut self, msg: &str) {
        self.emit(Level::Info, msg);
    }

    fn success(&mut self, msg: &str) {
        self.emit(Level::Success, msg);
    }

    fn warn(&mut self, msg: &str) {
        self.emit(Level::Warn, msg);
    }

    fn error(&mut self, msg: &str) {
        self.emit(Level::Error, msg);
    }
}

/// Keeps every line in memory. Useful in tests and for callers that want to
/// present status their own way.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub lines: Vec<(Level, String)>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if any line at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn info(&mut self, msg: &str) {
        self.lines.push((Level::Info, msg.to_string()));
    }

    fn success(&mut self, msg: &str) {
        self.lines.push((Level::Success, msg.to_string()));
    }

    fn warn(&mut self, msg: &str) {
        self.lines.push((Level::Warn, msg.to_string()));
    }

    fn error(&mut self, msg: &str) {
        self.lines.push((Level::Error, msg.to_string()));
    }
}
