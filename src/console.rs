//! Colored terminal output.
//!
//! [`Console`] is the single place user-facing text is written. Styling is
//! applied only when writing to a terminal, so tests and pipes get plain text.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use crossterm::style::{StyledContent, Stylize};
use tracing::warn;

/// Line-oriented writer with status markers.
pub struct Console<W: Write = io::Stdout> {
    writer: W,
    color: bool,
}

impl Console<io::Stdout> {
    /// Console on stdout, colored when stdout is a terminal and `NO_COLOR` is unset.
    pub fn stdout() -> Self {
        let color = io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self {
            writer: io::stdout(),
            color,
        }
    }
}

impl<W: Write> Console<W> {
    /// Plain (uncolored) console over any writer.
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            color: false,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn paint<'a>(&self, text: &'a str, style: fn(&'a str) -> StyledContent<&'a str>) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn emit(&mut self, line: impl Display) {
        if let Err(e) = writeln!(self.writer, "{line}") {
            warn!(error = %e, "failed to write console output");
        }
    }

    /// Unstyled line.
    pub fn line(&mut self, text: impl Display) {
        self.emit(text);
    }

    pub fn blank(&mut self) {
        self.emit("");
    }

    pub fn success(&mut self, text: impl Display) {
        let marker = self.paint("✓", |s| s.green().bold());
        self.emit(format!("{marker} {text}"));
    }

    pub fn info(&mut self, text: impl Display) {
        let marker = self.paint("•", |s| s.cyan());
        self.emit(format!("{marker} {text}"));
    }

    pub fn warn(&mut self, text: impl Display) {
        let marker = self.paint("!", |s| s.yellow().bold());
        self.emit(format!("{marker} {text}"));
    }

    pub fn error(&mut self, text: impl Display) {
        let marker = self.paint("✗", |s| s.red().bold());
        self.emit(format!("{marker} {text}"));
    }

    /// Indented suggestion for what to do next.
    pub fn hint(&mut self, text: impl Display) {
        let body = text.to_string();
        let styled = self.paint(&body, |s| s.dark_grey());
        self.emit(format!("  → {styled}"));
    }

    pub fn heading(&mut self, text: impl Display) {
        let body = text.to_string();
        let styled = self.paint(&body, |s| s.cyan().bold());
        self.emit(styled);
    }

    /// Captured command output, indented, with trailing blank lines dropped.
    pub fn block(&mut self, text: &str) {
        for line in text.trim_end().lines() {
            self.emit(format!("  {line}"));
        }
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!(error = %e, "failed to flush console output");
        }
    }
}

impl Console<Vec<u8>> {
    /// Console capturing into memory.
    pub fn buffer() -> Self {
        Self::with_writer(Vec::new())
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.writer).into_owned()
    }
}
