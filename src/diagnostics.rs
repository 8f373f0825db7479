//! Diagnostic reporting: `Report`, `Hint`, and the `Log` sink trait.
//!
//! Every stage of the pipeline reports through the same sink rather than
//! returning errors up a call chain; this mirrors the way the teacher's CLI
//! frontend collects messages before deciding an exit code, generalized here
//! into a trait so library consumers can supply their own sink (an editor
//! plugin might collect `Report`s into a list instead of printing them).

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::source::{SourceRange, FileTable};

/// Severity of a [`Report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    fn color(self) -> Color {
        match self {
            Severity::Info => Color::Cyan,
            Severity::Warning => Color::Yellow,
            Severity::Error => Color::Red,
        }
    }
}

/// A secondary source location attached to a [`Report`], e.g. "previous
/// declaration here" for a redefinition diagnostic.
#[derive(Debug, Clone)]
pub struct Hint {
    pub range: SourceRange,
    pub message: String,
}

impl Hint {
    pub fn new(range: SourceRange, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
        }
    }
}

/// A single diagnostic message produced by any pipeline stage.
#[derive(Debug, Clone)]
pub struct Report {
    pub severity: Severity,
    pub message: String,
    pub range: Option<SourceRange>,
    pub hints: Vec<Hint>,
}

impl Report {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            range: None,
            hints: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            range: None,
            hints: Vec::new(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            range: None,
            hints: Vec::new(),
        }
    }

    pub fn at(mut self, range: SourceRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hints.push(hint);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// A diagnostic sink. Every pipeline stage takes `&mut dyn Log` rather than
/// returning errors, so the caller decides what happens to them — printed to
/// a terminal, collected for test assertions, or forwarded to an IDE.
pub trait Log {
    fn report(&mut self, report: Report);

    /// Convenience: true if any error-severity report has been sent so far.
    fn has_errors(&self) -> bool;
}

/// Writes reports to a terminal stream, colorized by severity, with file
/// names resolved through a [`FileTable`].
pub struct TerminalLog<'a> {
    stream: StandardStream,
    files: &'a FileTable,
    error_count: usize,
}

impl<'a> TerminalLog<'a> {
    pub fn new(files: &'a FileTable) -> Self {
        Self {
            stream: StandardStream::stderr(ColorChoice::Auto),
            files,
            error_count: 0,
        }
    }

    fn write_report(&mut self, report: &Report) -> std::io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(report.severity.color())).set_bold(true);
        self.stream.set_color(&spec)?;
        write!(self.stream, "{}", report.severity.label())?;
        self.stream.reset()?;
        write!(self.stream, ": ")?;

        if let Some(range) = report.range {
            write!(
                self.stream,
                "{}:{}:{}: ",
                self.files.name(range.start.file),
                range.start.line,
                range.start.column
            )?;
        }
        writeln!(self.stream, "{}", report.message)?;

        for hint in &report.hints {
            writeln!(
                self.stream,
                "  note: {}:{}:{}: {}",
                self.files.name(hint.range.start.file),
                hint.range.start.line,
                hint.range.start.column,
                hint.message
            )?;
        }
        Ok(())
    }
}

impl<'a> Log for TerminalLog<'a> {
    fn report(&mut self, report: Report) {
        if report.is_error() {
            self.error_count += 1;
        }
        // A terminal is a best-effort sink; a write failure here (e.g. a
        // closed stderr) must not abort compilation.
        let _ = self.write_report(&report);
    }

    fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

/// Collects reports into a `Vec` instead of printing them. Used by tests and
/// by API consumers who want the diagnostics back as data.
#[derive(Debug, Default)]
pub struct CollectingLog {
    reports: Vec<Report>,
}

impl CollectingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<Report> {
        self.reports
    }

    pub fn errors(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter().filter(|r| r.is_error())
    }
}

impl Log for CollectingLog {
    fn report(&mut self, report: Report) {
        self.reports.push(report);
    }

    fn has_errors(&self) -> bool {
        self.reports.iter().any(Report::is_error)
    }
}

/// A sink that discards every report. Used internally when a caller passes
/// `None` for the optional log parameter of `compile_shader`.
#[derive(Debug, Default)]
pub struct NullLog {
    error_count: usize,
}

impl Log for NullLog {
    fn report(&mut self, report: Report) {
        if report.is_error() {
            self.error_count += 1;
        }
    }

    fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_log_tracks_errors() {
        let mut log = CollectingLog::new();
        assert!(!log.has_errors());
        log.report(Report::warning("heads up"));
        assert!(!log.has_errors());
        log.report(Report::error("boom"));
        assert!(log.has_errors());
        assert_eq!(log.reports().len(), 2);
    }
}
