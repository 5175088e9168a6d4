//! Diagnostics shared by the XML front end and the template engine
//!
//! Nothing in the generator aborts on a bad input file. Problems are
//! recorded as [`Diagnostic`] values in a [`Reporter`], which the caller
//! inspects once the run is over.

use std::collections::HashMap;
use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    /// Informational; does not fail the run
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A position inside a named source (an XML file or a template)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    /// 1-based line, 0 when unknown
    pub line: usize,
    /// 1-based column, 0 when unknown
    pub column: usize,
    /// Byte offset into the source, when known
    pub offset: Option<usize>,
}

impl Location {
    /// A location naming only a file, e.g. for "file not found"
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: 0,
            column: 0,
            offset: None,
        }
    }

    /// Resolve a byte offset in `source` into a line/column location
    pub fn at(file: impl Into<String>, source: &str, offset: usize) -> Self {
        let (line, column) = line_col(source, offset);
        Self {
            file: file.into(),
            line,
            column,
            offset: Some(offset),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.file)
        } else {
            write!(f, "{}({},{})", self.file, self.line, self.column)
        }
    }
}

/// Compute the 1-based line and column of a byte offset
///
/// Columns count characters, not bytes. Offsets past the end of the source
/// are clamped to the end.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = source[line_start..offset].chars().count() + 1;
    (line, column)
}

/// One recorded message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.severity, self.message)
    }
}

impl Diagnostic {
    /// Format the diagnostic with source context using ariadne
    ///
    /// Falls back to the one-line form when the diagnostic has no byte
    /// offset.
    pub fn format(&self, source: &str) -> String {
        let Some(offset) = self.location.offset else {
            return self.to_string();
        };
        let filename = self.location.file.as_str();
        let start = offset.min(source.len());
        let end = source[start..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| start + i)
            .unwrap_or(start);
        let (kind, color) = match self.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Note => (ReportKind::Advice, Color::Blue),
        };

        let mut buf = Vec::new();
        let written = Report::build(kind, filename, start)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Accumulates diagnostics for a whole run
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
    sources: HashMap<String, String>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the text of a named source so diagnostics against it can be
    /// rendered with context later
    pub fn add_source(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.sources.insert(name.into(), text.into());
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, location: Location, message: impl fmt::Display) {
        self.report(Diagnostic {
            severity: Severity::Error,
            location,
            message: message.to_string(),
        });
    }

    pub fn note(&mut self, location: Location, message: impl fmt::Display) {
        self.report(Diagnostic {
            severity: Severity::Note,
            location,
            message: message.to_string(),
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Render every diagnostic, with source context where available
    pub fn render(&self) -> String {
        let mut out = String::new();
        for diagnostic in &self.diagnostics {
            match self.sources.get(&diagnostic.location.file) {
                Some(source) => out.push_str(&diagnostic.format(source)),
                None => {
                    out.push_str(&diagnostic.to_string());
                    out.push('\n');
                }
            }
        }
        out
    }
}
