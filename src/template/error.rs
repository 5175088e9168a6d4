//! Error types for template compilation and rendering

use thiserror::Error;

use crate::error::{Diagnostic, Location, Severity};

use super::lexer::Span;

/// What went wrong in a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateErrorKind {
    #[error("unknown macro '{0}'")]
    UnknownMacro(String),

    #[error("unknown predicate '{0}'")]
    UnknownPredicate(String),

    #[error("'{0}' needs a predicate, e.g. ${0}(abstract)")]
    MissingPredicate(String),

    #[error("'{0}' takes no argument")]
    UnexpectedArgument(String),

    #[error("stray '$'; write '$$' for a literal dollar sign")]
    StrayEscape,

    #[error("property macro '{0}' used outside foreach")]
    PropertyMacroOutsideLoop(String),

    #[error("property predicate '{0}' used outside foreach")]
    PropertyPredicateOutsideLoop(String),

    #[error("'{0}' without matching 'if'")]
    UnmatchedConditional(&'static str),

    #[error("'endfor' without matching 'foreach'")]
    UnmatchedEndfor,

    #[error("'{0}' after 'else'")]
    AfterElse(&'static str),

    #[error("nested 'foreach' is not supported")]
    NestedForeach,

    #[error("unbalanced conditional in foreach body")]
    UnbalancedConditional,

    #[error("missing 'endfor'")]
    MissingEndfor,

    #[error("missing 'endif'")]
    MissingEndif,
}

/// A template error, positioned inside the template text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{template}({line},{column}): {kind}")]
pub struct TemplateError {
    pub template: String,
    pub line: usize,
    pub column: usize,
    pub span: Span,
    pub kind: TemplateErrorKind,
}

impl TemplateError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            location: Location {
                file: self.template.clone(),
                line: self.line,
                column: self.column,
                offset: Some(self.span.start),
            },
            message: self.kind.to_string(),
        }
    }
}

/// 1-based column of `offset`; `\r\n`, `\n` and `\r` all end a line
pub(crate) fn column_at(source: &str, offset: usize) -> usize {
    let offset = offset.min(source.len());
    let line_start = source[..offset]
        .rfind(|c| c == '\n' || c == '\r')
        .map(|i| i + 1)
        .unwrap_or(0);
    source[line_start..offset].chars().count() + 1
}
