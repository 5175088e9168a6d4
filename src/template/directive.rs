//! The flat directive stream a template compiles to

use super::error::TemplateErrorKind;
use super::lexer::{lex, Span, Token};

/// A value with its span in the template text
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Text substitutions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Macro {
    ClassName,
    BaseName,
    ModuleName,
    ModuleId,
    Version,
    BackVersion,
    ClassId,
    Abbr,
    Guid,
    FieldName,
    Prefix,
    FieldId,
    Min,
    Max,
    Default,
    BigBinary,
    Signature,
    FieldType,
    Column,
}

const MACROS: &[(&str, Macro)] = &[
    ("ClassName", Macro::ClassName),
    ("BaseName", Macro::BaseName),
    ("ModuleName", Macro::ModuleName),
    ("ModuleId", Macro::ModuleId),
    ("Version", Macro::Version),
    ("BackVersion", Macro::BackVersion),
    ("ClassId", Macro::ClassId),
    ("Abbr", Macro::Abbr),
    ("Guid", Macro::Guid),
    ("FieldName", Macro::FieldName),
    ("Prefix", Macro::Prefix),
    ("FieldId", Macro::FieldId),
    ("Min", Macro::Min),
    ("Max", Macro::Max),
    ("Default", Macro::Default),
    ("BigBinary", Macro::BigBinary),
    ("Signature", Macro::Signature),
    ("FieldType", Macro::FieldType),
    ("Column", Macro::Column),
];

impl Macro {
    pub fn from_name(name: &str) -> Option<Self> {
        MACROS.iter().find(|(n, _)| *n == name).map(|(_, m)| *m)
    }

    pub fn name(&self) -> &'static str {
        MACROS
            .iter()
            .find(|(_, m)| m == self)
            .map_or("?", |(n, _)| *n)
    }

    /// Only meaningful inside `$foreach`
    pub fn is_property_scope(&self) -> bool {
        !matches!(
            self,
            Macro::ClassName
                | Macro::BaseName
                | Macro::ModuleName
                | Macro::ModuleId
                | Macro::Version
                | Macro::BackVersion
                | Macro::ClassId
                | Macro::Abbr
                | Macro::Guid
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Abstract,
    First,
    Object,
    Atomic,
    Collection,
    Sequence,
    RefGroup,
    RefAtom,
    Multi,
    BigString,
    Formatted,
    Embedded,
    Owning,
}

const PREDICATES: &[(&str, Predicate)] = &[
    ("abstract", Predicate::Abstract),
    ("first", Predicate::First),
    ("object", Predicate::Object),
    ("atomic", Predicate::Atomic),
    ("collection", Predicate::Collection),
    ("sequence", Predicate::Sequence),
    ("refgroup", Predicate::RefGroup),
    ("refatom", Predicate::RefAtom),
    ("multi", Predicate::Multi),
    ("bigstring", Predicate::BigString),
    ("formatted", Predicate::Formatted),
    ("embedded", Predicate::Embedded),
    ("owning", Predicate::Owning),
];

impl Predicate {
    pub fn from_name(name: &str) -> Option<Self> {
        PREDICATES.iter().find(|(n, _)| *n == name).map(|(_, p)| *p)
    }

    pub fn name(&self) -> &'static str {
        PREDICATES
            .iter()
            .find(|(_, p)| p == self)
            .map_or("?", |(n, _)| *n)
    }

    pub fn is_property_scope(&self) -> bool {
        !matches!(self, Predicate::Abstract | Predicate::First)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub predicate: Predicate,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Literal(String),
    Newline,
    Macro(Macro),
    If(Condition),
    Elif(Condition),
    Else,
    Endif,
    Foreach,
    Endfor,
}

/// Tokenize template text into directives
///
/// Only lexical and naming problems are caught here; nesting is checked
/// while rendering.
pub fn compile(source: &str) -> Result<Vec<Spanned<Directive>>, Spanned<TemplateErrorKind>> {
    let mut directives = Vec::new();
    for (token, span) in lex(source) {
        let directive = match token {
            Ok(Token::Text(text)) => Directive::Literal(text),
            Ok(Token::Dollar) => Directive::Literal("$".to_string()),
            Ok(Token::Newline) => Directive::Newline,
            Ok(Token::Directive(raw)) => {
                parse_directive(&raw).map_err(|kind| Spanned::new(kind, span.clone()))?
            }
            Err(()) => return Err(Spanned::new(TemplateErrorKind::StrayEscape, span)),
        };
        directives.push(Spanned::new(directive, span));
    }
    Ok(directives)
}

fn parse_directive(raw: &str) -> Result<Directive, TemplateErrorKind> {
    let (name, argument) = match raw.find('(') {
        Some(open) => (&raw[..open], Some(&raw[open + 1..raw.len() - 1])),
        None => (raw, None),
    };

    let keyword = match name {
        "if" | "elif" => {
            let Some(argument) = argument else {
                return Err(TemplateErrorKind::MissingPredicate(name.to_string()));
            };
            let condition = parse_condition(argument)?;
            return Ok(if name == "if" {
                Directive::If(condition)
            } else {
                Directive::Elif(condition)
            });
        }
        "else" => Directive::Else,
        "endif" => Directive::Endif,
        "foreach" => Directive::Foreach,
        "endfor" => Directive::Endfor,
        _ => match Macro::from_name(name) {
            Some(m) => Directive::Macro(m),
            None => return Err(TemplateErrorKind::UnknownMacro(name.to_string())),
        },
    };
    if argument.is_some() {
        return Err(TemplateErrorKind::UnexpectedArgument(name.to_string()));
    }
    Ok(keyword)
}

fn parse_condition(argument: &str) -> Result<Condition, TemplateErrorKind> {
    let argument = argument.trim();
    let (negated, name) = match argument.strip_prefix('!') {
        Some(rest) => (true, rest.trim()),
        None => (false, argument),
    };
    match Predicate::from_name(name) {
        Some(predicate) => Ok(Condition { predicate, negated }),
        None => Err(TemplateErrorKind::UnknownPredicate(name.to_string())),
    }
}
