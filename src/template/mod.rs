//! Template language for generated schema text
//!
//! A template is plain text with `$` directives:
//!
//! ```text
//! create table $ClassName (
//!     Id int primary key$foreach$if(embedded),
//!     $Column$endif$endfor
//! )
//! ```
//!
//! Class-scope macros may appear anywhere; property-scope macros and
//! predicates only between `$foreach` and `$endfor`.

pub mod column;
mod directive;
mod engine;
mod error;
mod lexer;
mod store;

pub use directive::{Condition, Directive, Macro, Predicate, Spanned};
pub use engine::{ClassScope, Template};
pub use error::{TemplateError, TemplateErrorKind};
pub use lexer::{lex, Span, Token};
pub use store::{BuiltinTemplates, DirTemplateStore, StoreError, TemplateId, TemplateStore};
