//! Stack-based interpreter for compiled templates
//!
//! Conditionals push a [`CondFrame`]; `$foreach` pushes the single
//! [`LoopFrame`]. Inactive branches are still walked so that every
//! directive is checked, whether or not it produces output.

use uuid::Uuid;

use crate::config::{GuidMode, RenderOptions};
use crate::model::{Class, Module, Property, INTEGER_MAX, INTEGER_MIN};

use super::column;
use super::directive::{compile, Condition, Directive, Macro, Predicate, Spanned};
use super::error::{column_at, TemplateError, TemplateErrorKind};
use super::lexer::Span;

/// A compiled template
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    source: String,
    directives: Vec<Spanned<Directive>>,
}

/// The class a template is rendered for
#[derive(Debug, Clone, Copy)]
pub struct ClassScope<'a> {
    pub module: &'a Module,
    pub class: &'a Class,
    /// First class emitted in this pass
    pub first: bool,
}

impl Template {
    pub fn compile(name: impl Into<String>, source: impl Into<String>) -> Result<Self, TemplateError> {
        let name = name.into();
        let source = source.into();
        match compile(&source) {
            Ok(directives) => Ok(Self {
                name,
                source,
                directives,
            }),
            Err(error) => {
                let line = line_at(&source, error.span.start);
                Err(positioned(&name, &source, line, error.span, error.node))
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render for one class; any error discards the partial output
    pub fn render(&self, scope: &ClassScope<'_>, options: &RenderOptions) -> Result<String, TemplateError> {
        Renderer::new(self, scope, options)
            .run()
            .map_err(|(kind, span, line)| positioned(&self.name, &self.source, line, span, kind))
    }
}

fn positioned(
    template: &str,
    source: &str,
    line: usize,
    span: Span,
    kind: TemplateErrorKind,
) -> TemplateError {
    TemplateError {
        template: template.to_string(),
        line,
        column: column_at(source, span.start),
        span,
        kind,
    }
}

/// 1-based line of `offset`, counting `\r\n` once
fn line_at(source: &str, offset: usize) -> usize {
    let before = &source.as_bytes()[..offset.min(source.len())];
    let mut line = 1;
    let mut i = 0;
    while i < before.len() {
        match before[i] {
            b'\r' if before.get(i + 1) == Some(&b'\n') => {
                line += 1;
                i += 1;
            }
            b'\r' | b'\n' => line += 1,
            _ => {}
        }
        i += 1;
    }
    line
}

#[derive(Debug)]
struct CondFrame {
    parent_active: bool,
    /// Some branch of this chain was already chosen
    taken: bool,
    active: bool,
    saw_else: bool,
    span: Span,
    line: usize,
}

#[derive(Debug)]
struct LoopFrame {
    /// Directive index just after `$foreach`
    resume: usize,
    line: usize,
    cond_depth: usize,
    index: usize,
    /// Body is walked once without output
    skipping: bool,
    span: Span,
}

type Failure = (TemplateErrorKind, Span, usize);

struct Renderer<'t, 's> {
    template: &'t Template,
    scope: &'s ClassScope<'s>,
    options: &'s RenderOptions,
    out: String,
    line: usize,
    conds: Vec<CondFrame>,
    looping: Option<LoopFrame>,
    guids: usize,
}

impl<'t, 's> Renderer<'t, 's> {
    fn new(template: &'t Template, scope: &'s ClassScope<'s>, options: &'s RenderOptions) -> Self {
        Self {
            template,
            scope,
            options,
            out: String::new(),
            line: 1,
            conds: Vec::new(),
            looping: None,
            guids: 0,
        }
    }

    fn run(mut self) -> Result<String, Failure> {
        let template = self.template;
        let directives = &template.directives;
        let mut pc = 0;
        while pc < directives.len() {
            let Spanned { node, span } = &directives[pc];
            pc += 1;
            match node {
                Directive::Literal(text) => {
                    if self.active() {
                        self.out.push_str(text);
                    }
                }
                Directive::Newline => {
                    if self.active() {
                        self.out.push_str(self.options.line_ending.as_str());
                    }
                    self.line += 1;
                }
                Directive::Macro(m) => {
                    if m.is_property_scope() && self.looping.is_none() {
                        return Err(self.fail(
                            TemplateErrorKind::PropertyMacroOutsideLoop(m.name().to_string()),
                            span,
                        ));
                    }
                    if self.active() {
                        let text = self.expand(*m);
                        self.out.push_str(&text);
                    }
                }
                Directive::If(condition) => {
                    self.check_scope(condition, span)?;
                    let parent_active = self.active();
                    let active = parent_active && self.eval(condition);
                    self.conds.push(CondFrame {
                        parent_active,
                        taken: active,
                        active,
                        saw_else: false,
                        span: span.clone(),
                        line: self.line,
                    });
                }
                Directive::Elif(condition) => {
                    self.check_scope(condition, span)?;
                    let frame = self.open_frame("elif", span)?;
                    let pending = frame.parent_active && !frame.taken;
                    let value = pending && self.eval(condition);
                    if let Some(frame) = self.conds.last_mut() {
                        frame.active = value;
                        frame.taken |= value;
                    }
                }
                Directive::Else => {
                    let frame = self.open_frame("else", span)?;
                    frame.active = frame.parent_active && !frame.taken;
                    frame.taken = true;
                    frame.saw_else = true;
                }
                Directive::Endif => {
                    self.check_balance("endif", span)?;
                    self.conds.pop();
                }
                Directive::Foreach => {
                    if self.looping.is_some() {
                        return Err(self.fail(TemplateErrorKind::NestedForeach, span));
                    }
                    let skipping = !self.active() || self.scope.class.properties.is_empty();
                    self.looping = Some(LoopFrame {
                        resume: pc,
                        line: self.line,
                        cond_depth: self.conds.len(),
                        index: 0,
                        skipping,
                        span: span.clone(),
                    });
                }
                Directive::Endfor => {
                    let Some(cond_depth) = self.looping.as_ref().map(|frame| frame.cond_depth) else {
                        return Err(self.fail(TemplateErrorKind::UnmatchedEndfor, span));
                    };
                    if self.conds.len() != cond_depth {
                        return Err(self.fail(TemplateErrorKind::UnbalancedConditional, span));
                    }
                    let count = self.scope.class.properties.len();
                    if let Some(frame) = self.looping.as_mut() {
                        frame.index += 1;
                        if frame.skipping || frame.index >= count {
                            self.looping = None;
                        } else {
                            pc = frame.resume;
                            self.line = frame.line;
                        }
                    }
                }
            }
        }

        if let Some(frame) = &self.looping {
            return Err((TemplateErrorKind::MissingEndfor, frame.span.clone(), frame.line));
        }
        if let Some(frame) = self.conds.last() {
            return Err((TemplateErrorKind::MissingEndif, frame.span.clone(), frame.line));
        }
        Ok(self.out)
    }

    fn fail(&self, kind: TemplateErrorKind, span: &Span) -> Failure {
        (kind, span.clone(), self.line)
    }

    fn active(&self) -> bool {
        let branch = self.conds.last().map_or(true, |frame| frame.active);
        let body = self.looping.as_ref().map_or(true, |frame| !frame.skipping);
        branch && body
    }

    fn property(&self) -> Option<&'s Property> {
        let frame = self.looping.as_ref()?;
        self.scope.class.properties.get(frame.index)
    }

    fn check_scope(&self, condition: &Condition, span: &Span) -> Result<(), Failure> {
        if condition.predicate.is_property_scope() && self.looping.is_none() {
            return Err(self.fail(
                TemplateErrorKind::PropertyPredicateOutsideLoop(condition.predicate.name().to_string()),
                span,
            ));
        }
        Ok(())
    }

    /// A conditional closer must not reach into frames opened outside the
    /// current loop body
    fn check_balance(&self, keyword: &'static str, span: &Span) -> Result<(), Failure> {
        if self.conds.is_empty() {
            return Err(self.fail(TemplateErrorKind::UnmatchedConditional(keyword), span));
        }
        if let Some(frame) = &self.looping {
            if self.conds.len() <= frame.cond_depth {
                return Err(self.fail(TemplateErrorKind::UnbalancedConditional, span));
            }
        }
        Ok(())
    }

    fn open_frame(&mut self, keyword: &'static str, span: &Span) -> Result<&mut CondFrame, Failure> {
        self.check_balance(keyword, span)?;
        let line = self.line;
        match self.conds.last_mut() {
            Some(frame) if frame.saw_else => {
                Err((TemplateErrorKind::AfterElse(keyword), span.clone(), line))
            }
            Some(frame) => Ok(frame),
            None => Err((TemplateErrorKind::UnmatchedConditional(keyword), span.clone(), line)),
        }
    }

    fn eval(&self, condition: &Condition) -> bool {
        let class = self.scope.class;
        let value = match condition.predicate {
            Predicate::Abstract => class.is_abstract,
            Predicate::First => self.scope.first,
            predicate => self
                .property()
                .is_some_and(|property| property_predicate(predicate, property)),
        };
        value != condition.negated
    }

    fn expand(&mut self, m: Macro) -> String {
        let ClassScope { module, class, .. } = *self.scope;
        match m {
            Macro::ClassName => class.name.clone(),
            Macro::BaseName => class.base.clone(),
            Macro::ModuleName => module.name.clone(),
            Macro::ModuleId => module.id.to_string(),
            Macro::Version => module.version.to_string(),
            Macro::BackVersion => module.back_version.to_string(),
            Macro::ClassId => class.id.to_string(),
            Macro::Abbr => class.abbr.clone(),
            Macro::Guid => self.mint_guid(),
            property_macro => match self.property() {
                Some(property) => expand_property(property_macro, property),
                None => String::new(),
            },
        }
    }

    fn mint_guid(&mut self) -> String {
        let guid = match self.options.guid_mode {
            GuidMode::Stable => {
                let name = format!(
                    "{}/{}/{}/{}",
                    self.scope.module.name, self.scope.class.id, self.template.name, self.guids
                );
                Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
            }
            GuidMode::Random => Uuid::new_v4(),
        };
        self.guids += 1;
        guid.hyphenated().to_string().to_uppercase()
    }
}

fn property_predicate(predicate: Predicate, property: &Property) -> bool {
    match predicate {
        Predicate::Object => property.is_object(),
        Predicate::Atomic => property.is_atomic(),
        Predicate::Collection => property.is_collection(),
        Predicate::Sequence => property.is_sequence(),
        Predicate::RefGroup => property.is_ref_group(),
        Predicate::RefAtom => property.is_ref_atom(),
        Predicate::Multi => property.is_multi(),
        Predicate::BigString => property.is_big_string(),
        Predicate::Formatted => property.is_formatted(),
        Predicate::Embedded => property.is_embedded(),
        Predicate::Owning => property.is_owning(),
        Predicate::Abstract | Predicate::First => false,
    }
}

fn expand_property(m: Macro, property: &Property) -> String {
    let bounds = property.integer_bounds();
    match m {
        Macro::FieldName => property.name.clone(),
        Macro::Prefix => property.prefix.clone(),
        Macro::FieldId => property.id.to_string(),
        Macro::Min => match bounds {
            Some(b) if b.min != INTEGER_MIN => b.min.to_string(),
            _ => "null".to_string(),
        },
        Macro::Max => match bounds {
            Some(b) if b.max != INTEGER_MAX => b.max.to_string(),
            _ => "null".to_string(),
        },
        Macro::Default => bounds.map_or_else(|| "null".to_string(), |b| b.default.to_string()),
        Macro::BigBinary => u8::from(property.is_big_binary()).to_string(),
        Macro::Signature => property.signature.clone(),
        Macro::FieldType => property.field_type(),
        Macro::Column => column::definition(property),
        _ => String::new(),
    }
}
