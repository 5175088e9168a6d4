//! Handler for one `<class>` element and its properties

use crate::error::Location;
use crate::model::{Class, Property};

use super::attrs::{AttrSet, AttributeError};
use super::driver::{Element, ElementHandler};
use super::property::{parse_property, ParsedProperty, PropertyTag};
use super::ParseContext;

/// Where the handler is inside its `<class>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassState {
    /// Before the `<class>` start tag
    Null,
    InClass,
    /// Inside the optional `<props>` wrapper
    InProperties,
    /// After the `</class>` end tag
    PostClass,
}

/// What became of a class once its end tag was seen
#[derive(Debug)]
pub enum ClassOutcome {
    Accepted(Class),
    /// Non-positive class id: a built-in class that is not generated
    Excluded(Class),
    /// Errors were reported; the class is dropped
    Failed,
}

/// A property element that has started but not yet ended
#[derive(Debug)]
struct Pending {
    element: String,
    parsed: Option<ParsedProperty>,
}

#[derive(Debug)]
pub struct ClassHandler {
    state: ClassState,
    failed: bool,
    /// Nesting depth of an element being skipped after an error
    skip_depth: usize,
    location: Option<Location>,
    name: Option<String>,
    id: i64,
    base: Option<String>,
    abbr: Option<String>,
    is_abstract: bool,
    properties: Vec<Property>,
    /// Field ids seen so far, including backrefs
    field_ids: Vec<i64>,
    pending: Option<Pending>,
}

impl Default for ClassHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassHandler {
    pub fn new() -> Self {
        Self {
            state: ClassState::Null,
            failed: false,
            skip_depth: 0,
            location: None,
            name: None,
            id: 0,
            base: None,
            abbr: None,
            is_abstract: false,
            properties: Vec::new(),
            field_ids: Vec::new(),
            pending: None,
        }
    }

    pub fn state(&self) -> ClassState {
        self.state
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Location of the `<class>` start tag, once seen
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Consume the handler and decide the fate of its class
    pub fn finish(self) -> ClassOutcome {
        if self.failed || self.state != ClassState::PostClass {
            return ClassOutcome::Failed;
        }
        let (Some(name), Some(base)) = (self.name, self.base) else {
            return ClassOutcome::Failed;
        };
        let class = Class {
            abbr: self.abbr.unwrap_or_else(|| name.to_lowercase()),
            name,
            id: self.id,
            base,
            is_abstract: self.is_abstract,
            properties: self.properties,
        };
        if class.id <= 0 {
            ClassOutcome::Excluded(class)
        } else {
            ClassOutcome::Accepted(class)
        }
    }

    fn fail(&mut self, cx: &mut ParseContext<'_>, location: &Location, message: impl std::fmt::Display) {
        cx.error(location.clone(), message);
        self.failed = true;
    }

    /// Report an unexpected element and ignore everything inside it
    fn skip(&mut self, cx: &mut ParseContext<'_>, element: &Element, message: String) {
        self.fail(cx, &element.location, message);
        self.skip_depth = 1;
    }

    fn class_label(&self) -> String {
        match &self.name {
            Some(name) => format!("class '{}'", name),
            None => "class".to_string(),
        }
    }

    fn start_class(&mut self, cx: &mut ParseContext<'_>, element: &Element) {
        cx.begin_class();
        self.state = ClassState::InClass;
        self.location = Some(element.location.clone());

        let mut attrs = AttrSet::new(element);
        self.name = attrs.require("id");
        let local_num = class_number(&mut attrs, cx);
        self.base = attrs.require("base");
        self.abbr = attrs.take_lowercase("abbr");
        self.is_abstract = attrs.take_bool("abstract").unwrap_or(false);
        attrs.reject_unknown();

        if let Some(num) = local_num {
            self.id = cx.spaces.class_id(cx.module_id, num);
        }

        if !attrs.report(cx, &element.location) {
            self.failed = true;
        }
    }

    fn start_property(&mut self, cx: &mut ParseContext<'_>, tag: PropertyTag, element: &Element) {
        let parsed = parse_property(tag, element, self.id, cx);
        if parsed.is_none() {
            self.failed = true;
        }
        self.pending = Some(Pending {
            element: element.name.clone(),
            parsed,
        });
    }

    fn end_property(&mut self, cx: &mut ParseContext<'_>, location: &Location, parsed: ParsedProperty) {
        let ParsedProperty { property, backref } = parsed;
        if self.field_ids.contains(&property.id) {
            let message = format!(
                "duplicate field id {} for property '{}' in {}",
                property.id,
                property.name,
                self.class_label()
            );
            self.fail(cx, location, message);
            return;
        }
        self.field_ids.push(property.id);
        if backref {
            tracing::debug!("backref '{}' is not stored", property.name);
            return;
        }
        self.properties.push(property);
    }
}

/// Explicit `num`, or the next number from the module counter
fn class_number(attrs: &mut AttrSet, cx: &mut ParseContext<'_>) -> Option<i64> {
    let limit = cx.spaces.class - 1;
    if attrs.contains("num") {
        let num = attrs.take_int("num", 0..=limit)?;
        cx.next_class_num = cx.next_class_num.max(num + 1);
        return Some(num);
    }
    let num = cx.next_class_num;
    cx.next_class_num += 1;
    if num > limit {
        attrs.fail(AttributeError::Invalid {
            message: format!("auto-assigned class number {} exceeds {}", num, limit),
        });
        return None;
    }
    Some(num)
}

impl ElementHandler for ClassHandler {
    fn on_start(&mut self, cx: &mut ParseContext<'_>, element: &Element) {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return;
        }
        let name = element.name.as_str();
        match self.state {
            ClassState::Null if name == "class" => self.start_class(cx, element),
            ClassState::Null => {
                self.skip(cx, element, format!("expected <class>, found <{}>", name));
            }
            ClassState::InClass | ClassState::InProperties => {
                if let Some(pending) = &self.pending {
                    let message = format!("unexpected <{}> inside <{}>", name, pending.element);
                    self.skip(cx, element, message);
                } else if let Some(tag) = PropertyTag::from_element(name) {
                    self.start_property(cx, tag, element);
                } else if name == "props" && self.state == ClassState::InClass {
                    self.state = ClassState::InProperties;
                } else {
                    let message = format!("unexpected <{}> in {}", name, self.class_label());
                    self.skip(cx, element, message);
                }
            }
            ClassState::PostClass => {
                self.skip(cx, element, format!("unexpected <{}> after </class>", name));
            }
        }
    }

    fn on_end(&mut self, cx: &mut ParseContext<'_>, name: &str, location: &Location) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }
        if let Some(pending) = self.pending.take() {
            if let Some(parsed) = pending.parsed {
                self.end_property(cx, location, parsed);
            }
            return;
        }
        match (self.state, name) {
            (ClassState::InProperties, "props") => self.state = ClassState::InClass,
            (ClassState::InClass, "class") => self.state = ClassState::PostClass,
            _ => {}
        }
    }
}
