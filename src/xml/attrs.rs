//! Attribute validation shared by the module and class handlers

use std::ops::RangeInclusive;

use thiserror::Error;

use crate::error::Location;

use super::driver::{Element, XmlAttribute};
use super::ParseContext;

/// Problems with the attributes of one element
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("missing attribute '{name}'")]
    Missing { name: String },

    #[error("attribute '{name}' is empty")]
    Empty { name: String },

    #[error("duplicate attribute '{name}' ignored")]
    Duplicate { name: String },

    #[error("attribute '{name}' value '{value}' is not a number")]
    NotANumber { name: String, value: String },

    #[error("attribute '{name}' value {value} is out of range ({min}..={max})")]
    OutOfRange {
        name: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("attribute '{name}' value '{value}' must be 'true' or 'false'")]
    NotBoolean { name: String, value: String },

    #[error("attribute '{name}' value '{value}' must be lowercase letters")]
    NotLowercase { name: String, value: String },

    #[error("attribute '{name}' value '{value}' is invalid (expected {expected})")]
    InvalidValue {
        name: String,
        value: String,
        expected: String,
    },

    #[error("attribute '{name}' does not apply to {target}")]
    NotApplicable { name: String, target: String },

    #[error("unknown attribute '{name}' on <{element}>")]
    Unknown { name: String, element: String },

    #[error("{message}")]
    Invalid { message: String },
}

/// Attributes of one element, consumed one by one as they are validated
///
/// Duplicates are dropped on construction (first value wins) and recorded
/// as errors. Every failed check records an error instead of returning one,
/// so a single element can produce several diagnostics.
#[derive(Debug)]
pub(crate) struct AttrSet {
    element: String,
    attrs: Vec<XmlAttribute>,
    errors: Vec<AttributeError>,
}

impl AttrSet {
    pub fn new(element: &Element) -> Self {
        let mut attrs: Vec<XmlAttribute> = Vec::with_capacity(element.attributes.len());
        let mut errors = Vec::new();
        for attr in &element.attributes {
            if attrs.iter().any(|a| a.name == attr.name) {
                errors.push(AttributeError::Duplicate {
                    name: attr.name.clone(),
                });
            } else {
                attrs.push(attr.clone());
            }
        }
        Self {
            element: element.name.clone(),
            attrs,
            errors,
        }
    }

    pub fn fail(&mut self, error: AttributeError) {
        self.errors.push(error);
    }

    /// Remove an attribute; an empty value is an error and yields `None`
    pub fn take(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|a| a.name == name)?;
        let attr = self.attrs.remove(index);
        if attr.value.is_empty() {
            self.fail(AttributeError::Empty {
                name: name.to_string(),
            });
            return None;
        }
        Some(attr.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Like [`take`](Self::take), but absence is an error too
    pub fn require(&mut self, name: &str) -> Option<String> {
        if !self.contains(name) {
            self.fail(AttributeError::Missing {
                name: name.to_string(),
            });
            return None;
        }
        self.take(name)
    }

    pub fn take_int(&mut self, name: &str, range: RangeInclusive<i64>) -> Option<i64> {
        let raw = self.take(name)?;
        let value = match raw.trim().parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                self.fail(AttributeError::NotANumber {
                    name: name.to_string(),
                    value: raw,
                });
                return None;
            }
        };
        if !range.contains(&value) {
            self.fail(AttributeError::OutOfRange {
                name: name.to_string(),
                value,
                min: *range.start(),
                max: *range.end(),
            });
            return None;
        }
        Some(value)
    }

    pub fn require_int(&mut self, name: &str, range: RangeInclusive<i64>) -> Option<i64> {
        if !self.contains(name) {
            self.fail(AttributeError::Missing {
                name: name.to_string(),
            });
            return None;
        }
        self.take_int(name, range)
    }

    pub fn take_bool(&mut self, name: &str) -> Option<bool> {
        let raw = self.take(name)?;
        match raw.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                self.fail(AttributeError::NotBoolean {
                    name: name.to_string(),
                    value: raw,
                });
                None
            }
        }
    }

    pub fn take_lowercase(&mut self, name: &str) -> Option<String> {
        let raw = self.take(name)?;
        if raw.chars().all(|c| c.is_ascii_lowercase()) {
            Some(raw)
        } else {
            self.fail(AttributeError::NotLowercase {
                name: name.to_string(),
                value: raw,
            });
            None
        }
    }

    /// Take an attribute whose value must be one of `choices`
    pub fn take_choice<T: Copy>(&mut self, name: &str, choices: &[(&str, T)]) -> Option<T> {
        let raw = self.take(name)?;
        if let Some((_, value)) = choices.iter().find(|(key, _)| *key == raw) {
            return Some(*value);
        }
        let expected = choices
            .iter()
            .map(|(key, _)| format!("'{}'", key))
            .collect::<Vec<_>>()
            .join(" or ");
        self.fail(AttributeError::InvalidValue {
            name: name.to_string(),
            value: raw,
            expected,
        });
        None
    }

    /// Every attribute not consumed so far is unknown on this element
    pub fn reject_unknown(&mut self) {
        for attr in std::mem::take(&mut self.attrs) {
            self.errors.push(AttributeError::Unknown {
                name: attr.name,
                element: self.element.clone(),
            });
        }
    }

    /// Every attribute not consumed so far does not apply to `target`
    pub fn reject_inapplicable(&mut self, target: &str) {
        for attr in std::mem::take(&mut self.attrs) {
            self.errors.push(AttributeError::NotApplicable {
                name: attr.name,
                target: target.to_string(),
            });
        }
    }

    /// Report all recorded errors at `location`; true if there were none
    pub fn report(self, cx: &mut ParseContext<'_>, location: &Location) -> bool {
        let ok = self.errors.is_empty();
        for error in self.errors {
            cx.error(location.clone(), error);
        }
        ok
    }
}
