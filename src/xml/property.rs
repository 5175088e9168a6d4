//! Property elements: `<owning>`, `<rel>` and `<basic>`

use crate::model::{
    BasicType, Cardinality, IntegerBounds, Ownership, Property, TextFlags, TypeDetail,
};

use super::attrs::{AttrSet, AttributeError};
use super::driver::Element;
use super::ParseContext;

/// Prefix used when a property has no `prefix` attribute
pub(crate) const DEFAULT_PREFIX: &str = "f";

const CARDINALITIES: &[(&str, Cardinality)] = &[
    ("atomic", Cardinality::Atomic),
    ("col", Cardinality::Collection),
    ("seq", Cardinality::Sequence),
];

/// `kind` values of `<rel>`; true marks a backref
const REL_KINDS: &[(&str, bool)] = &[("reference", false), ("backref", true)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PropertyTag {
    Owning,
    Rel,
    Basic,
}

impl PropertyTag {
    pub fn from_element(name: &str) -> Option<Self> {
        match name {
            "owning" => Some(PropertyTag::Owning),
            "rel" => Some(PropertyTag::Rel),
            "basic" => Some(PropertyTag::Basic),
            _ => None,
        }
    }
}

/// A successfully parsed property element
#[derive(Debug)]
pub(crate) struct ParsedProperty {
    pub property: Property,
    /// `rel kind="backref"`: validated but never stored
    pub backref: bool,
}

/// Parse one property element of the class with id `class_id`
///
/// Errors are reported through `cx`; `None` means the element was invalid.
pub(crate) fn parse_property(
    tag: PropertyTag,
    element: &Element,
    class_id: i64,
    cx: &mut ParseContext<'_>,
) -> Option<ParsedProperty> {
    let mut attrs = AttrSet::new(element);

    let name = attrs.require("id");
    let local_num = field_number(&mut attrs, cx);
    let signature = attrs.require("sig");
    let prefix = attrs
        .take_lowercase("prefix")
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

    let mut backref = false;
    let (ownership, cardinality, basic, detail) = match tag {
        PropertyTag::Owning => {
            let card = attrs
                .take_choice("card", CARDINALITIES)
                .unwrap_or(Cardinality::Atomic);
            attrs.reject_inapplicable("owning property");
            (Ownership::Owning, card, BasicType::Object, TypeDetail::None)
        }
        PropertyTag::Rel => {
            let card = attrs
                .take_choice("card", CARDINALITIES)
                .unwrap_or(Cardinality::Atomic);
            backref = attrs.take_choice("kind", REL_KINDS).unwrap_or(false);
            attrs.reject_inapplicable("rel property");
            (Ownership::Reference, card, BasicType::Object, TypeDetail::None)
        }
        PropertyTag::Basic => {
            let resolved = signature
                .as_deref()
                .and_then(|sig| resolve_basic(sig, &mut attrs).map(|r| (sig, r)));
            match resolved {
                Some((sig, (basic, detail))) => {
                    attrs.reject_inapplicable(sig);
                    (Ownership::None, Cardinality::Atomic, basic, detail)
                }
                None => {
                    if let Some(sig) = &signature {
                        attrs.fail(AttributeError::Invalid {
                            message: format!("unknown basic type '{}'", sig),
                        });
                    }
                    (
                        Ownership::None,
                        Cardinality::Atomic,
                        BasicType::Object,
                        TypeDetail::None,
                    )
                }
            }
        }
    };

    let location = element.location.clone();
    if !attrs.report(cx, &location) {
        return None;
    }
    let (name, local_num, signature) = (name?, local_num?, signature?);

    Some(ParsedProperty {
        property: Property {
            name,
            id: cx.spaces.field_id(class_id, local_num),
            ownership,
            cardinality,
            basic,
            signature,
            prefix,
            detail,
        },
        backref,
    })
}

/// Explicit `num`, or the next number from the class counter
fn field_number(attrs: &mut AttrSet, cx: &mut ParseContext<'_>) -> Option<i64> {
    let limit = cx.spaces.field - 1;
    if attrs.contains("num") {
        let num = attrs.take_int("num", 0..=limit)?;
        cx.next_field_num = cx.next_field_num.max(num + 1);
        return Some(num);
    }
    let num = cx.next_field_num;
    cx.next_field_num += 1;
    if num > limit {
        attrs.fail(AttributeError::Invalid {
            message: format!("auto-assigned field number {} exceeds {}", num, limit),
        });
        return None;
    }
    Some(num)
}

/// Map a basic `sig` onto its type, consuming the type's own attributes
fn resolve_basic(sig: &str, attrs: &mut AttrSet) -> Option<(BasicType, TypeDetail)> {
    let resolved = match sig {
        "Integer" => (
            BasicType::Integer,
            TypeDetail::Integer(integer_bounds(attrs)),
        ),
        "Numeric" => {
            let precision = attrs.take_int("prec", 1..=28).unwrap_or(19);
            let scale = attrs.take_int("scale", 1..=precision).unwrap_or(0);
            (
                BasicType::Numeric,
                TypeDetail::Numeric {
                    precision: precision as u32,
                    scale: scale as u32,
                },
            )
        }
        "Int64" => (
            BasicType::Numeric,
            TypeDetail::Numeric {
                precision: 19,
                scale: 0,
            },
        ),
        "Boolean" => (BasicType::Boolean, TypeDetail::None),
        "Time" => (BasicType::Time, TypeDetail::None),
        "GenDate" => (BasicType::GenDate, TypeDetail::None),
        "Float" => (BasicType::Float, TypeDetail::None),
        "Guid" => (BasicType::Guid, TypeDetail::None),
        "Image" => (BasicType::Image, TypeDetail::None),
        "Binary" => (
            BasicType::Binary,
            TypeDetail::Binary {
                big: attrs.take_bool("big").unwrap_or(false),
            },
        ),
        "String" => text(attrs, BasicType::String, false, true),
        "Unicode" => text(attrs, BasicType::Unicode, false, false),
        "MultiString" => text(attrs, BasicType::MultiString, true, true),
        "MultiUnicode" => text(attrs, BasicType::MultiUnicode, true, false),
        _ => return None,
    };
    Some(resolved)
}

fn text(
    attrs: &mut AttrSet,
    basic: BasicType,
    multi: bool,
    formatted: bool,
) -> (BasicType, TypeDetail) {
    let big = attrs.take_bool("big").unwrap_or(false);
    (
        basic,
        TypeDetail::Text(TextFlags {
            big,
            multi,
            formatted,
        }),
    )
}

/// `bits`, then `min`, `max`, `default`, each checked against the bounds
/// implied so far
fn integer_bounds(attrs: &mut AttrSet) -> IntegerBounds {
    let mut bounds = match attrs.take_int("bits", 1..=32) {
        Some(bits) => IntegerBounds::with_bits(bits as u32),
        None => IntegerBounds::default(),
    };
    if let Some(min) = attrs.take_int("min", bounds.min..=bounds.max) {
        bounds.min = min;
    }
    if let Some(max) = attrs.take_int("max", (bounds.min + 1)..=bounds.max) {
        bounds.max = max;
    }
    bounds.default = match attrs.take_int("default", bounds.min..=bounds.max) {
        Some(default) => default,
        None => 0.clamp(bounds.min, bounds.max),
    };
    bounds
}
