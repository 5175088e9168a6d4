//! SQL column definitions for `$Column`

use crate::model::{BasicType, IntegerBounds, Property, TypeDetail, INTEGER_MAX, INTEGER_MIN};

/// Integer column types, narrowest first, with their natural ranges
const INTEGER_COLUMNS: &[(&str, i64, i64)] = &[
    ("tinyint", 0, 255),
    ("smallint", -32768, 32767),
    ("int", INTEGER_MIN, INTEGER_MAX),
];

/// Column definition fragment for one property
///
/// Properties stored outside the class table come back as a `--` comment.
pub fn definition(property: &Property) -> String {
    let name = &property.name;
    if property.is_object() {
        return if property.is_ref_atom() {
            format!("{name} int null")
        } else {
            stored_separately(property)
        };
    }
    if property.is_multi() {
        return stored_separately(property);
    }

    match property.basic {
        BasicType::Integer => {
            let bounds = property.integer_bounds().copied().unwrap_or_default();
            integer(name, &bounds)
        }
        BasicType::Numeric => match property.detail {
            TypeDetail::Numeric { precision, scale } => {
                format!("{name} decimal({precision},{scale}) not null default 0")
            }
            _ => format!("{name} decimal(19,0) not null default 0"),
        },
        BasicType::Float => format!("{name} float not null default 0"),
        BasicType::Boolean => format!("{name} bit not null default 0"),
        BasicType::Time => format!("{name} datetime null"),
        BasicType::GenDate => format!("{name} int not null default 0"),
        BasicType::Guid => format!("{name} uniqueidentifier null"),
        BasicType::Image => format!("{name} image null"),
        BasicType::Binary if property.is_big_binary() => format!("{name} image null"),
        BasicType::Binary => format!("{name} varbinary(8000) null"),
        BasicType::String if property.is_big_string() => {
            format!("{name} ntext null, {name}_Fmt image null")
        }
        BasicType::String => format!("{name} nvarchar(4000) null, {name}_Fmt varbinary(8000) null"),
        BasicType::Unicode if property.is_big_string() => format!("{name} ntext null"),
        BasicType::Unicode => format!("{name} nvarchar(4000) null"),
        BasicType::MultiString | BasicType::MultiUnicode | BasicType::Object => {
            stored_separately(property)
        }
    }
}

fn stored_separately(property: &Property) -> String {
    format!(
        "-- {}: {} (stored separately)",
        property.name,
        property.field_type()
    )
}

fn integer(name: &str, bounds: &IntegerBounds) -> String {
    let (column, low, high) = INTEGER_COLUMNS
        .iter()
        .copied()
        .find(|(_, low, high)| bounds.min >= *low && bounds.max <= *high)
        .unwrap_or(INTEGER_COLUMNS[INTEGER_COLUMNS.len() - 1]);

    let mut sql = format!("{name} {column} not null default {}", bounds.default);
    let lower = (bounds.min > low).then(|| format!("{name} >= {}", bounds.min));
    let upper = (bounds.max < high).then(|| format!("{name} <= {}", bounds.max));
    match (lower, upper) {
        (Some(lower), Some(upper)) => sql.push_str(&format!(" check ({lower} and {upper})")),
        (Some(side), None) | (None, Some(side)) => sql.push_str(&format!(" check ({side})")),
        (None, None) => {}
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cardinality, Ownership, TextFlags};

    fn basic(name: &str, basic: BasicType, detail: TypeDetail) -> Property {
        Property {
            name: name.to_string(),
            id: 1,
            ownership: Ownership::None,
            cardinality: Cardinality::Atomic,
            basic,
            signature: basic.name().to_string(),
            prefix: "f".to_string(),
            detail,
        }
    }

    fn int(min: i64, max: i64, default: i64) -> Property {
        basic(
            "Count",
            BasicType::Integer,
            TypeDetail::Integer(IntegerBounds {
                min,
                max,
                default,
                bits: None,
            }),
        )
    }

    #[test]
    fn test_byte_range_needs_no_check() {
        let p = basic(
            "Count",
            BasicType::Integer,
            TypeDetail::Integer(IntegerBounds::with_bits(8)),
        );
        insta::assert_snapshot!(definition(&p), @"Count tinyint not null default 0");
    }

    #[test]
    fn test_narrow_range_gets_check() {
        insta::assert_snapshot!(
            definition(&int(1, 12, 1)),
            @"Count tinyint not null default 1 check (Count >= 1 and Count <= 12)"
        );
        insta::assert_snapshot!(
            definition(&int(-5, 32767, 0)),
            @"Count smallint not null default 0 check (Count >= -5)"
        );
    }

    #[test]
    fn test_full_range_is_plain_int() {
        assert_eq!(
            definition(&int(INTEGER_MIN, INTEGER_MAX, 0)),
            "Count int not null default 0"
        );
    }

    #[test]
    fn test_thirty_two_bits_only_checks_lower_side() {
        let p = basic(
            "Mask",
            BasicType::Integer,
            TypeDetail::Integer(IntegerBounds::with_bits(32)),
        );
        assert_eq!(definition(&p), "Mask int not null default 0 check (Mask >= 0)");
    }

    #[test]
    fn test_text_columns() {
        let plain = TypeDetail::Text(TextFlags {
            big: false,
            multi: false,
            formatted: true,
        });
        assert_eq!(
            definition(&basic("Title", BasicType::String, plain)),
            "Title nvarchar(4000) null, Title_Fmt varbinary(8000) null"
        );
        let big = TypeDetail::Text(TextFlags {
            big: true,
            multi: false,
            formatted: false,
        });
        assert_eq!(
            definition(&basic("Notes", BasicType::Unicode, big)),
            "Notes ntext null"
        );
        let multi = TypeDetail::Text(TextFlags {
            big: false,
            multi: true,
            formatted: false,
        });
        assert_eq!(
            definition(&basic("Gloss", BasicType::MultiUnicode, multi)),
            "-- Gloss: MultiUnicode (stored separately)"
        );
    }

    #[test]
    fn test_other_basic_columns() {
        assert_eq!(
            definition(&basic(
                "Amount",
                BasicType::Numeric,
                TypeDetail::Numeric {
                    precision: 10,
                    scale: 2
                }
            )),
            "Amount decimal(10,2) not null default 0"
        );
        assert_eq!(
            definition(&basic("Data", BasicType::Binary, TypeDetail::Binary { big: true })),
            "Data image null"
        );
        assert_eq!(
            definition(&basic("When", BasicType::Time, TypeDetail::None)),
            "When datetime null"
        );
    }

    #[test]
    fn test_object_columns() {
        let mut p = basic("Owner", BasicType::Object, TypeDetail::None);
        p.ownership = Ownership::Reference;
        assert_eq!(definition(&p), "Owner int null");
        p.cardinality = Cardinality::Sequence;
        assert_eq!(
            definition(&p),
            "-- Owner: ReferenceSequence (stored separately)"
        );
    }
}
