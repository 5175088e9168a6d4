//! In-memory object model built from a module definition

use std::fmt;

/// Lower bound of the Integer type
pub const INTEGER_MIN: i64 = i32::MIN as i64;
/// Upper bound of the Integer type
pub const INTEGER_MAX: i64 = i32::MAX as i64;

/// A versioned group of classes sharing one slice of the class id space
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub id: i64,
    pub version: i64,
    pub back_version: i64,
    pub classes: Vec<Class>,
}

impl Module {
    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub id: i64,
    /// Base class name; never resolved to an id here
    pub base: String,
    pub abbr: String,
    pub is_abstract: bool,
    pub properties: Vec<Property>,
}

impl Class {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    None,
    Owning,
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Atomic,
    Collection,
    Sequence,
}

impl Cardinality {
    /// Parse the value of a `card` attribute
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "atomic" => Some(Cardinality::Atomic),
            "col" => Some(Cardinality::Collection),
            "seq" => Some(Cardinality::Sequence),
            _ => None,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Cardinality::Atomic => "Atom",
            Cardinality::Collection => "Collection",
            Cardinality::Sequence => "Sequence",
        }
    }
}

/// Storage type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicType {
    Integer,
    Numeric,
    Boolean,
    Time,
    GenDate,
    Binary,
    Float,
    String,
    MultiString,
    Unicode,
    MultiUnicode,
    Guid,
    Image,
    /// Owning or reference property
    Object,
}

impl BasicType {
    pub fn name(&self) -> &'static str {
        match self {
            BasicType::Integer => "Integer",
            BasicType::Numeric => "Numeric",
            BasicType::Boolean => "Boolean",
            BasicType::Time => "Time",
            BasicType::GenDate => "GenDate",
            BasicType::Binary => "Binary",
            BasicType::Float => "Float",
            BasicType::String => "String",
            BasicType::MultiString => "MultiString",
            BasicType::Unicode => "Unicode",
            BasicType::MultiUnicode => "MultiUnicode",
            BasicType::Guid => "Guid",
            BasicType::Image => "Image",
            BasicType::Object => "Object",
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerBounds {
    pub min: i64,
    pub max: i64,
    pub default: i64,
    pub bits: Option<u32>,
}

impl Default for IntegerBounds {
    fn default() -> Self {
        Self {
            min: INTEGER_MIN,
            max: INTEGER_MAX,
            default: 0,
            bits: None,
        }
    }
}

impl IntegerBounds {
    /// Unsigned range of a bit field
    pub fn with_bits(bits: u32) -> Self {
        Self {
            min: 0,
            max: (1i64 << bits) - 1,
            default: 0,
            bits: Some(bits),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextFlags {
    pub big: bool,
    pub multi: bool,
    pub formatted: bool,
}

/// Fields that only exist for some basic types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDetail {
    None,
    Integer(IntegerBounds),
    Numeric { precision: u32, scale: u32 },
    Binary { big: bool },
    Text(TextFlags),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub id: i64,
    pub ownership: Ownership,
    pub cardinality: Cardinality,
    pub basic: BasicType,
    /// Type name as written in the `sig` attribute
    pub signature: String,
    pub prefix: String,
    pub detail: TypeDetail,
}

impl Property {
    pub fn is_object(&self) -> bool {
        self.ownership != Ownership::None
    }

    pub fn is_owning(&self) -> bool {
        self.ownership == Ownership::Owning
    }

    pub fn is_atomic(&self) -> bool {
        self.is_object() && self.cardinality == Cardinality::Atomic
    }

    pub fn is_collection(&self) -> bool {
        self.is_object() && self.cardinality == Cardinality::Collection
    }

    pub fn is_sequence(&self) -> bool {
        self.is_object() && self.cardinality == Cardinality::Sequence
    }

    /// Reference collection or reference sequence
    pub fn is_ref_group(&self) -> bool {
        self.ownership == Ownership::Reference && self.cardinality != Cardinality::Atomic
    }

    pub fn is_ref_atom(&self) -> bool {
        self.ownership == Ownership::Reference && self.cardinality == Cardinality::Atomic
    }

    fn text_flags(&self) -> TextFlags {
        match self.detail {
            TypeDetail::Text(flags) => flags,
            _ => TextFlags::default(),
        }
    }

    pub fn is_multi(&self) -> bool {
        self.text_flags().multi
    }

    pub fn is_big_string(&self) -> bool {
        self.text_flags().big
    }

    pub fn is_formatted(&self) -> bool {
        self.text_flags().formatted
    }

    pub fn is_big_binary(&self) -> bool {
        matches!(self.detail, TypeDetail::Binary { big: true })
    }

    /// Stored as a column of the class's own table
    pub fn is_embedded(&self) -> bool {
        !(self.is_owning() || self.is_collection() || self.is_sequence() || self.is_multi())
    }

    pub fn integer_bounds(&self) -> Option<&IntegerBounds> {
        match &self.detail {
            TypeDetail::Integer(bounds) => Some(bounds),
            _ => None,
        }
    }

    /// `OwningAtom`, `ReferenceSequence`, ... for object properties, else the
    /// basic type name
    pub fn field_type(&self) -> String {
        match self.ownership {
            Ownership::None => self.basic.name().to_string(),
            Ownership::Owning => format!("Owning{}", self.cardinality.tag()),
            Ownership::Reference => format!("Reference{}", self.cardinality.tag()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(ownership: Ownership, cardinality: Cardinality) -> Property {
        Property {
            name: "Items".to_string(),
            id: 1,
            ownership,
            cardinality,
            basic: BasicType::Object,
            signature: "CmObject".to_string(),
            prefix: "f".to_string(),
            detail: TypeDetail::None,
        }
    }

    #[test]
    fn test_field_type_tags() {
        assert_eq!(
            object(Ownership::Owning, Cardinality::Atomic).field_type(),
            "OwningAtom"
        );
        assert_eq!(
            object(Ownership::Reference, Cardinality::Sequence).field_type(),
            "ReferenceSequence"
        );
        let mut basic = object(Ownership::None, Cardinality::Atomic);
        basic.basic = BasicType::Unicode;
        assert_eq!(basic.field_type(), "Unicode");
    }

    #[test]
    fn test_embedded_predicate() {
        assert!(!object(Ownership::Owning, Cardinality::Atomic).is_embedded());
        assert!(!object(Ownership::Reference, Cardinality::Collection).is_embedded());
        assert!(object(Ownership::Reference, Cardinality::Atomic).is_embedded());

        let mut multi = object(Ownership::None, Cardinality::Atomic);
        multi.detail = TypeDetail::Text(TextFlags {
            big: false,
            multi: true,
            formatted: true,
        });
        assert!(!multi.is_embedded());
        assert!(multi.is_multi());
        assert!(multi.is_formatted());
    }

    #[test]
    fn test_ref_group_and_atom() {
        assert!(object(Ownership::Reference, Cardinality::Collection).is_ref_group());
        assert!(object(Ownership::Reference, Cardinality::Atomic).is_ref_atom());
        assert!(!object(Ownership::Owning, Cardinality::Sequence).is_ref_group());
    }

    #[test]
    fn test_bit_bounds() {
        let bounds = IntegerBounds::with_bits(8);
        assert_eq!((bounds.min, bounds.max, bounds.default), (0, 255, 0));
        assert_eq!(IntegerBounds::with_bits(32).max, 4_294_967_295);
    }

    #[test]
    fn test_cardinality_from_attr() {
        assert_eq!(Cardinality::from_attr("col"), Some(Cardinality::Collection));
        assert_eq!(Cardinality::from_attr("collection"), None);
    }
}
