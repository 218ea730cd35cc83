use std::collections::BTreeMap;

/// A raw property tree, keyed by field identifier.
///
/// Sorted by key so that every walk over the tree is deterministic.
pub type PropertyTree = BTreeMap<String, RawProperty>;

/// One untyped value from a metadata property tree.
///
/// Sources produce these without knowing how a field will be displayed;
/// the formatter decides that from the variant and the field identity.
#[derive(Debug, Clone, PartialEq)]
pub enum RawProperty {
    Float(f64),
    Integer(i64),
    Text(String),
    Texts(Vec<String>),
    Numbers(Vec<f64>),
    Integers(Vec<i64>),
    Bytes(Vec<u8>),
    Map(PropertyTree),
    /// Anything the source could not classify, already rendered to text.
    Opaque(String),
}

impl RawProperty {
    /// Numeric view of a scalar value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawProperty::Float(f) => Some(*f),
            RawProperty::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer view of a scalar value. Floats qualify only when integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawProperty::Integer(i) => Some(*i),
            RawProperty::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawProperty::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PropertyTree> {
        match self {
            RawProperty::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, RawProperty::Map(_))
    }
}

impl From<f64> for RawProperty {
    fn from(v: f64) -> Self {
        RawProperty::Float(v)
    }
}

impl From<i64> for RawProperty {
    fn from(v: i64) -> Self {
        RawProperty::Integer(v)
    }
}

impl From<u32> for RawProperty {
    fn from(v: u32) -> Self {
        RawProperty::Integer(i64::from(v))
    }
}

impl From<&str> for RawProperty {
    fn from(v: &str) -> Self {
        RawProperty::Text(v.to_string())
    }
}

impl From<String> for RawProperty {
    fn from(v: String) -> Self {
        RawProperty::Text(v)
    }
}

impl From<Vec<f64>> for RawProperty {
    fn from(v: Vec<f64>) -> Self {
        RawProperty::Numbers(v)
    }
}

impl From<Vec<u8>> for RawProperty {
    fn from(v: Vec<u8>) -> Self {
        RawProperty::Bytes(v)
    }
}

impl From<PropertyTree> for RawProperty {
    fn from(v: PropertyTree) -> Self {
        RawProperty::Map(v)
    }
}
