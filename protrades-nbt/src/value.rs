//! Tagged values held by a [`CompoundTag`](crate::CompoundTag).
//!
//! Every value carries its kind by construction, so a key can never hold
//! two interpretations at once.

use crate::CompoundTag;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The kind of a [`TagValue`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    String,
    Int,
    Double,
    Byte,
    Long,
    Float,
    Short,
    ByteArray,
    IntArray,
    LongArray,
    StringList,
    StringSet,
    StringIntMap,
    Compound,
}

impl TagKind {
    /// Order in which custom tag kinds are tried when reading a host
    /// container that cannot report a value's kind directly.
    pub const LOOKUP_ORDER: [TagKind; 11] = [
        TagKind::String,
        TagKind::Int,
        TagKind::Double,
        TagKind::Byte,
        TagKind::Long,
        TagKind::Float,
        TagKind::Short,
        TagKind::ByteArray,
        TagKind::IntArray,
        TagKind::LongArray,
        TagKind::Compound,
    ];

    /// Every kind, in declaration order.
    pub const ALL: [TagKind; 14] = [
        TagKind::String,
        TagKind::Int,
        TagKind::Double,
        TagKind::Byte,
        TagKind::Long,
        TagKind::Float,
        TagKind::Short,
        TagKind::ByteArray,
        TagKind::IntArray,
        TagKind::LongArray,
        TagKind::StringList,
        TagKind::StringSet,
        TagKind::StringIntMap,
        TagKind::Compound,
    ];

    /// Short lowercase name used in logs and summaries.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TagKind::String => "string",
            TagKind::Int => "int",
            TagKind::Double => "double",
            TagKind::Byte => "byte",
            TagKind::Long => "long",
            TagKind::Float => "float",
            TagKind::Short => "short",
            TagKind::ByteArray => "byte_array",
            TagKind::IntArray => "int_array",
            TagKind::LongArray => "long_array",
            TagKind::StringList => "string_list",
            TagKind::StringSet => "string_set",
            TagKind::StringIntMap => "string_int_map",
            TagKind::Compound => "compound",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed value.
///
/// Equality is deep and kind-sensitive: `Int(1)` never equals `Long(1)`.
/// Floating-point payloads compare by bit pattern, so a value always equals
/// its own decoded copy, NaN included.
#[derive(Debug, Clone, Serialize)]
pub enum TagValue {
    String(String),
    Int(i32),
    Double(f64),
    Byte(i8),
    Long(i64),
    Float(f32),
    Short(i16),
    ByteArray(Vec<u8>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    StringList(Vec<String>),
    StringSet(BTreeSet<String>),
    StringIntMap(BTreeMap<String, i32>),
    Compound(CompoundTag),
}

impl TagValue {
    /// Returns the kind of this value.
    #[must_use]
    pub fn kind(&self) -> TagKind {
        match self {
            TagValue::String(_) => TagKind::String,
            TagValue::Int(_) => TagKind::Int,
            TagValue::Double(_) => TagKind::Double,
            TagValue::Byte(_) => TagKind::Byte,
            TagValue::Long(_) => TagKind::Long,
            TagValue::Float(_) => TagKind::Float,
            TagValue::Short(_) => TagKind::Short,
            TagValue::ByteArray(_) => TagKind::ByteArray,
            TagValue::IntArray(_) => TagKind::IntArray,
            TagValue::LongArray(_) => TagKind::LongArray,
            TagValue::StringList(_) => TagKind::StringList,
            TagValue::StringSet(_) => TagKind::StringSet,
            TagValue::StringIntMap(_) => TagKind::StringIntMap,
            TagValue::Compound(_) => TagKind::Compound,
        }
    }

    /// Returns true if this value is of the given kind.
    #[must_use]
    pub fn is_kind(&self, kind: TagKind) -> bool {
        self.kind() == kind
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            TagValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            TagValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self {
            TagValue::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            TagValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            TagValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            TagValue::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&[u8]> {
        match self {
            TagValue::ByteArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            TagValue::IntArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            TagValue::LongArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            TagValue::StringList(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            TagValue::StringSet(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string_int_map(&self) -> Option<&BTreeMap<String, i32>> {
        match self {
            TagValue::StringIntMap(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&CompoundTag> {
        match self {
            TagValue::Compound(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for TagValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TagValue::String(a), TagValue::String(b)) => a == b,
            (TagValue::Int(a), TagValue::Int(b)) => a == b,
            (TagValue::Double(a), TagValue::Double(b)) => a.to_bits() == b.to_bits(),
            (TagValue::Byte(a), TagValue::Byte(b)) => a == b,
            (TagValue::Long(a), TagValue::Long(b)) => a == b,
            (TagValue::Float(a), TagValue::Float(b)) => a.to_bits() == b.to_bits(),
            (TagValue::Short(a), TagValue::Short(b)) => a == b,
            (TagValue::ByteArray(a), TagValue::ByteArray(b)) => a == b,
            (TagValue::IntArray(a), TagValue::IntArray(b)) => a == b,
            (TagValue::LongArray(a), TagValue::LongArray(b)) => a == b,
            (TagValue::StringList(a), TagValue::StringList(b)) => a == b,
            (TagValue::StringSet(a), TagValue::StringSet(b)) => a == b,
            (TagValue::StringIntMap(a), TagValue::StringIntMap(b)) => a == b,
            (TagValue::Compound(a), TagValue::Compound(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TagValue {}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::String(s) => write!(f, "{s:?}"),
            TagValue::Int(v) => write!(f, "{v}"),
            TagValue::Double(v) => write!(f, "{v}d"),
            TagValue::Byte(v) => write!(f, "{v}b"),
            TagValue::Long(v) => write!(f, "{v}L"),
            TagValue::Float(v) => write!(f, "{v}f"),
            TagValue::Short(v) => write!(f, "{v}s"),
            TagValue::ByteArray(v) => write!(f, "byte[{}]", v.len()),
            TagValue::IntArray(v) => write!(f, "int[{}]", v.len()),
            TagValue::LongArray(v) => write!(f, "long[{}]", v.len()),
            TagValue::StringList(v) => write!(f, "list[{}]", v.len()),
            TagValue::StringSet(v) => write!(f, "set[{}]", v.len()),
            TagValue::StringIntMap(v) => write!(f, "map[{}]", v.len()),
            TagValue::Compound(v) => write!(f, "compound[{}]", v.len()),
        }
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        TagValue::String(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::String(v.to_string())
    }
}

impl From<i32> for TagValue {
    fn from(v: i32) -> Self {
        TagValue::Int(v)
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        TagValue::Double(v)
    }
}

impl From<i8> for TagValue {
    fn from(v: i8) -> Self {
        TagValue::Byte(v)
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        TagValue::Byte(i8::from(v))
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        TagValue::Long(v)
    }
}

impl From<f32> for TagValue {
    fn from(v: f32) -> Self {
        TagValue::Float(v)
    }
}

impl From<i16> for TagValue {
    fn from(v: i16) -> Self {
        TagValue::Short(v)
    }
}

impl From<Vec<u8>> for TagValue {
    fn from(v: Vec<u8>) -> Self {
        TagValue::ByteArray(v)
    }
}

impl From<Vec<i32>> for TagValue {
    fn from(v: Vec<i32>) -> Self {
        TagValue::IntArray(v)
    }
}

impl From<Vec<i64>> for TagValue {
    fn from(v: Vec<i64>) -> Self {
        TagValue::LongArray(v)
    }
}

impl From<Vec<String>> for TagValue {
    fn from(v: Vec<String>) -> Self {
        TagValue::StringList(v)
    }
}

impl From<BTreeSet<String>> for TagValue {
    fn from(v: BTreeSet<String>) -> Self {
        TagValue::StringSet(v)
    }
}

impl From<BTreeMap<String, i32>> for TagValue {
    fn from(v: BTreeMap<String, i32>) -> Self {
        TagValue::StringIntMap(v)
    }
}

impl From<CompoundTag> for TagValue {
    fn from(v: CompoundTag) -> Self {
        TagValue::Compound(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(TagValue::from("x").kind(), TagKind::String);
        assert_eq!(TagValue::from(1i32).kind(), TagKind::Int);
        assert_eq!(TagValue::from(1i64).kind(), TagKind::Long);
        assert_eq!(TagValue::from(true).kind(), TagKind::Byte);
        assert_eq!(TagValue::from(CompoundTag::new()).kind(), TagKind::Compound);
    }

    #[test]
    fn equality_is_kind_sensitive() {
        assert_ne!(TagValue::Int(1), TagValue::Long(1));
        assert_ne!(TagValue::Short(1), TagValue::Byte(1));
        assert_ne!(TagValue::Float(1.0), TagValue::Double(1.0));
    }

    #[test]
    fn nan_equals_itself() {
        assert_eq!(TagValue::Double(f64::NAN), TagValue::Double(f64::NAN));
        assert_eq!(TagValue::Float(f32::NAN), TagValue::Float(f32::NAN));
    }

    #[test]
    fn signed_zeros_are_distinct() {
        assert_ne!(TagValue::Double(0.0), TagValue::Double(-0.0));
    }

    #[test]
    fn lookup_order_excludes_collection_kinds() {
        assert!(!TagKind::LOOKUP_ORDER.contains(&TagKind::StringList));
        assert!(!TagKind::LOOKUP_ORDER.contains(&TagKind::StringSet));
        assert!(!TagKind::LOOKUP_ORDER.contains(&TagKind::StringIntMap));
        assert_eq!(TagKind::LOOKUP_ORDER[0], TagKind::String);
        assert_eq!(TagKind::LOOKUP_ORDER[10], TagKind::Compound);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(TagValue::Long(5).to_string(), "5L");
        assert_eq!(TagValue::IntArray(vec![1, 2, 3]).to_string(), "int[3]");
        assert_eq!(TagKind::StringIntMap.to_string(), "string_int_map");
    }
}
