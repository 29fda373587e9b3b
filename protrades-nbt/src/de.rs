//! Depth-limited deserialization of [`CompoundTag`] and [`TagValue`].
//!
//! Nested compounds are read through seeds that carry the current depth, so
//! a hostile payload fails with an error at [`MAX_DEPTH`] instead of
//! exhausting the stack.

use crate::{CompoundTag, MAX_DEPTH, TagValue};
use serde::de::{self, DeserializeSeed, EnumAccess, MapAccess, VariantAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

const VARIANTS: &[&str] = &[
    "String",
    "Int",
    "Double",
    "Byte",
    "Long",
    "Float",
    "Short",
    "ByteArray",
    "IntArray",
    "LongArray",
    "StringList",
    "StringSet",
    "StringIntMap",
    "Compound",
];

#[derive(Deserialize)]
#[serde(variant_identifier)]
enum Variant {
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

/// Reads one compound at `depth` (the outermost compound is depth 1).
#[derive(Clone, Copy)]
struct CompoundSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for CompoundSeed {
    type Value = CompoundTag;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<CompoundTag, D::Error> {
        if self.depth > MAX_DEPTH {
            return Err(de::Error::custom(format_args!(
                "compound nesting exceeds {MAX_DEPTH} levels"
            )));
        }
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for CompoundSeed {
    type Value = CompoundTag;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a compound tag")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<CompoundTag, A::Error> {
        let mut tag = CompoundTag::new();
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(ValueSeed {
                parent_depth: self.depth,
            })?;
            tag.set(key, value);
        }
        Ok(tag)
    }
}

/// Reads one value held by a compound at `parent_depth` (0 for a value
/// stored outside any compound).
#[derive(Clone, Copy)]
struct ValueSeed {
    parent_depth: usize,
}

impl<'de> DeserializeSeed<'de> for ValueSeed {
    type Value = TagValue;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<TagValue, D::Error> {
        deserializer.deserialize_enum("TagValue", VARIANTS, self)
    }
}

impl<'de> Visitor<'de> for ValueSeed {
    type Value = TagValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a tag value")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<TagValue, A::Error> {
        let (variant, access) = data.variant::<Variant>()?;
        Ok(match variant {
            Variant::String => TagValue::String(access.newtype_variant()?),
            Variant::Int => TagValue::Int(access.newtype_variant()?),
            Variant::Double => TagValue::Double(access.newtype_variant()?),
            Variant::Byte => TagValue::Byte(access.newtype_variant()?),
            Variant::Long => TagValue::Long(access.newtype_variant()?),
            Variant::Float => TagValue::Float(access.newtype_variant()?),
            Variant::Short => TagValue::Short(access.newtype_variant()?),
            Variant::ByteArray => TagValue::ByteArray(access.newtype_variant()?),
            Variant::IntArray => TagValue::IntArray(access.newtype_variant()?),
            Variant::LongArray => TagValue::LongArray(access.newtype_variant()?),
            Variant::StringList => TagValue::StringList(access.newtype_variant()?),
            Variant::StringSet => TagValue::StringSet(access.newtype_variant()?),
            Variant::StringIntMap => TagValue::StringIntMap(access.newtype_variant()?),
            Variant::Compound => TagValue::Compound(access.newtype_variant_seed(CompoundSeed {
                depth: self.parent_depth + 1,
            })?),
        })
    }
}

impl<'de> Deserialize<'de> for CompoundTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        CompoundSeed { depth: 1 }.deserialize(deserializer)
    }
}

impl<'de> Deserialize<'de> for TagValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ValueSeed { parent_depth: 0 }.deserialize(deserializer)
    }
}
