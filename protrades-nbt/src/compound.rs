//! Heterogeneous key/value container used as the unit of item metadata.

use crate::{MAX_DEPTH, TagKind, TagValue};
use serde::Serialize;
use std::collections::{btree_map, BTreeMap, BTreeSet};
use std::fmt;

/// A mapping from unique string keys to typed values.
///
/// Reads are permissive: asking for a key under the wrong kind yields `None`
/// rather than an error, because tag producers are outside our control.
/// Keys iterate in sorted order.
/// Nesting is limited to [`MAX_DEPTH`] levels; deeper data is rejected when
/// decoded and by [`CompoundTag::try_set_compound`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompoundTag {
    entries: BTreeMap<String, TagValue>,
}

impl CompoundTag {
    /// Creates an empty compound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing whatever the key held before.
    ///
    /// Returns the previous value, if any.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Option<TagValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Returns the value stored under `key`, whatever its kind.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.entries.get(key)
    }

    /// Returns the kind stored under `key`.
    #[must_use]
    pub fn kind_of(&self, key: &str) -> Option<TagKind> {
        self.entries.get(key).map(TagValue::kind)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<TagValue> {
        self.entries.remove(key)
    }

    /// Returns the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, TagValue> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copies every entry of `other` into `self`. On key collisions the
    /// value from `other` wins.
    pub fn merge(&mut self, other: &CompoundTag) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Number of compound levels, counting `self`. An empty compound has
    /// depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 1;
        let mut pending: Vec<(&CompoundTag, usize)> = vec![(self, 1)];
        while let Some((tag, level)) = pending.pop() {
            deepest = deepest.max(level);
            for value in tag.entries.values() {
                if let TagValue::Compound(child) = value {
                    pending.push((child, level + 1));
                }
            }
        }
        deepest
    }

    /// One-line description listing each key with its kind, for logs.
    #[must_use]
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(key, value)| format!("{key}({})", value.kind()))
            .collect();
        format!("TagData[{} entries: {}]", self.entries.len(), parts.join(", "))
    }

    // ── Typed setters ────────────────────────────────────────────

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), TagValue::String(value.into()));
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i32) {
        self.entries.insert(key.into(), TagValue::Int(value));
    }

    pub fn set_double(&mut self, key: impl Into<String>, value: f64) {
        self.entries.insert(key.into(), TagValue::Double(value));
    }

    pub fn set_byte(&mut self, key: impl Into<String>, value: i8) {
        self.entries.insert(key.into(), TagValue::Byte(value));
    }

    /// Stores a boolean as a byte (`1` or `0`).
    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.entries.insert(key.into(), TagValue::from(value));
    }

    pub fn set_long(&mut self, key: impl Into<String>, value: i64) {
        self.entries.insert(key.into(), TagValue::Long(value));
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f32) {
        self.entries.insert(key.into(), TagValue::Float(value));
    }

    pub fn set_short(&mut self, key: impl Into<String>, value: i16) {
        self.entries.insert(key.into(), TagValue::Short(value));
    }

    pub fn set_byte_array(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.entries.insert(key.into(), TagValue::ByteArray(value));
    }

    pub fn set_int_array(&mut self, key: impl Into<String>, value: Vec<i32>) {
        self.entries.insert(key.into(), TagValue::IntArray(value));
    }

    pub fn set_long_array(&mut self, key: impl Into<String>, value: Vec<i64>) {
        self.entries.insert(key.into(), TagValue::LongArray(value));
    }

    pub fn set_string_list(&mut self, key: impl Into<String>, value: Vec<String>) {
        self.entries.insert(key.into(), TagValue::StringList(value));
    }

    pub fn set_string_set(&mut self, key: impl Into<String>, value: BTreeSet<String>) {
        self.entries.insert(key.into(), TagValue::StringSet(value));
    }

    pub fn set_string_int_map(&mut self, key: impl Into<String>, value: BTreeMap<String, i32>) {
        self.entries.insert(key.into(), TagValue::StringIntMap(value));
    }

    pub fn set_compound(&mut self, key: impl Into<String>, value: CompoundTag) {
        self.entries.insert(key.into(), TagValue::Compound(value));
    }

    /// Like [`set_compound`](Self::set_compound), but refuses a child that
    /// would push this compound past [`MAX_DEPTH`]. The child is handed back
    /// on refusal.
    pub fn try_set_compound(
        &mut self,
        key: impl Into<String>,
        value: CompoundTag,
    ) -> Result<(), CompoundTag> {
        if value.depth() >= MAX_DEPTH {
            return Err(value);
        }
        self.entries.insert(key.into(), TagValue::Compound(value));
        Ok(())
    }

    // ── Typed getters ────────────────────────────────────────────

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(TagValue::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(TagValue::as_int)
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(TagValue::as_double)
    }

    pub fn get_byte(&self, key: &str) -> Option<i8> {
        self.get(key).and_then(TagValue::as_byte)
    }

    /// Reads a byte as a boolean (any non-zero byte is `true`).
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_byte(key).map(|b| b != 0)
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(TagValue::as_long)
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(TagValue::as_float)
    }

    pub fn get_short(&self, key: &str) -> Option<i16> {
        self.get(key).and_then(TagValue::as_short)
    }

    pub fn get_byte_array(&self, key: &str) -> Option<&[u8]> {
        self.get(key).and_then(TagValue::as_byte_array)
    }

    pub fn get_int_array(&self, key: &str) -> Option<&[i32]> {
        self.get(key).and_then(TagValue::as_int_array)
    }

    pub fn get_long_array(&self, key: &str) -> Option<&[i64]> {
        self.get(key).and_then(TagValue::as_long_array)
    }

    pub fn get_string_list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(TagValue::as_string_list)
    }

    pub fn get_string_set(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.get(key).and_then(TagValue::as_string_set)
    }

    pub fn get_string_int_map(&self, key: &str) -> Option<&BTreeMap<String, i32>> {
        self.get(key).and_then(TagValue::as_string_int_map)
    }

    pub fn get_compound(&self, key: &str) -> Option<&CompoundTag> {
        self.get(key).and_then(TagValue::as_compound)
    }
}

impl fmt::Display for CompoundTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<TagValue>> FromIterator<(K, V)> for CompoundTag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<TagValue>> Extend<(K, V)> for CompoundTag {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.entries.insert(k.into(), v.into());
        }
    }
}

impl IntoIterator for CompoundTag {
    type Item = (String, TagValue);
    type IntoIter = btree_map::IntoIter<String, TagValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a CompoundTag {
    type Item = (&'a String, &'a TagValue);
    type IntoIter = btree_map::Iter<'a, String, TagValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
