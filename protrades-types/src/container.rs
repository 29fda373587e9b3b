//! Namespaced custom tag storage attached to an item's metadata.

use crate::{Error, Result};
use protrades_nbt::{CompoundTag, MAX_DEPTH, TagKind, TagValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Namespace given to keys written without one.
pub const DEFAULT_NAMESPACE: &str = "protrades";

/// A `namespace:key` pair identifying one custom tag.
///
/// Namespaces allow `[a-z0-9._-]`; keys additionally allow `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamespacedKey {
    namespace: String,
    key: String,
}

fn valid_namespace(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b"._-".contains(&b))
}

fn valid_key(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b"._-/".contains(&b))
}

impl NamespacedKey {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let key = key.into();
        if !valid_namespace(&namespace) {
            return Err(Error::InvalidKey(format!("bad namespace {namespace:?}")));
        }
        if !valid_key(&key) {
            return Err(Error::InvalidKey(format!("bad key {key:?}")));
        }
        Ok(Self { namespace, key })
    }

    /// Parses `namespace:key`. Text without a colon, or with an empty
    /// namespace (`:key`), lands in `default_namespace`.
    pub fn parse_with_default(text: &str, default_namespace: &str) -> Result<Self> {
        match text.split_once(':') {
            Some(("", key)) => Self::new(default_namespace, key),
            Some((namespace, key)) => Self::new(namespace, key),
            None => Self::new(default_namespace, text),
        }
    }

    /// Parses `namespace:key`, defaulting to [`DEFAULT_NAMESPACE`].
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_default(text, DEFAULT_NAMESPACE)
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for NamespacedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.key)
    }
}

impl FromStr for NamespacedKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NamespacedKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<NamespacedKey> for String {
    fn from(key: NamespacedKey) -> Self {
        key.to_string()
    }
}

/// Host-side custom tag container.
///
/// Hosts may not be able to report the kind of a stored value directly;
/// callers then query [`has`](TagContainer::has) kind by kind.
pub trait TagContainer {
    /// Every key currently stored.
    fn keys(&self) -> Vec<NamespacedKey>;

    /// Whether `key` holds a value readable as `kind`.
    fn has(&self, key: &NamespacedKey, kind: TagKind) -> bool;

    /// Reads `key` as `kind`.
    fn get(&self, key: &NamespacedKey, kind: TagKind) -> Option<TagValue>;

    /// Stores a value, replacing any previous one.
    fn set(&mut self, key: NamespacedKey, value: TagValue) -> Result<()>;

    fn remove(&mut self, key: &NamespacedKey) -> Option<TagValue>;
}

/// The standard [`TagContainer`]: an exact-kind map.
///
/// Holds scalar, array and nested compound values. String collections have
/// no native representation here and are refused, including inside nested
/// compounds. Compounds deeper than [`MAX_DEPTH`] are refused too. The same
/// rules apply when a container is deserialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<NamespacedKey, TagValue>",
    into = "BTreeMap<NamespacedKey, TagValue>"
)]
pub struct PersistentTags {
    entries: BTreeMap<NamespacedKey, TagValue>,
}

impl PersistentTags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NamespacedKey, &TagValue)> {
        self.entries.iter()
    }

    /// Whether a value of `kind` can be stored.
    #[must_use]
    pub fn supports(kind: TagKind) -> bool {
        !matches!(
            kind,
            TagKind::StringList | TagKind::StringSet | TagKind::StringIntMap
        )
    }

    fn check(value: &TagValue) -> Result<()> {
        if let TagValue::Compound(inner) = value {
            let depth = inner.depth();
            if depth > MAX_DEPTH {
                return Err(Error::Validation(format!(
                    "compound nesting of {depth} exceeds {MAX_DEPTH} levels"
                )));
            }
        }
        Self::check_kinds(value)
    }

    fn check_kinds(value: &TagValue) -> Result<()> {
        if !Self::supports(value.kind()) {
            return Err(Error::UnsupportedKind(value.kind()));
        }
        if let TagValue::Compound(inner) = value {
            check_compound(inner)?;
        }
        Ok(())
    }
}

fn check_compound(tag: &CompoundTag) -> Result<()> {
    for (_, value) in tag {
        PersistentTags::check_kinds(value)?;
    }
    Ok(())
}

impl TryFrom<BTreeMap<NamespacedKey, TagValue>> for PersistentTags {
    type Error = Error;

    fn try_from(entries: BTreeMap<NamespacedKey, TagValue>) -> Result<Self> {
        for value in entries.values() {
            Self::check(value)?;
        }
        Ok(Self { entries })
    }
}

impl From<PersistentTags> for BTreeMap<NamespacedKey, TagValue> {
    fn from(tags: PersistentTags) -> Self {
        tags.entries
    }
}

impl TagContainer for PersistentTags {
    fn keys(&self) -> Vec<NamespacedKey> {
        self.entries.keys().cloned().collect()
    }

    fn has(&self, key: &NamespacedKey, kind: TagKind) -> bool {
        self.entries.get(key).is_some_and(|v| v.is_kind(kind))
    }

    fn get(&self, key: &NamespacedKey, kind: TagKind) -> Option<TagValue> {
        self.entries.get(key).filter(|v| v.is_kind(kind)).cloned()
    }

    fn set(&mut self, key: NamespacedKey, value: TagValue) -> Result<()> {
        Self::check(&value)?;
        self.entries.insert(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &NamespacedKey) -> Option<TagValue> {
        self.entries.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults_namespace() {
        let key = NamespacedKey::parse("power").unwrap();
        assert_eq!(key.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(key.key(), "power");

        let key = NamespacedKey::parse(":power").unwrap();
        assert_eq!(key.to_string(), "protrades:power");
    }

    #[test]
    fn parse_splits_on_first_colon() {
        let key = NamespacedKey::parse("proitems:custom_item_id").unwrap();
        assert_eq!(key.namespace(), "proitems");
        assert_eq!(key.key(), "custom_item_id");
        assert!(NamespacedKey::parse("a:b:c").is_err());
    }

    #[test]
    fn rejects_bad_characters() {
        assert!(NamespacedKey::parse("Upper:key").is_err());
        assert!(NamespacedKey::parse("ns:with space").is_err());
        assert!(NamespacedKey::parse("ns/slash:key").is_err());
        assert!(NamespacedKey::parse("ns:path/ok").is_ok());
        assert!(NamespacedKey::parse("ns:").is_err());
    }

    #[test]
    fn container_refuses_string_collections() {
        let mut tags = PersistentTags::new();
        let key = NamespacedKey::parse("lore_copy").unwrap();
        let err = tags
            .set(key.clone(), TagValue::StringList(vec!["x".into()]))
            .unwrap_err();
        assert_eq!(err, Error::UnsupportedKind(TagKind::StringList));

        let mut nested = CompoundTag::new();
        nested.set_string_set("s", Default::default());
        assert!(tags.set(key, TagValue::Compound(nested)).is_err());
        assert!(tags.is_empty());
    }

    fn chain(depth: usize) -> CompoundTag {
        let mut tag = CompoundTag::new();
        for _ in 1..depth {
            let mut parent = CompoundTag::new();
            parent.set_compound("child", tag);
            tag = parent;
        }
        tag
    }

    #[test]
    fn container_refuses_deep_compounds() {
        let mut tags = PersistentTags::new();
        let key = NamespacedKey::parse("nested").unwrap();
        tags.set(key.clone(), TagValue::Compound(chain(MAX_DEPTH)))
            .unwrap();

        let err = tags
            .set(key.clone(), TagValue::Compound(chain(MAX_DEPTH + 1)))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
        assert_eq!(
            tags.get(&key, TagKind::Compound),
            Some(TagValue::Compound(chain(MAX_DEPTH)))
        );
    }

    #[test]
    fn deserialize_applies_the_same_checks() {
        let ok: PersistentTags =
            serde_json::from_str(r#"{"protrades:power":{"Int":7}}"#).unwrap();
        assert_eq!(ok.len(), 1);

        let refused = serde_json::from_str::<PersistentTags>(
            r#"{"protrades:lore":{"StringList":["x"]}}"#,
        );
        assert!(refused.is_err());

        let nested = serde_json::from_str::<PersistentTags>(
            r#"{"protrades:n":{"Compound":{"s":{"StringSet":[]}}}}"#,
        );
        assert!(nested.is_err());
    }

    #[test]
    fn has_is_exact_kind() {
        let mut tags = PersistentTags::new();
        let key = NamespacedKey::parse("power").unwrap();
        tags.set(key.clone(), TagValue::Int(7)).unwrap();
        assert!(tags.has(&key, TagKind::Int));
        assert!(!tags.has(&key, TagKind::Long));
        assert_eq!(tags.get(&key, TagKind::Int), Some(TagValue::Int(7)));
        assert_eq!(tags.get(&key, TagKind::String), None);
    }
}
