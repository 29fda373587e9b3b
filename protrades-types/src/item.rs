//! Items as plain values.

use crate::{Error, ItemMeta, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const MINECRAFT: &str = "minecraft";

fn id_part(s: &str, extra: &[u8]) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || extra.contains(&b))
}

/// Namespaced item type id such as `minecraft:diamond_sword`.
///
/// Input is trimmed and lowercased; a bare name is placed in the
/// `minecraft` namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemType(String);

impl ItemType {
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim().to_ascii_lowercase();
        let (namespace, name) = match id.split_once(':') {
            Some((ns, name)) => (ns, name),
            None => (MINECRAFT, id.as_str()),
        };
        if !id_part(namespace, b".-") || !id_part(name, b"./-") {
            return Err(Error::Validation(format!("invalid item type {id:?}")));
        }
        Ok(Self(format!("{namespace}:{name}")))
    }

    /// The empty-slot type.
    #[must_use]
    pub fn air() -> Self {
        Self(format!("{MINECRAFT}:air"))
    }

    /// True for the air variants, which have no metadata surface.
    #[must_use]
    pub fn is_air(&self) -> bool {
        matches!(
            self.0.as_str(),
            "minecraft:air" | "minecraft:cave_air" | "minecraft:void_air"
        )
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the namespace, e.g. `diamond` for `minecraft:diamond`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ItemType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<ItemType> for String {
    fn from(t: ItemType) -> Self {
        t.0
    }
}

/// How much a clone can be trusted to match its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneConfidence {
    /// Native copy with tags re-applied, verified equal.
    Verified,
    /// Rebuilt from a blank item, verified equal.
    Reconstructed,
    /// Both strategies failed verification; best-effort copy.
    Unverified,
}

/// Diagnostic marker stamped on stored clones.
///
/// Lives beside the item's tags and is never part of equivalence checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneIntegrityRecord {
    /// Time-ordered id of the clone operation.
    pub id: Uuid,
    pub cloned_at: DateTime<Utc>,
    pub confidence: CloneConfidence,
}

impl CloneIntegrityRecord {
    #[must_use]
    pub fn now(confidence: CloneConfidence) -> Self {
        Self {
            id: Uuid::now_v7(),
            cloned_at: Utc::now(),
            confidence,
        }
    }
}

/// A stack of one item type with optional metadata.
///
/// Air never carries metadata; deserialization enforces this as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawItemStack")]
pub struct ItemStack {
    item_type: ItemType,
    quantity: u32,
    meta: Option<ItemMeta>,
    clone_record: Option<CloneIntegrityRecord>,
}

/// Wire shape of [`ItemStack`], checked on the way in.
#[derive(Deserialize)]
struct RawItemStack {
    item_type: ItemType,
    quantity: u32,
    meta: Option<ItemMeta>,
    clone_record: Option<CloneIntegrityRecord>,
}

impl TryFrom<RawItemStack> for ItemStack {
    type Error = Error;

    fn try_from(raw: RawItemStack) -> Result<Self> {
        let mut item = ItemStack::new(raw.item_type, raw.quantity);
        item.set_meta(raw.meta)?;
        item.clone_record = raw.clone_record;
        Ok(item)
    }
}

impl ItemStack {
    /// A stack without metadata.
    #[must_use]
    pub fn new(item_type: ItemType, quantity: u32) -> Self {
        Self {
            item_type,
            quantity,
            meta: None,
            clone_record: None,
        }
    }

    /// Convenience constructor parsing the type id.
    pub fn of(item_type: &str, quantity: u32) -> Result<Self> {
        Ok(Self::new(ItemType::new(item_type)?, quantity))
    }

    /// An empty slot.
    #[must_use]
    pub fn air() -> Self {
        Self::new(ItemType::air(), 0)
    }

    #[must_use]
    pub fn item_type(&self) -> &ItemType {
        &self.item_type
    }

    #[must_use]
    pub fn is_air(&self) -> bool {
        self.item_type.is_air()
    }

    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Whether the item carries non-empty metadata.
    #[must_use]
    pub fn has_meta(&self) -> bool {
        self.meta.as_ref().is_some_and(|m| !m.is_empty())
    }

    #[must_use]
    pub fn meta(&self) -> Option<&ItemMeta> {
        self.meta.as_ref()
    }

    /// Mutable metadata, created on first use. `None` for air.
    pub fn meta_mut(&mut self) -> Option<&mut ItemMeta> {
        if self.is_air() {
            return None;
        }
        Some(self.meta.get_or_insert_with(ItemMeta::default))
    }

    /// Replaces the metadata wholesale.
    pub fn set_meta(&mut self, meta: Option<ItemMeta>) -> Result<()> {
        if self.is_air() && meta.is_some() {
            return Err(Error::Validation("air cannot carry metadata".into()));
        }
        self.meta = meta;
        Ok(())
    }

    pub fn with_meta(mut self, meta: ItemMeta) -> Result<Self> {
        self.set_meta(Some(meta))?;
        Ok(self)
    }

    #[must_use]
    pub fn clone_record(&self) -> Option<&CloneIntegrityRecord> {
        self.clone_record.as_ref()
    }

    pub fn set_clone_record(&mut self, record: Option<CloneIntegrityRecord>) {
        self.clone_record = record;
    }
}

impl fmt::Display for ItemStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.item_type, self.quantity)
    }
}
