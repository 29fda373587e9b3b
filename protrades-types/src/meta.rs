//! The metadata surface of an item: well-known fields plus custom tags.

use crate::{Error, PersistentTags, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Tooltip visibility flags an item can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemFlag {
    HideEnchants,
    HideAttributes,
    HideUnbreakable,
    HideDestroys,
    HidePlacedOn,
    HideAdditionalTooltip,
    HideDye,
    HideArmorTrim,
    HideStoredEnchants,
}

impl ItemFlag {
    pub const ALL: [ItemFlag; 9] = [
        ItemFlag::HideEnchants,
        ItemFlag::HideAttributes,
        ItemFlag::HideUnbreakable,
        ItemFlag::HideDestroys,
        ItemFlag::HidePlacedOn,
        ItemFlag::HideAdditionalTooltip,
        ItemFlag::HideDye,
        ItemFlag::HideArmorTrim,
        ItemFlag::HideStoredEnchants,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ItemFlag::HideEnchants => "HIDE_ENCHANTS",
            ItemFlag::HideAttributes => "HIDE_ATTRIBUTES",
            ItemFlag::HideUnbreakable => "HIDE_UNBREAKABLE",
            ItemFlag::HideDestroys => "HIDE_DESTROYS",
            ItemFlag::HidePlacedOn => "HIDE_PLACED_ON",
            ItemFlag::HideAdditionalTooltip => "HIDE_ADDITIONAL_TOOLTIP",
            ItemFlag::HideDye => "HIDE_DYE",
            ItemFlag::HideArmorTrim => "HIDE_ARMOR_TRIM",
            ItemFlag::HideStoredEnchants => "HIDE_STORED_ENCHANTS",
        }
    }
}

impl fmt::Display for ItemFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemFlag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ItemFlag::ALL
            .into_iter()
            .find(|flag| flag.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("unknown item flag {s:?}")))
    }
}

/// Well-known display fields and the custom tag container of one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMeta {
    display_name: Option<String>,
    lore: Option<Vec<String>>,
    enchantments: BTreeMap<String, i32>,
    flags: BTreeSet<ItemFlag>,
    custom_model_data: Option<i32>,
    unbreakable: bool,
    tags: PersistentTags,
}

impl ItemMeta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field is set and the tag container is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.lore.as_ref().is_none_or(Vec::is_empty)
            && self.enchantments.is_empty()
            && self.flags.is_empty()
            && self.custom_model_data.is_none()
            && !self.unbreakable
            && self.tags.is_empty()
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn set_display_name(&mut self, name: Option<String>) {
        self.display_name = name;
    }

    #[must_use]
    pub fn lore(&self) -> Option<&[String]> {
        self.lore.as_deref()
    }

    pub fn set_lore(&mut self, lore: Option<Vec<String>>) {
        self.lore = lore;
    }

    #[must_use]
    pub fn enchantments(&self) -> &BTreeMap<String, i32> {
        &self.enchantments
    }

    /// Adds or replaces one enchantment level.
    pub fn add_enchantment(&mut self, name: impl Into<String>, level: i32) {
        self.enchantments.insert(name.into(), level);
    }

    pub fn remove_enchantment(&mut self, name: &str) -> Option<i32> {
        self.enchantments.remove(name)
    }

    #[must_use]
    pub fn flags(&self) -> &BTreeSet<ItemFlag> {
        &self.flags
    }

    pub fn add_flag(&mut self, flag: ItemFlag) {
        self.flags.insert(flag);
    }

    pub fn remove_flag(&mut self, flag: ItemFlag) -> bool {
        self.flags.remove(&flag)
    }

    #[must_use]
    pub fn has_flag(&self, flag: ItemFlag) -> bool {
        self.flags.contains(&flag)
    }

    #[must_use]
    pub fn custom_model_data(&self) -> Option<i32> {
        self.custom_model_data
    }

    pub fn set_custom_model_data(&mut self, value: Option<i32>) {
        self.custom_model_data = value;
    }

    #[must_use]
    pub fn is_unbreakable(&self) -> bool {
        self.unbreakable
    }

    pub fn set_unbreakable(&mut self, value: bool) {
        self.unbreakable = value;
    }

    #[must_use]
    pub fn tags(&self) -> &PersistentTags {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut PersistentTags {
        &mut self.tags
    }
}
