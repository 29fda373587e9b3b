//! Moves metadata between items and compound tags.
//!
//! Extraction flattens an item's metadata into one [`CompoundTag`]: custom
//! tags under their `namespace:key` text, well-known fields under the
//! reserved keys in [`keys`](crate::keys). Application is the inverse and is
//! tolerant: entries that cannot be written are skipped and counted.

use crate::keys;
use crate::{ItemsError, Result};
use protrades_nbt::{CompoundTag, TagKind, TagValue};
use protrades_types::{
    DEFAULT_NAMESPACE, ItemFlag, ItemMeta, ItemStack, NamespacedKey, TagContainer,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Outcome of [`TagBridge::apply_tags`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Entries written to the item.
    pub applied: usize,
    /// Entries that could not be written.
    pub skipped: usize,
}

impl ApplyReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped == 0
    }
}

/// Tag extractor and applier.
#[derive(Debug, Clone)]
pub struct TagBridge {
    namespace: String,
}

impl Default for TagBridge {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl TagBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `namespace` for custom keys written without one.
    #[must_use]
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Reads every custom tag and well-known field of `item`.
    ///
    /// Returns `None` for air, for items without metadata and when nothing
    /// was found.
    #[must_use]
    pub fn extract_tags(&self, item: &ItemStack) -> Option<CompoundTag> {
        if item.is_air() {
            return None;
        }
        let meta = item.meta()?;

        let mut store = CompoundTag::new();
        self.extract_container(meta.tags(), &mut store);
        project_fields(meta, &mut store);

        if store.is_empty() { None } else { Some(store) }
    }

    /// Copies every custom tag of `container` into `store`.
    ///
    /// The container is asked for each kind in [`TagKind::LOOKUP_ORDER`] and
    /// the first kind it answers to wins.
    pub fn extract_container(&self, container: &dyn TagContainer, store: &mut CompoundTag) {
        for key in container.keys() {
            let found = TagKind::LOOKUP_ORDER
                .into_iter()
                .filter(|kind| container.has(&key, *kind))
                .find_map(|kind| container.get(&key, kind));
            match found {
                Some(value) => {
                    store.set(key.to_string(), value);
                }
                None => debug!(%key, "custom tag has no readable kind, skipped"),
            }
        }
    }

    /// Writes `store` onto `item`.
    ///
    /// Fails only when the item cannot carry metadata. Individual entries
    /// that cannot be written are logged and counted in the report.
    pub fn apply_tags(&self, item: &mut ItemStack, store: &CompoundTag) -> Result<ApplyReport> {
        let item_type = item.item_type().clone();
        let meta = item
            .meta_mut()
            .ok_or(ItemsError::NoMetaSurface(item_type))?;

        let mut report = ApplyReport::default();
        for (key, value) in store {
            let written = if keys::is_reserved(key) {
                apply_field(meta, key, value, &mut report)
            } else {
                self.apply_custom(meta, key, value)
            };
            if written {
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
        }
        Ok(report)
    }

    fn apply_custom(&self, meta: &mut ItemMeta, key: &str, value: &TagValue) -> bool {
        let parsed = match NamespacedKey::parse_with_default(key, &self.namespace) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(key, error = %e, "skipping tag with invalid key");
                return false;
            }
        };
        match meta.tags_mut().set(parsed, value.clone()) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "skipping tag the container cannot hold");
                false
            }
        }
    }

    /// Same type, and either no tag data on both sides or equal tag data.
    #[must_use]
    pub fn equivalent_for_trading(&self, a: &ItemStack, b: &ItemStack) -> bool {
        if a.item_type() != b.item_type() {
            return false;
        }
        match (self.extract_tags(a), self.extract_tags(b)) {
            (None, None) => true,
            (Some(ta), Some(tb)) => ta == tb,
            _ => false,
        }
    }

    /// Whether the item's custom tag container holds anything.
    #[must_use]
    pub fn has_custom_tags(&self, item: &ItemStack) -> bool {
        item.meta().is_some_and(|m| !m.tags().is_empty())
    }

    /// One-line description of an item and its tags, for logs.
    #[must_use]
    pub fn describe(&self, item: &ItemStack) -> String {
        match self.extract_tags(item) {
            Some(store) => format!("{item} {}", store.summary()),
            None => format!("{item} (no tags)"),
        }
    }
}

fn project_fields(meta: &ItemMeta, store: &mut CompoundTag) {
    if let Some(name) = meta.display_name() {
        store.set_string(keys::DISPLAY_NAME, name);
    }
    if let Some(lore) = meta.lore().filter(|l| !l.is_empty()) {
        store.set_string_list(keys::LORE, lore.to_vec());
    }
    if !meta.enchantments().is_empty() {
        store.set_string_int_map(keys::ENCHANTMENTS, meta.enchantments().clone());
    }
    if !meta.flags().is_empty() {
        let names: BTreeSet<String> = meta.flags().iter().map(|f| f.as_str().to_string()).collect();
        store.set_string_set(keys::ITEM_FLAGS, names);
    }
    if let Some(model) = meta.custom_model_data() {
        store.set_int(keys::CUSTOM_MODEL_DATA, model);
    }
    if meta.is_unbreakable() {
        store.set_bool(keys::UNBREAKABLE, true);
    }
}

/// Writes one reserved entry. Returns false when the value has the wrong
/// kind. Unknown flag names are counted as skipped individually.
fn apply_field(meta: &mut ItemMeta, key: &str, value: &TagValue, report: &mut ApplyReport) -> bool {
    match (key, value) {
        (keys::DISPLAY_NAME, TagValue::String(name)) => {
            meta.set_display_name(Some(name.clone()));
        }
        (keys::LORE, TagValue::StringList(lore)) => {
            if !lore.is_empty() {
                meta.set_lore(Some(lore.clone()));
            }
        }
        (keys::ENCHANTMENTS, TagValue::StringIntMap(levels)) => {
            apply_enchantments(meta, levels);
        }
        (keys::ITEM_FLAGS, TagValue::StringSet(names)) => {
            for name in names {
                match name.parse::<ItemFlag>() {
                    Ok(flag) => meta.add_flag(flag),
                    Err(_) => {
                        warn!(flag = %name, "skipping unknown item flag");
                        report.skipped += 1;
                    }
                }
            }
        }
        (keys::CUSTOM_MODEL_DATA, TagValue::Int(model)) => {
            meta.set_custom_model_data(Some(*model));
        }
        (keys::UNBREAKABLE, TagValue::Byte(flag)) => {
            if *flag != 0 {
                meta.set_unbreakable(true);
            }
        }
        _ => {
            warn!(key, kind = %value.kind(), "skipping reserved key with unexpected kind");
            return false;
        }
    }
    true
}

fn apply_enchantments(meta: &mut ItemMeta, levels: &BTreeMap<String, i32>) {
    for (name, level) in levels {
        meta.add_enchantment(name.clone(), *level);
    }
}
