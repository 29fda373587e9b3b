//! Verified item cloning.
//!
//! A clone is built in tiers. The host's native copy is taken first and the
//! source's extracted tags are re-applied onto it. If that does not verify
//! against the source, the item is rebuilt from a blank of the same type. If
//! that fails too, the native copy is returned as-is and marked unverified.

use crate::TagBridge;
use protrades_types::{CloneConfidence, CloneIntegrityRecord, ItemStack, ItemType};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// The host item system's own copy primitives.
pub trait ItemHost: Send + Sync {
    /// The host's native copy of an item.
    fn native_copy(&self, item: &ItemStack) -> ItemStack {
        item.clone()
    }

    /// A fresh item of `item_type` with no metadata and zero quantity.
    fn blank(&self, item_type: &ItemType) -> ItemStack {
        ItemStack::new(item_type.clone(), 0)
    }
}

/// Plain value copies.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardHost;

impl ItemHost for StandardHost {}

/// What a clone is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClonePurpose {
    /// Held by a trade definition.
    #[default]
    Trade,
    /// Written to long-term storage.
    Storage,
    /// Shown to a player; never stamped with a clone record.
    Display,
}

impl ClonePurpose {
    fn stamps_record(self) -> bool {
        !matches!(self, ClonePurpose::Display)
    }
}

/// A cloned item and how far it can be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneOutcome {
    pub item: ItemStack,
    pub confidence: CloneConfidence,
}

impl CloneOutcome {
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.confidence == CloneConfidence::Verified
    }
}

/// Counters per confidence tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloneStats {
    pub verified: u64,
    pub reconstructed: u64,
    pub unverified: u64,
}

impl CloneStats {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.verified + self.reconstructed + self.unverified
    }
}

#[derive(Debug, Default)]
struct Counters {
    verified: AtomicU64,
    reconstructed: AtomicU64,
    unverified: AtomicU64,
}

impl Counters {
    fn record(&self, confidence: CloneConfidence) {
        let counter = match confidence {
            CloneConfidence::Verified => &self.verified,
            CloneConfidence::Reconstructed => &self.reconstructed,
            CloneConfidence::Unverified => &self.unverified,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Produces verified clones of items.
pub struct CloningEngine {
    bridge: TagBridge,
    host: Box<dyn ItemHost>,
    counters: Counters,
}

impl Default for CloningEngine {
    fn default() -> Self {
        Self::new(TagBridge::new())
    }
}

impl std::fmt::Debug for CloningEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloningEngine")
            .field("bridge", &self.bridge)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl CloningEngine {
    /// An engine over plain value copies.
    #[must_use]
    pub fn new(bridge: TagBridge) -> Self {
        Self::with_host(bridge, StandardHost)
    }

    /// An engine over a custom host.
    #[must_use]
    pub fn with_host(bridge: TagBridge, host: impl ItemHost + 'static) -> Self {
        Self {
            bridge,
            host: Box::new(host),
            counters: Counters::default(),
        }
    }

    #[must_use]
    pub fn bridge(&self) -> &TagBridge {
        &self.bridge
    }

    /// Clones `item`, verifying the copy against the source.
    pub fn clone_item(&self, item: &ItemStack, purpose: ClonePurpose) -> CloneOutcome {
        if item.is_air() {
            return self.finish(ItemStack::air(), CloneConfidence::Verified, purpose);
        }

        let store = self.bridge.extract_tags(item);
        let native = self.host.native_copy(item);

        let mut copy = native.clone();
        if self.reapply(&mut copy, store.as_ref()) && self.verify_integrity(item, &copy) {
            return self.finish(copy, CloneConfidence::Verified, purpose);
        }
        debug!(item = %self.bridge.describe(item), "native copy failed verification, rebuilding");

        let mut rebuilt = self.host.blank(item.item_type());
        rebuilt.set_quantity(item.quantity());
        if self.reapply(&mut rebuilt, store.as_ref()) && self.verify_integrity(item, &rebuilt) {
            return self.finish(rebuilt, CloneConfidence::Reconstructed, purpose);
        }

        warn!(
            item = %self.bridge.describe(item),
            "clone could not be verified, using native copy"
        );
        self.finish(native, CloneConfidence::Unverified, purpose)
    }

    /// Clones `item` with quantity `max(1, quantity)`.
    pub fn clone_with_quantity(
        &self,
        item: &ItemStack,
        quantity: u32,
        purpose: ClonePurpose,
    ) -> CloneOutcome {
        let mut outcome = self.clone_item(item, purpose);
        if !outcome.item.is_air() {
            outcome.item.set_quantity(quantity.max(1));
        }
        outcome
    }

    /// Clones each item, preserving order and length.
    pub fn clone_all(&self, items: &[ItemStack], purpose: ClonePurpose) -> Vec<CloneOutcome> {
        items.iter().map(|item| self.clone_item(item, purpose)).collect()
    }

    /// Fixed-size variant of [`clone_all`](Self::clone_all).
    pub fn clone_array<const N: usize>(
        &self,
        items: &[ItemStack; N],
        purpose: ClonePurpose,
    ) -> [CloneOutcome; N] {
        std::array::from_fn(|i| self.clone_item(&items[i], purpose))
    }

    /// Whether `clone` matches `original` on type, quantity, every
    /// well-known field and the extracted tag data. Clone records are
    /// ignored.
    #[must_use]
    pub fn verify_integrity(&self, original: &ItemStack, clone: &ItemStack) -> bool {
        if original.item_type() != clone.item_type() || original.quantity() != clone.quantity() {
            return false;
        }
        match (original.has_meta(), clone.has_meta()) {
            (false, false) => return true,
            (true, true) => {}
            _ => return false,
        }
        let (Some(a), Some(b)) = (original.meta(), clone.meta()) else {
            return false;
        };
        if a.display_name() != b.display_name()
            || non_empty_lore(a) != non_empty_lore(b)
            || a.enchantments() != b.enchantments()
            || a.flags() != b.flags()
            || a.custom_model_data() != b.custom_model_data()
            || a.is_unbreakable() != b.is_unbreakable()
            || a.tags() != b.tags()
        {
            return false;
        }
        self.bridge.equivalent_for_trading(original, clone)
    }

    /// Snapshot of the per-tier counters.
    #[must_use]
    pub fn stats(&self) -> CloneStats {
        CloneStats {
            verified: self.counters.verified.load(Ordering::Relaxed),
            reconstructed: self.counters.reconstructed.load(Ordering::Relaxed),
            unverified: self.counters.unverified.load(Ordering::Relaxed),
        }
    }

    fn reapply(&self, target: &mut ItemStack, store: Option<&protrades_nbt::CompoundTag>) -> bool {
        let Some(store) = store else {
            return true;
        };
        match self.bridge.apply_tags(target, store) {
            Ok(report) => report.is_complete(),
            Err(e) => {
                debug!(error = %e, "could not re-apply tags to copy");
                false
            }
        }
    }

    fn finish(
        &self,
        mut item: ItemStack,
        confidence: CloneConfidence,
        purpose: ClonePurpose,
    ) -> CloneOutcome {
        self.counters.record(confidence);
        if purpose.stamps_record() && !item.is_air() {
            item.set_clone_record(Some(CloneIntegrityRecord::now(confidence)));
        }
        CloneOutcome { item, confidence }
    }
}

fn non_empty_lore(meta: &protrades_types::ItemMeta) -> Option<&[String]> {
    meta.lore().filter(|lore| !lore.is_empty())
}
