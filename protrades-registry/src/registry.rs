//! The trade registry: shops, their trades and trade order.
//!
//! Mutations are synchronous and apply to memory immediately; persistence
//! happens in the background on the runtime handed to
//! [`TradeRegistry::new`]. Each shop has its own lock, so work on one shop
//! never waits for another.

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::persist::{Persister, lock};
use crate::record::{self, LoadReport, SkippedEntry};
use crate::shop::{ShopInfo, ShopState};
use crate::stats::TagStats;
use crate::store::ConfigStore;
use crate::templates::{TemplateLibrary, TradeTemplate};
use protrades_items::{CloneConfidence, CloneStats, CloningEngine};
use protrades_types::{ItemStack, ShopId, Trade, TradeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

type ShopHandle = Arc<Mutex<ShopState>>;

struct Inner {
    config: RegistryConfig,
    engine: Arc<CloningEngine>,
    shops: RwLock<HashMap<ShopId, ShopHandle>>,
    persister: Arc<Persister>,
}

/// Registry of shops and trades. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TradeRegistry {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for TradeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeRegistry")
            .field("config", &self.inner.config)
            .field("shops", &self.shop_ids())
            .finish_non_exhaustive()
    }
}

impl TradeRegistry {
    /// Creates an empty registry with a default cloning engine.
    pub fn new(
        config: RegistryConfig,
        store: Arc<dyn ConfigStore>,
        runtime: Handle,
    ) -> RegistryResult<Self> {
        Self::with_engine(config, store, runtime, Arc::new(CloningEngine::default()))
    }

    /// Creates an empty registry cloning through `engine`.
    pub fn with_engine(
        config: RegistryConfig,
        store: Arc<dyn ConfigStore>,
        runtime: Handle,
        engine: Arc<CloningEngine>,
    ) -> RegistryResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                engine,
                shops: RwLock::new(HashMap::new()),
                persister: Arc::new(Persister::new(store, runtime)),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn engine(&self) -> &CloningEngine {
        &self.inner.engine
    }

    // ── Locking helpers ──────────────────────────────────────────

    fn shops(&self) -> RwLockReadGuard<'_, HashMap<ShopId, ShopHandle>> {
        self.inner.shops.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn shops_mut(&self) -> RwLockWriteGuard<'_, HashMap<ShopId, ShopHandle>> {
        self.inner.shops.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, id: &ShopId) -> RegistryResult<ShopHandle> {
        self.shops()
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::ShopNotFound(id.clone()))
    }

    /// Runs `f` on the shop under its lock and schedules a save if it
    /// succeeds.
    fn mutate<R>(
        &self,
        id: &ShopId,
        f: impl FnOnce(&mut ShopState) -> RegistryResult<R>,
    ) -> RegistryResult<R> {
        let handle = self.handle(id)?;
        let (result, revision, snapshot) = {
            let mut state = lock(&handle);
            if state.deleted {
                return Err(RegistryError::ShopNotFound(id.clone()));
            }
            let result = f(&mut *state)?;
            let revision = self.inner.persister.next_revision();
            (result, revision, state.clone())
        };
        self.inner.persister.schedule_save(revision, snapshot);
        Ok(result)
    }

    /// Runs `f` on the reconciled shop. A save is scheduled only if
    /// reconciliation changed anything.
    fn read<R>(&self, id: &ShopId, f: impl FnOnce(&ShopState) -> R) -> RegistryResult<R> {
        let handle = self.handle(id)?;
        let (result, pending) = {
            let mut state = lock(&handle);
            if state.deleted {
                return Err(RegistryError::ShopNotFound(id.clone()));
            }
            let pending = state
                .reconcile()
                .then(|| (self.inner.persister.next_revision(), state.clone()));
            (f(&*state), pending)
        };
        if let Some((revision, snapshot)) = pending {
            debug!(shop = %id, "order repaired on read");
            self.inner.persister.schedule_save(revision, snapshot);
        }
        Ok(result)
    }

    // ── Shops ────────────────────────────────────────────────────

    /// Creates an empty shop with the configured title and rows.
    pub fn create_shop(&self, id: &ShopId) -> RegistryResult<()> {
        let state = ShopState::new(
            id.clone(),
            self.inner.config.title_for(id),
            self.inner.config.default_rows,
        );
        let (revision, snapshot) = {
            let mut shops = self.shops_mut();
            if shops.contains_key(id) {
                return Err(RegistryError::AlreadyExists(id.clone()));
            }
            let revision = self.inner.persister.next_revision();
            shops.insert(id.clone(), Arc::new(Mutex::new(state.clone())));
            (revision, state)
        };
        info!(shop = %id, "created shop");
        self.inner.persister.schedule_save(revision, snapshot);
        Ok(())
    }

    /// Removes a shop from memory and, in the background, from the store.
    pub fn delete_shop(&self, id: &ShopId) -> RegistryResult<()> {
        let handle = self
            .shops_mut()
            .remove(id)
            .ok_or_else(|| RegistryError::ShopNotFound(id.clone()))?;
        let revision = {
            let mut state = lock(&handle);
            state.deleted = true;
            self.inner.persister.next_revision()
        };
        info!(shop = %id, "deleted shop");
        self.inner.persister.schedule_delete(revision, id.clone());
        Ok(())
    }

    #[must_use]
    pub fn has_shop(&self, id: &ShopId) -> bool {
        self.shops().contains_key(id)
    }

    /// Every shop id, sorted.
    #[must_use]
    pub fn shop_ids(&self) -> Vec<ShopId> {
        let mut ids: Vec<ShopId> = self.shops().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn shop_info(&self, id: &ShopId) -> RegistryResult<ShopInfo> {
        self.read(id, ShopState::info)
    }

    // ── Trades ───────────────────────────────────────────────────

    /// Clones a trade's items with the configured purpose, warning when
    /// any clone could not be verified.
    fn clone_items(&self, shop: &ShopId, trade: &Trade) -> (Vec<ItemStack>, ItemStack) {
        let engine = &self.inner.engine;
        let purpose = self.inner.config.clone_purpose;
        let mut weakest = CloneConfidence::Verified;
        let mut note = |confidence: CloneConfidence| {
            if confidence != CloneConfidence::Verified && weakest != CloneConfidence::Unverified {
                weakest = confidence;
            }
        };
        let inputs = trade
            .inputs()
            .iter()
            .map(|item| {
                let outcome = engine.clone_item(item, purpose);
                note(outcome.confidence);
                outcome.item
            })
            .collect();
        let output = engine.clone_item(trade.output(), purpose);
        note(output.confidence);
        if weakest != CloneConfidence::Verified {
            warn!(shop = %shop, trade = %trade.id(), ?weakest, "trade stored with unverified clones");
        }
        (inputs, output.item)
    }

    /// Stores clones of the trade's items under the trade's id, replacing
    /// any trade with the same id. New trades go last in the order.
    pub fn add_trade(&self, shop: &ShopId, trade: &Trade) -> RegistryResult<()> {
        // Unknown shops fail before any clone is made.
        self.handle(shop)?;

        let (inputs, output) = self.clone_items(shop, trade);
        let stored = Trade::new(trade.id().clone(), inputs, output)?;
        self.mutate(shop, |state| {
            state.insert(stored);
            Ok(())
        })?;
        debug!(shop = %shop, trade = %trade.id(), "added trade");
        Ok(())
    }

    // ── Templates ────────────────────────────────────────────────

    /// Adds a trade built from `template` and returns its id.
    ///
    /// The id is `<template>_<n>` with the smallest `n` not already used in
    /// the shop, so applying a template twice adds two trades.
    pub fn apply_template(
        &self,
        shop: &ShopId,
        template: &TradeTemplate,
    ) -> RegistryResult<TradeId> {
        self.handle(shop)?;

        let built = template.instantiate(TradeId::new(template.id.as_str())?)?;
        let (inputs, output) = self.clone_items(shop, &built);
        let id = self.mutate(shop, |state| {
            let id = free_template_id(state, &template.id)?;
            state.insert(Trade::new(id.clone(), inputs, output)?);
            Ok(id)
        })?;
        info!(shop = %shop, template = %template.id, trade = %id, "applied template");
        Ok(id)
    }

    /// Applies up to `max` enabled templates of `category`, in id order.
    /// Templates that fail to apply are skipped with a warning; an unknown
    /// shop is an error.
    pub fn apply_category(
        &self,
        shop: &ShopId,
        library: &TemplateLibrary,
        category: &str,
        max: usize,
    ) -> RegistryResult<Vec<TradeId>> {
        self.handle(shop)?;

        let mut added = Vec::new();
        for template in library.in_category(category).filter(|t| t.enabled) {
            if added.len() >= max {
                break;
            }
            match self.apply_template(shop, template) {
                Ok(id) => added.push(id),
                Err(e @ RegistryError::ShopNotFound(_)) => return Err(e),
                Err(e) => warn!(shop = %shop, template = %template.id, "skipping template: {e}"),
            }
        }
        info!(shop = %shop, category, applied = added.len(), "applied template category");
        Ok(added)
    }

    /// Removes a trade and returns it.
    pub fn remove_trade(&self, shop: &ShopId, trade: &TradeId) -> RegistryResult<Trade> {
        let removed = self.mutate(shop, |state| state.remove(trade))?;
        debug!(shop = %shop, trade = %trade, "removed trade");
        Ok(removed)
    }

    /// Every trade of the shop in display order.
    pub fn get_trades(&self, shop: &ShopId) -> RegistryResult<Vec<Trade>> {
        self.read(shop, ShopState::ordered_trades)
    }

    pub fn get_trade(&self, shop: &ShopId, trade: &TradeId) -> RegistryResult<Trade> {
        self.read(shop, |state| state.get(trade).cloned())?
    }

    /// The shop's trade ids in display order.
    pub fn trade_order(&self, shop: &ShopId) -> RegistryResult<Vec<TradeId>> {
        self.read(shop, |state| state.order().to_vec())
    }

    // ── Ordering ─────────────────────────────────────────────────

    /// Moves a trade to a 1-based position.
    pub fn move_trade_to_position(
        &self,
        shop: &ShopId,
        trade: &TradeId,
        position: usize,
    ) -> RegistryResult<()> {
        self.mutate(shop, |state| {
            state.reconcile();
            state.move_to(trade, position)
        })
    }

    /// Exchanges the positions of two trades.
    pub fn swap_trades(&self, shop: &ShopId, a: &TradeId, b: &TradeId) -> RegistryResult<()> {
        self.mutate(shop, |state| {
            state.reconcile();
            state.swap(a, b)
        })
    }

    /// Replaces the order. `order` must list every trade exactly once.
    pub fn set_order(&self, shop: &ShopId, order: Vec<TradeId>) -> RegistryResult<()> {
        self.mutate(shop, |state| state.set_order(order))
    }

    /// 1-based position of a trade.
    pub fn get_position(&self, shop: &ShopId, trade: &TradeId) -> RegistryResult<usize> {
        self.read(shop, |state| state.position(trade))?
    }

    // ── Statistics ───────────────────────────────────────────────

    /// Tag statistics across every shop.
    #[must_use]
    pub fn tag_stats(&self) -> TagStats {
        let handles: Vec<ShopHandle> = self.shops().values().cloned().collect();
        let bridge = self.inner.engine.bridge();
        let mut stats = TagStats::default();
        for handle in handles {
            let state = lock(&handle);
            stats.add_shop(bridge, state.trades());
        }
        stats
    }

    #[must_use]
    pub fn clone_stats(&self) -> CloneStats {
        self.inner.engine.stats()
    }

    // ── Persistence ──────────────────────────────────────────────

    /// Loads every stored shop, replacing in-memory shops with the same id.
    ///
    /// A shop whose record cannot be read is skipped and reported; damaged
    /// trades inside a readable record are skipped individually.
    pub async fn load_all(&self) -> RegistryResult<LoadReport> {
        let store = Arc::clone(self.inner.persister.store());
        let ids = store.list_shops().await?;

        let mut report = LoadReport::default();
        for id in ids {
            match self.load_one(&id).await {
                Ok(Some(shop_report)) => report.merge(shop_report),
                Ok(None) => {}
                Err(e) => {
                    warn!(shop = %id, "skipping unreadable shop: {e}");
                    report.skipped.push(SkippedEntry {
                        shop: id,
                        trade: None,
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            "Loaded {} shops with {} trades ({} entries skipped)",
            report.shops,
            report.trades,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Re-reads one shop from the store, replacing its in-memory state.
    pub async fn reload_shop(&self, id: &ShopId) -> RegistryResult<LoadReport> {
        let report = self
            .load_one(id)
            .await?
            .ok_or_else(|| RegistryError::ShopNotFound(id.clone()))?;
        info!(shop = %id, trades = report.trades, "reloaded shop");
        Ok(report)
    }

    async fn load_one(&self, id: &ShopId) -> RegistryResult<Option<LoadReport>> {
        let persister = &self.inner.persister;
        let Some(stored) = persister.store().load_shop(id).await? else {
            return Ok(None);
        };
        let (state, report) = record::restore(id, &stored, &self.inner.config);

        let revision = {
            let mut shops = self.shops_mut();
            if let Some(previous) = shops.get(id) {
                lock(previous).deleted = true;
            }
            let revision = persister.next_revision();
            shops.insert(id.clone(), Arc::new(Mutex::new(state)));
            revision
        };
        persister.mark_written(id, revision).await;
        Ok(Some(report))
    }

    /// Writes one shop now and waits for the write.
    pub async fn flush_shop(&self, id: &ShopId) -> RegistryResult<()> {
        let handle = self.handle(id)?;
        let (revision, snapshot) = {
            let state = lock(&handle);
            if state.deleted {
                return Err(RegistryError::ShopNotFound(id.clone()));
            }
            (self.inner.persister.next_revision(), state.clone())
        };
        self.inner.persister.save(revision, &snapshot).await
    }

    /// Writes every shop now. Keeps going past failures and returns the
    /// first one.
    pub async fn flush_all(&self) -> RegistryResult<()> {
        let mut first_error = None;
        for id in self.shop_ids() {
            if let Err(e) = self.flush_shop(&id).await {
                warn!(shop = %id, "failed to flush shop: {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Waits until every background write scheduled so far has finished.
    pub async fn wait_idle(&self) {
        self.inner.persister.wait_idle().await;
    }

    /// Drains pending writes, then flushes every shop once.
    pub async fn shutdown(&self) -> RegistryResult<()> {
        self.wait_idle().await;
        self.flush_all().await?;
        info!("Trade registry shut down");
        Ok(())
    }
}

/// The first `<template>_<n>` id, counting from 1, that the shop does not
/// hold yet.
fn free_template_id(state: &ShopState, template: &str) -> RegistryResult<TradeId> {
    let mut n = 1usize;
    loop {
        let id = TradeId::new(format!("{template}_{n}"))?;
        if state.get(&id).is_err() {
            return Ok(id);
        }
        n += 1;
    }
}
