//! Durable storage abstraction for shop records.

use crate::error::RegistryResult;
use crate::record::ShopRecord;
use async_trait::async_trait;
use protrades_types::ShopId;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Where shop records live between restarts.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Ids of every stored shop.
    async fn list_shops(&self) -> RegistryResult<Vec<ShopId>>;

    /// Reads one shop. `Ok(None)` when it is not stored.
    async fn load_shop(&self, id: &ShopId) -> RegistryResult<Option<ShopRecord>>;

    /// Writes one shop, replacing any previous record.
    async fn save_shop(&self, id: &ShopId, record: &ShopRecord) -> RegistryResult<()>;

    /// Removes one shop. Removing an absent shop succeeds.
    async fn delete_shop(&self, id: &ShopId) -> RegistryResult<()>;
}

/// A [`ConfigStore`] held in memory.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    records: RwLock<BTreeMap<ShopId, ShopRecord>>,
}

impl MemoryConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record directly, bypassing any registry.
    pub async fn insert(&self, id: ShopId, record: ShopRecord) {
        self.records.write().await.insert(id, record);
    }

    /// The stored record for `id`, if any.
    pub async fn get(&self, id: &ShopId) -> Option<ShopRecord> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn shop_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn list_shops(&self) -> RegistryResult<Vec<ShopId>> {
        Ok(self.records.read().await.keys().cloned().collect())
    }

    async fn load_shop(&self, id: &ShopId) -> RegistryResult<Option<ShopRecord>> {
        Ok(self.get(id).await)
    }

    async fn save_shop(&self, id: &ShopId, record: &ShopRecord) -> RegistryResult<()> {
        self.insert(id.clone(), record.clone()).await;
        Ok(())
    }

    async fn delete_shop(&self, id: &ShopId) -> RegistryResult<()> {
        self.records.write().await.remove(id);
        Ok(())
    }
}
