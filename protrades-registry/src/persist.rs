//! Background persistence of shop state.
//!
//! Every mutation takes a revision from one process-wide counter while it
//! still holds the shop lock, snapshots the shop, and hands the snapshot to
//! a task. Tasks for the same shop id serialise on an async gate that
//! remembers the highest revision written; anything older is dropped. A
//! delete is just another revision, so a late save cannot resurrect a
//! deleted shop and a late delete cannot remove a recreated one.

use crate::error::RegistryResult;
use crate::record::ShopRecord;
use crate::shop::ShopState;
use crate::store::ConfigStore;
use protrades_types::ShopId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Locks a std mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Gate = Arc<AsyncMutex<u64>>;

pub(crate) struct Persister {
    store: Arc<dyn ConfigStore>,
    runtime: Handle,
    revision: AtomicU64,
    gates: Mutex<HashMap<ShopId, Gate>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Persister {
    pub(crate) fn new(store: Arc<dyn ConfigStore>, runtime: Handle) -> Self {
        Self {
            store,
            runtime,
            revision: AtomicU64::new(0),
            gates: Mutex::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// Next revision. Call while holding the lock of the state it stamps.
    pub(crate) fn next_revision(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn gate(&self, id: &ShopId) -> Gate {
        let mut gates = lock(&self.gates);
        Arc::clone(gates.entry(id.clone()).or_default())
    }

    fn track(&self, task: JoinHandle<()>) {
        let mut tasks = lock(&self.tasks);
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }

    /// Saves `snapshot` in the background. Failures are logged.
    pub(crate) fn schedule_save(self: &Arc<Self>, revision: u64, snapshot: ShopState) {
        let this = Arc::clone(self);
        let task = self.runtime.spawn(async move {
            if let Err(e) = this.save(revision, &snapshot).await {
                warn!(shop = %snapshot.id, revision, "failed to save shop: {e}");
            }
        });
        self.track(task);
    }

    /// Removes the stored shop in the background. Failures are logged.
    pub(crate) fn schedule_delete(self: &Arc<Self>, revision: u64, id: ShopId) {
        let this = Arc::clone(self);
        let task = self.runtime.spawn(async move {
            if let Err(e) = this.delete(revision, &id).await {
                warn!(shop = %id, revision, "failed to delete stored shop: {e}");
            }
        });
        self.track(task);
    }

    /// Writes `snapshot` unless a newer revision has been written already.
    pub(crate) async fn save(&self, revision: u64, snapshot: &ShopState) -> RegistryResult<()> {
        let gate = self.gate(&snapshot.id);
        let mut written = gate.lock().await;
        if revision <= *written {
            debug!(shop = %snapshot.id, revision, latest = *written, "skipping stale save");
            return Ok(());
        }
        let record = ShopRecord::capture(snapshot)?;
        self.store.save_shop(&snapshot.id, &record).await?;
        *written = revision;
        debug!(shop = %snapshot.id, revision, "saved shop");
        Ok(())
    }

    async fn delete(&self, revision: u64, id: &ShopId) -> RegistryResult<()> {
        let gate = self.gate(id);
        let mut written = gate.lock().await;
        if revision <= *written {
            return Ok(());
        }
        self.store.delete_shop(id).await?;
        *written = revision;
        Ok(())
    }

    /// Records that the store already holds `revision` of `id`, e.g. after a
    /// load. Older pending saves are then dropped.
    pub(crate) async fn mark_written(&self, id: &ShopId, revision: u64) {
        let gate = self.gate(id);
        let mut written = gate.lock().await;
        *written = (*written).max(revision);
    }

    /// Waits for every background task scheduled so far, including tasks
    /// scheduled while waiting.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let pending = std::mem::take(&mut *lock(&self.tasks));
            if pending.is_empty() {
                return;
            }
            for task in pending {
                if let Err(e) = task.await {
                    warn!("persistence task failed: {e}");
                }
            }
        }
    }
}
