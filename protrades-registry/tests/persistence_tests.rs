use async_trait::async_trait;
use pretty_assertions::assert_eq;
use protrades_items::encode_item;
use protrades_registry::{
    ConfigStore, FileConfigStore, MemoryConfigStore, RegistryConfig, RegistryError,
    RegistryResult, ShopRecord, TradeRecord, TradeRegistry,
};
use protrades_types::{ItemStack, ShopId, Trade, TradeId};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::runtime::Handle;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn shop(id: &str) -> ShopId {
    ShopId::new(id).unwrap()
}

fn tid(id: &str) -> TradeId {
    TradeId::new(id).unwrap()
}

fn trade(id: &str, input: (&str, u32), output: (&str, u32)) -> Trade {
    Trade::new(
        tid(id),
        vec![ItemStack::of(input.0, input.1).unwrap()],
        ItemStack::of(output.0, output.1).unwrap(),
    )
    .unwrap()
}

fn registry_on(store: Arc<dyn ConfigStore>) -> TradeRegistry {
    init_tracing();
    TradeRegistry::new(RegistryConfig::default(), store, Handle::current()).unwrap()
}

fn ids(trades: &[Trade]) -> Vec<&str> {
    trades.iter().map(|t| t.id().as_str()).collect()
}

#[tokio::test]
async fn mutations_reach_the_store() {
    let store = Arc::new(MemoryConfigStore::new());
    let registry = registry_on(store.clone());
    let s1 = shop("s1");
    registry.create_shop(&s1).unwrap();
    registry
        .add_trade(&s1, &trade("t1", ("apple", 1), ("bread", 1)))
        .unwrap();
    registry
        .add_trade(&s1, &trade("t2", ("carrot", 3), ("diamond", 1)))
        .unwrap();
    registry.move_trade_to_position(&s1, &tid("t2"), 1).unwrap();
    registry.wait_idle().await;

    let record = store.get(&s1).await.unwrap();
    assert_eq!(record.title.as_deref(), Some("&1&ls1 Shop"));
    assert_eq!(record.rows, Some(3));
    assert_eq!(record.order, vec!["t2".to_string(), "t1".to_string()]);
    assert_eq!(record.trades.len(), 2);
}

#[tokio::test]
async fn a_second_registry_loads_what_the_first_wrote() {
    let store = Arc::new(MemoryConfigStore::new());
    let first = registry_on(store.clone());
    let s1 = shop("s1");
    first.create_shop(&s1).unwrap();
    first
        .add_trade(&s1, &trade("t1", ("apple", 1), ("bread", 1)))
        .unwrap();
    first
        .add_trade(&s1, &trade("t2", ("carrot", 3), ("diamond", 1)))
        .unwrap();
    first.swap_trades(&s1, &tid("t1"), &tid("t2")).unwrap();
    first.shutdown().await.unwrap();

    let second = registry_on(store);
    let report = second.load_all().await.unwrap();
    assert_eq!(report.shops, 1);
    assert_eq!(report.trades, 2);
    assert!(report.skipped.is_empty());

    let before = first.get_trades(&s1).unwrap();
    let after = second.get_trades(&s1).unwrap();
    assert_eq!(ids(&after), vec!["t2", "t1"]);
    assert_eq!(after, before);
}

#[tokio::test]
async fn corrupt_trade_is_skipped_and_the_rest_loads() {
    let store = Arc::new(MemoryConfigStore::new());
    let good = encode_item(&ItemStack::of("emerald", 2).unwrap()).unwrap();
    let record = ShopRecord {
        title: Some("Market".into()),
        rows: Some(4),
        order: vec!["broken".into(), "valid".into()],
        trades: BTreeMap::from([
            (
                "broken".to_string(),
                TradeRecord {
                    input: vec![good.clone()],
                    output: "%%% not an item %%%".into(),
                },
            ),
            (
                "valid".to_string(),
                TradeRecord {
                    input: vec![good.clone()],
                    output: "DIAMOND:1".into(),
                },
            ),
        ]),
    };
    let market = shop("market");
    store.insert(market.clone(), record).await;

    let registry = registry_on(store);
    let report = registry.load_all().await.unwrap();
    assert_eq!(report.trades, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].shop, market);
    assert_eq!(report.skipped[0].trade.as_deref(), Some("broken"));

    let trades = registry.get_trades(&market).unwrap();
    assert_eq!(ids(&trades), vec!["valid"]);
    assert_eq!(trades[0].inputs()[0].quantity(), 2);
    assert_eq!(trades[0].output().item_type().as_str(), "minecraft:diamond");

    let info = registry.shop_info(&market).unwrap();
    assert_eq!(info.title, "Market");
    assert_eq!(info.rows, 4);
}

#[tokio::test]
async fn flush_writes_the_repaired_order() {
    let store = Arc::new(MemoryConfigStore::new());
    let good = encode_item(&ItemStack::of("emerald", 1).unwrap()).unwrap();
    let trades = ["a", "b"]
        .into_iter()
        .map(|id| {
            (
                id.to_string(),
                TradeRecord {
                    input: vec![good.clone()],
                    output: good.clone(),
                },
            )
        })
        .collect();
    let s1 = shop("s1");
    store
        .insert(
            s1.clone(),
            ShopRecord {
                order: vec!["ghost".into(), "b".into(), "b".into()],
                trades,
                ..ShopRecord::default()
            },
        )
        .await;

    let registry = registry_on(store.clone());
    registry.load_all().await.unwrap();
    assert_eq!(registry.trade_order(&s1).unwrap(), vec![tid("b"), tid("a")]);

    registry.flush_all().await.unwrap();
    let record = store.get(&s1).await.unwrap();
    assert_eq!(record.order, vec!["b".to_string(), "a".to_string()]);
    assert_eq!(record.title.as_deref(), Some("&1&ls1 Shop"));
}

#[tokio::test]
async fn file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("trades");
    let s1 = shop("blacksmith");

    let first = registry_on(Arc::new(FileConfigStore::new(&data_dir)));
    first.create_shop(&s1).unwrap();
    first
        .add_trade(&s1, &trade("sword", ("iron_ingot", 2), ("iron_sword", 1)))
        .unwrap();
    first.create_shop(&shop("baker")).unwrap();
    first.wait_idle().await;
    assert!(data_dir.join("blacksmith.json").exists());
    assert!(data_dir.join("baker.json").exists());

    first.delete_shop(&shop("baker")).unwrap();
    first.wait_idle().await;
    assert!(!data_dir.join("baker.json").exists());

    let second = registry_on(Arc::new(FileConfigStore::new(&data_dir)));
    let report = second.load_all().await.unwrap();
    assert_eq!(report.shops, 1);
    assert_eq!(second.shop_ids(), vec![s1.clone()]);
    assert_eq!(
        second.get_trades(&s1).unwrap(),
        first.get_trades(&s1).unwrap()
    );
}

#[tokio::test]
async fn unreadable_shop_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.json"), b"{ not json").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
    std::fs::write(
        dir.path().join("empty.json"),
        ShopRecord::default().to_json().unwrap(),
    )
    .unwrap();

    let registry = registry_on(Arc::new(FileConfigStore::new(dir.path())));
    let report = registry.load_all().await.unwrap();
    assert_eq!(report.shops, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].shop, shop("broken"));
    assert_eq!(report.skipped[0].trade, None);
    assert_eq!(registry.shop_ids(), vec![shop("empty")]);
}

#[tokio::test]
async fn deleted_shop_stays_deleted_and_can_be_recreated() {
    let store = Arc::new(MemoryConfigStore::new());
    let registry = registry_on(store.clone());
    let s1 = shop("s1");
    registry.create_shop(&s1).unwrap();
    registry
        .add_trade(&s1, &trade("t1", ("apple", 1), ("bread", 1)))
        .unwrap();
    registry.delete_shop(&s1).unwrap();
    registry.wait_idle().await;
    assert!(store.get(&s1).await.is_none());
    assert!(matches!(
        registry.get_trades(&s1),
        Err(RegistryError::ShopNotFound(_))
    ));

    registry.create_shop(&s1).unwrap();
    registry.wait_idle().await;
    let record = store.get(&s1).await.unwrap();
    assert!(record.trades.is_empty());
    assert!(registry.get_trades(&s1).unwrap().is_empty());
}

#[tokio::test]
async fn reload_replaces_in_memory_state() {
    let store = Arc::new(MemoryConfigStore::new());
    let registry = registry_on(store.clone());
    let s1 = shop("s1");
    registry.create_shop(&s1).unwrap();
    registry
        .add_trade(&s1, &trade("t1", ("apple", 1), ("bread", 1)))
        .unwrap();
    registry.wait_idle().await;

    let mut record = store.get(&s1).await.unwrap();
    record.trades.clear();
    record.order.clear();
    store.insert(s1.clone(), record).await;

    let report = registry.reload_shop(&s1).await.unwrap();
    assert_eq!(report.trades, 0);
    assert!(registry.get_trades(&s1).unwrap().is_empty());

    assert!(matches!(
        registry.reload_shop(&shop("ghost")).await,
        Err(RegistryError::ShopNotFound(_))
    ));
}

/// Fails every write and counts the attempts.
#[derive(Default)]
struct FailingStore {
    attempts: AtomicUsize,
}

#[async_trait]
impl ConfigStore for FailingStore {
    async fn list_shops(&self) -> RegistryResult<Vec<ShopId>> {
        Ok(Vec::new())
    }

    async fn load_shop(&self, _id: &ShopId) -> RegistryResult<Option<ShopRecord>> {
        Ok(None)
    }

    async fn save_shop(&self, _id: &ShopId, _record: &ShopRecord) -> RegistryResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(RegistryError::Store("disk full".into()))
    }

    async fn delete_shop(&self, _id: &ShopId) -> RegistryResult<()> {
        Err(RegistryError::Store("disk full".into()))
    }
}

#[tokio::test]
async fn failed_background_saves_do_not_affect_callers() {
    let store = Arc::new(FailingStore::default());
    let registry = registry_on(store.clone());
    let s1 = shop("s1");
    registry.create_shop(&s1).unwrap();
    registry
        .add_trade(&s1, &trade("t1", ("apple", 1), ("bread", 1)))
        .unwrap();
    registry.wait_idle().await;

    assert!(store.attempts.load(Ordering::SeqCst) >= 1);
    assert_eq!(ids(&registry.get_trades(&s1).unwrap()), vec!["t1"]);

    let err = registry.flush_shop(&s1).await.unwrap_err();
    assert!(matches!(err, RegistryError::Store(_)));
    assert!(registry.shutdown().await.is_err());
}

#[tokio::test]
async fn file_store_uses_the_configured_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = RegistryConfig::from_toml_str(&format!(
        "data_dir = {:?}",
        dir.path().join("shops").display().to_string()
    ))
    .unwrap();
    let store = FileConfigStore::from_config(&config);
    assert_eq!(store.dir(), dir.path().join("shops"));

    init_tracing();
    let registry = TradeRegistry::new(config, Arc::new(store), Handle::current()).unwrap();
    registry.create_shop(&shop("armory")).unwrap();
    registry.wait_idle().await;
    assert!(dir.path().join("shops").join("armory.json").exists());
}

/// An encoded stone item whose custom tag `protrades:a` holds `levels`
/// nested compounds, written byte by byte.
fn nested_item_text(levels: usize) -> String {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use flate2::{Compression, write::GzEncoder};
    use std::io::Write;

    let mut raw = b"PTI1".to_vec();
    raw.push(15);
    raw.extend_from_slice(b"minecraft:stone");
    raw.push(1); // quantity
    raw.push(1); // meta present
    raw.extend_from_slice(&[0, 0, 0, 0, 0, 0]); // empty display fields
    raw.push(1); // one custom tag
    raw.push(11);
    raw.extend_from_slice(b"protrades:a");
    raw.push(13); // compound
    raw.extend_from_slice(&[1, 1, b'a', 13].repeat(levels));
    raw.push(0);
    raw.push(0); // no clone record

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).unwrap();
    STANDARD.encode(encoder.finish().unwrap())
}

#[tokio::test]
async fn deeply_nested_item_is_skipped_on_load() {
    let shallow = protrades_items::decode_item(&nested_item_text(2)).unwrap();
    assert_eq!(shallow.item_type().as_str(), "minecraft:stone");

    let store = Arc::new(MemoryConfigStore::new());
    let good = encode_item(&ItemStack::of("emerald", 1).unwrap()).unwrap();
    let record = ShopRecord {
        order: vec!["deep".into(), "plain".into()],
        trades: BTreeMap::from([
            (
                "deep".to_string(),
                TradeRecord {
                    input: vec![good.clone()],
                    output: nested_item_text(500_000),
                },
            ),
            (
                "plain".to_string(),
                TradeRecord {
                    input: vec![good.clone()],
                    output: good.clone(),
                },
            ),
        ]),
        ..ShopRecord::default()
    };
    let s1 = shop("s1");
    store.insert(s1.clone(), record).await;

    let registry = registry_on(store);
    let report = registry.load_all().await.unwrap();
    assert_eq!(report.trades, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].trade.as_deref(), Some("deep"));
    assert_eq!(ids(&registry.get_trades(&s1).unwrap()), vec!["plain"]);
}
