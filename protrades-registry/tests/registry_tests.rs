use pretty_assertions::assert_eq;
use protrades_nbt::TagValue;
use protrades_registry::{
    MemoryConfigStore, RegistryConfig, RegistryError, TradeRegistry,
};
use protrades_types::{ItemStack, NamespacedKey, ShopId, TagContainer, Trade, TradeId};
use std::sync::Arc;
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

fn registry() -> (TradeRegistry, Arc<MemoryConfigStore>) {
    init_tracing();
    let store = Arc::new(MemoryConfigStore::new());
    let registry =
        TradeRegistry::new(RegistryConfig::default(), store.clone(), Handle::current()).unwrap();
    (registry, store)
}

fn ids(trades: &[Trade]) -> Vec<&str> {
    trades.iter().map(|t| t.id().as_str()).collect()
}

/// Shop `s1` with `t1` and `t2`, added in that order.
fn scenario_a(registry: &TradeRegistry) {
    let s1 = shop("s1");
    registry.create_shop(&s1).unwrap();
    registry
        .add_trade(&s1, &trade("t1", ("apple", 1), ("bread", 1)))
        .unwrap();
    registry
        .add_trade(&s1, &trade("t2", ("carrot", 3), ("diamond", 1)))
        .unwrap();
}

#[tokio::test]
async fn trades_come_back_in_insertion_order() {
    let (registry, _) = registry();
    scenario_a(&registry);

    let trades = registry.get_trades(&shop("s1")).unwrap();
    assert_eq!(ids(&trades), vec!["t1", "t2"]);
    assert_eq!(trades[1].inputs()[0].quantity(), 3);
    assert_eq!(trades[1].output().item_type().as_str(), "minecraft:diamond");
}

#[tokio::test]
async fn move_to_first_position() {
    let (registry, _) = registry();
    scenario_a(&registry);
    let s1 = shop("s1");

    registry.move_trade_to_position(&s1, &tid("t2"), 1).unwrap();
    assert_eq!(ids(&registry.get_trades(&s1).unwrap()), vec!["t2", "t1"]);
    assert_eq!(registry.get_position(&s1, &tid("t2")).unwrap(), 1);
    assert_eq!(registry.get_position(&s1, &tid("t1")).unwrap(), 2);
}

#[tokio::test]
async fn move_to_last_position_and_past_it() {
    let (registry, _) = registry();
    scenario_a(&registry);
    let s1 = shop("s1");

    registry.move_trade_to_position(&s1, &tid("t1"), 2).unwrap();
    assert_eq!(registry.trade_order(&s1).unwrap(), vec![tid("t2"), tid("t1")]);

    let err = registry
        .move_trade_to_position(&s1, &tid("t1"), 3)
        .unwrap_err();
    assert!(matches!(err, RegistryError::PositionOutOfRange { position: 3, len: 2 }));
    assert!(registry.move_trade_to_position(&s1, &tid("t1"), 0).is_err());
    assert_eq!(registry.trade_order(&s1).unwrap(), vec![tid("t2"), tid("t1")]);
}

#[tokio::test]
async fn stored_items_are_independent_of_the_callers() {
    let (registry, _) = registry();
    let s1 = shop("s1");
    registry.create_shop(&s1).unwrap();

    let mut input = ItemStack::of("nether_star", 1).unwrap();
    let owner = NamespacedKey::parse("owner").unwrap();
    input
        .meta_mut()
        .unwrap()
        .tags_mut()
        .set(owner.clone(), TagValue::String("alice".into()))
        .unwrap();
    let original = Trade::new(
        tid("star"),
        vec![input],
        ItemStack::of("emerald", 9).unwrap(),
    )
    .unwrap();
    registry.add_trade(&s1, &original).unwrap();

    let stored = registry.get_trade(&s1, &tid("star")).unwrap();
    let mut stored_input = stored.inputs()[0].clone();
    stored_input
        .meta_mut()
        .unwrap()
        .tags_mut()
        .set(owner.clone(), TagValue::String("mallory".into()))
        .unwrap();

    let again = registry.get_trade(&s1, &tid("star")).unwrap();
    let meta = again.inputs()[0].meta().unwrap();
    assert_eq!(
        meta.tags().get(&owner, protrades_nbt::TagKind::String),
        Some(TagValue::String("alice".into()))
    );
    assert!(again.inputs()[0].clone_record().is_some());
    assert_eq!(registry.clone_stats().verified, 2);
}

#[tokio::test]
async fn replacing_a_trade_keeps_its_position() {
    let (registry, _) = registry();
    scenario_a(&registry);
    let s1 = shop("s1");

    registry
        .add_trade(&s1, &trade("t1", ("apple", 5), ("bread", 2)))
        .unwrap();
    let trades = registry.get_trades(&s1).unwrap();
    assert_eq!(ids(&trades), vec!["t1", "t2"]);
    assert_eq!(trades[0].inputs()[0].quantity(), 5);
}

#[tokio::test]
async fn remove_and_swap() {
    let (registry, _) = registry();
    scenario_a(&registry);
    let s1 = shop("s1");
    registry
        .add_trade(&s1, &trade("t3", ("emerald", 1), ("feather", 4)))
        .unwrap();

    registry.swap_trades(&s1, &tid("t1"), &tid("t3")).unwrap();
    assert_eq!(ids(&registry.get_trades(&s1).unwrap()), vec!["t3", "t2", "t1"]);

    let removed = registry.remove_trade(&s1, &tid("t2")).unwrap();
    assert_eq!(removed.id(), &tid("t2"));
    assert_eq!(ids(&registry.get_trades(&s1).unwrap()), vec!["t3", "t1"]);

    assert!(matches!(
        registry.remove_trade(&s1, &tid("t2")),
        Err(RegistryError::TradeNotFound { .. })
    ));
    assert!(matches!(
        registry.get_position(&s1, &tid("t2")),
        Err(RegistryError::TradeNotFound { .. })
    ));
}

#[tokio::test]
async fn set_order_requires_an_exact_permutation() {
    let (registry, _) = registry();
    scenario_a(&registry);
    let s1 = shop("s1");

    for bad in [
        vec![tid("t1")],
        vec![tid("t1"), tid("t1")],
        vec![tid("t1"), tid("t9")],
        vec![tid("t1"), tid("t2"), tid("t2")],
    ] {
        assert!(matches!(
            registry.set_order(&s1, bad),
            Err(RegistryError::InvalidOrder(_))
        ));
    }
    assert_eq!(registry.trade_order(&s1).unwrap(), vec![tid("t1"), tid("t2")]);

    registry.set_order(&s1, vec![tid("t2"), tid("t1")]).unwrap();
    assert_eq!(registry.trade_order(&s1).unwrap(), vec![tid("t2"), tid("t1")]);
}

#[tokio::test]
async fn every_valid_position_round_trips() {
    let (registry, _) = registry();
    let s1 = shop("s1");
    registry.create_shop(&s1).unwrap();
    let names = ["a", "b", "c", "d", "e"];
    for name in names {
        registry
            .add_trade(&s1, &trade(name, ("stone", 1), ("cobblestone", 1)))
            .unwrap();
    }
    for name in names {
        for position in 1..=names.len() {
            registry
                .move_trade_to_position(&s1, &tid(name), position)
                .unwrap();
            assert_eq!(registry.get_position(&s1, &tid(name)).unwrap(), position);
            assert_eq!(registry.trade_order(&s1).unwrap().len(), names.len());
        }
    }
}

#[tokio::test]
async fn unknown_shops_are_reported() {
    let (registry, _) = registry();
    let ghost = shop("ghost");

    assert!(matches!(
        registry.get_trades(&ghost),
        Err(RegistryError::ShopNotFound(_))
    ));
    assert!(matches!(
        registry.add_trade(&ghost, &trade("t1", ("apple", 1), ("bread", 1))),
        Err(RegistryError::ShopNotFound(_))
    ));
    assert!(matches!(
        registry.delete_shop(&ghost),
        Err(RegistryError::ShopNotFound(_))
    ));
    assert!(!registry.has_shop(&ghost));
    // Nothing was created implicitly.
    assert_eq!(registry.clone_stats().total(), 0);
    assert!(registry.shop_ids().is_empty());
}

#[tokio::test]
async fn shops_are_unique_and_described() {
    let (registry, _) = registry();
    let smith = shop("blacksmith");
    registry.create_shop(&smith).unwrap();
    registry.create_shop(&shop("alchemist")).unwrap();
    assert!(matches!(
        registry.create_shop(&smith),
        Err(RegistryError::AlreadyExists(_))
    ));

    assert_eq!(registry.shop_ids(), vec![shop("alchemist"), smith.clone()]);
    let info = registry.shop_info(&smith).unwrap();
    assert_eq!(info.title, "&1&lblacksmith Shop");
    assert_eq!(info.rows, 3);
    assert_eq!(info.trade_count, 0);
}

#[tokio::test]
async fn tag_stats_count_tags_and_records() {
    let (registry, _) = registry();
    scenario_a(&registry);
    let s1 = shop("s1");

    let mut tagged = ItemStack::of("nether_star", 1).unwrap();
    tagged
        .meta_mut()
        .unwrap()
        .tags_mut()
        .set(NamespacedKey::parse("power").unwrap(), TagValue::Int(7))
        .unwrap();
    let star = Trade::new(tid("t3"), vec![tagged], ItemStack::of("emerald", 1).unwrap()).unwrap();
    registry.add_trade(&s1, &star).unwrap();
    registry.create_shop(&shop("empty")).unwrap();

    let stats = registry.tag_stats();
    assert_eq!(stats.shops, 2);
    assert_eq!(stats.trades, 3);
    assert_eq!(stats.items, 6);
    assert_eq!(stats.tagged_trades, 1);
    assert_eq!(stats.tagged_items, 1);
    assert_eq!(stats.stamped_items, 6);
    assert!(stats.to_string().starts_with("2 shops, 3 trades"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mutations_keep_the_order_consistent() {
    let (registry, store) = registry();
    let s1 = shop("s1");
    registry.create_shop(&s1).unwrap();

    let mut workers = Vec::new();
    for worker in 0..4 {
        let registry = registry.clone();
        let s1 = s1.clone();
        workers.push(tokio::spawn(async move {
            for i in 0..25 {
                let id = format!("w{worker}-{i}");
                registry
                    .add_trade(&s1, &trade(&id, ("stone", 1), ("gravel", 1)))
                    .unwrap();
                registry.move_trade_to_position(&s1, &tid(&id), 1).unwrap();
            }
        }));
    }
    for worker in workers {
        worker.await.unwrap();
    }
    registry.wait_idle().await;

    let order = registry.trade_order(&s1).unwrap();
    assert_eq!(order.len(), 100);
    let stored = store.get(&s1).await.unwrap();
    assert_eq!(stored.trades.len(), 100);
    assert_eq!(
        stored.order,
        order.iter().map(ToString::to_string).collect::<Vec<_>>()
    );
}
