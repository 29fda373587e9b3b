//! Persisted form of a shop.
//!
//! Items are stored as encoded strings so a record is plain JSON. Decoding
//! is tolerant per entry: a bad item or trade is skipped with a warning and
//! the rest of the shop still loads.

use crate::config::{RegistryConfig, valid_rows};
use crate::error::RegistryResult;
use crate::shop::ShopState;
use protrades_items::{encode_item, parse_item};
use protrades_types::{ItemStack, ShopId, Trade, TradeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// One persisted trade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(default)]
    pub input: Vec<String>,
    #[serde(default)]
    pub output: String,
}

/// One persisted shop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u8>,
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub trades: BTreeMap<String, TradeRecord>,
}

impl ShopRecord {
    pub fn to_json(&self) -> RegistryResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> RegistryResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub(crate) fn capture(state: &ShopState) -> RegistryResult<Self> {
        let mut trades = BTreeMap::new();
        for trade in state.trades() {
            let input = trade
                .inputs()
                .iter()
                .map(encode_item)
                .collect::<Result<Vec<_>, _>>()?;
            let output = encode_item(trade.output())?;
            trades.insert(trade.id().to_string(), TradeRecord { input, output });
        }
        Ok(Self {
            title: Some(state.title.clone()),
            rows: Some(state.rows),
            order: state.order().iter().map(ToString::to_string).collect(),
            trades,
        })
    }
}

/// An entry left out while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub shop: ShopId,
    /// The trade concerned; `None` when the whole shop was skipped.
    pub trade: Option<String>,
    pub reason: String,
}

/// Summary of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub shops: usize,
    pub trades: usize,
    pub skipped: Vec<SkippedEntry>,
}

impl LoadReport {
    pub(crate) fn merge(&mut self, other: LoadReport) {
        self.shops += other.shops;
        self.trades += other.trades;
        self.skipped.extend(other.skipped);
    }
}

/// Rebuilds a shop from its record, skipping what does not decode.
pub(crate) fn restore(
    id: &ShopId,
    record: &ShopRecord,
    config: &RegistryConfig,
) -> (ShopState, LoadReport) {
    let mut report = LoadReport {
        shops: 1,
        ..LoadReport::default()
    };
    let mut skip = |trade: &str, reason: String| {
        warn!(shop = %id, trade, "skipping trade: {reason}");
        report.skipped.push(SkippedEntry {
            shop: id.clone(),
            trade: Some(trade.to_string()),
            reason,
        });
    };

    let mut trades = HashMap::new();
    for (key, entry) in &record.trades {
        let trade_id = match TradeId::new(key.as_str()) {
            Ok(trade_id) => trade_id,
            Err(e) => {
                skip(key, e.to_string());
                continue;
            }
        };
        let output = match parse_item(&entry.output) {
            Ok(output) => output,
            Err(e) => {
                skip(key, format!("output: {e}"));
                continue;
            }
        };
        let inputs: Vec<ItemStack> = entry
            .input
            .iter()
            .enumerate()
            .filter_map(|(i, text)| match parse_item(text) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(shop = %id, trade = %key, "skipping input {i}: {e}");
                    None
                }
            })
            .collect();
        match Trade::new(trade_id.clone(), inputs, output) {
            Ok(trade) => {
                trades.insert(trade_id, trade);
            }
            Err(_) => skip(key, "no decodable input".to_string()),
        }
    }

    let order = record
        .order
        .iter()
        .filter_map(|text| TradeId::new(text.as_str()).ok())
        .collect();
    let title = record
        .title
        .clone()
        .unwrap_or_else(|| config.title_for(id));
    let rows = record
        .rows
        .filter(|rows| valid_rows(*rows))
        .unwrap_or(config.default_rows);

    let state = ShopState::from_parts(id.clone(), title, rows, trades, order);
    report.trades = state.len();
    (state, report)
}
