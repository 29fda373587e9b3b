//! In-memory state of one shop.
//!
//! `order` is kept a permutation of the keys of `trades`. Every mutation
//! maintains that directly; [`ShopState::reconcile`] repairs states that
//! arrive from outside (loaded records).

use crate::error::{RegistryError, RegistryResult};
use protrades_types::{ShopId, Trade, TradeId};
use std::collections::{HashMap, HashSet};

/// Title, rows and trade count of a shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopInfo {
    pub id: ShopId,
    pub title: String,
    pub rows: u8,
    pub trade_count: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct ShopState {
    pub(crate) id: ShopId,
    pub(crate) title: String,
    pub(crate) rows: u8,
    trades: HashMap<TradeId, Trade>,
    order: Vec<TradeId>,
    /// Set once the shop has been deleted; the state is then inert.
    pub(crate) deleted: bool,
}

impl ShopState {
    pub(crate) fn new(id: ShopId, title: String, rows: u8) -> Self {
        Self {
            id,
            title,
            rows,
            trades: HashMap::new(),
            order: Vec::new(),
            deleted: false,
        }
    }

    /// Builds a state from loaded parts and reconciles it.
    pub(crate) fn from_parts(
        id: ShopId,
        title: String,
        rows: u8,
        trades: HashMap<TradeId, Trade>,
        order: Vec<TradeId>,
    ) -> Self {
        let mut state = Self {
            id,
            title,
            rows,
            trades,
            order,
            deleted: false,
        };
        state.reconcile();
        state
    }

    pub(crate) fn info(&self) -> ShopInfo {
        ShopInfo {
            id: self.id.clone(),
            title: self.title.clone(),
            rows: self.rows,
            trade_count: self.trades.len(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.trades.len()
    }

    pub(crate) fn order(&self) -> &[TradeId] {
        &self.order
    }

    /// Drops ids with no trade and repeated ids, then appends trades missing
    /// from the order sorted by id. Returns whether anything changed.
    pub(crate) fn reconcile(&mut self) -> bool {
        let before = self.order.len();
        let mut seen = HashSet::with_capacity(self.order.len());
        self.order
            .retain(|id| self.trades.contains_key(id) && seen.insert(id.clone()));
        let dropped = before != self.order.len();

        let mut missing: Vec<TradeId> = self
            .trades
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        missing.sort();
        let appended = !missing.is_empty();
        self.order.extend(missing);

        dropped || appended
    }

    /// Trades in display order.
    pub(crate) fn ordered_trades(&self) -> Vec<Trade> {
        self.order
            .iter()
            .filter_map(|id| self.trades.get(id))
            .cloned()
            .collect()
    }

    pub(crate) fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.values()
    }

    pub(crate) fn get(&self, id: &TradeId) -> RegistryResult<&Trade> {
        self.trades.get(id).ok_or_else(|| self.not_found(id))
    }

    /// Inserts or replaces a trade. New ids go to the end of the order.
    pub(crate) fn insert(&mut self, trade: Trade) {
        let id = trade.id().clone();
        if self.trades.insert(id.clone(), trade).is_none() && !self.order.contains(&id) {
            self.order.push(id);
        }
    }

    pub(crate) fn remove(&mut self, id: &TradeId) -> RegistryResult<Trade> {
        let trade = self.trades.remove(id).ok_or_else(|| self.not_found(id))?;
        self.order.retain(|other| other != id);
        Ok(trade)
    }

    /// 1-based position of `id`.
    pub(crate) fn position(&self, id: &TradeId) -> RegistryResult<usize> {
        self.index_of(id).map(|i| i + 1)
    }

    /// Moves `id` to 1-based `position`. The bound is the order length
    /// before the id is taken out.
    pub(crate) fn move_to(&mut self, id: &TradeId, position: usize) -> RegistryResult<()> {
        let index = self.index_of(id)?;
        let len = self.order.len();
        if position == 0 || position > len {
            return Err(RegistryError::PositionOutOfRange { position, len });
        }
        let moved = self.order.remove(index);
        self.order.insert(position - 1, moved);
        Ok(())
    }

    pub(crate) fn swap(&mut self, a: &TradeId, b: &TradeId) -> RegistryResult<()> {
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        self.order.swap(ia, ib);
        Ok(())
    }

    /// Replaces the order with an exact permutation of the trade ids.
    pub(crate) fn set_order(&mut self, order: Vec<TradeId>) -> RegistryResult<()> {
        if order.len() != self.trades.len() {
            return Err(RegistryError::InvalidOrder(format!(
                "expected {} ids, got {}",
                self.trades.len(),
                order.len()
            )));
        }
        let mut seen = HashSet::with_capacity(order.len());
        for id in &order {
            if !self.trades.contains_key(id) {
                return Err(RegistryError::InvalidOrder(format!("unknown trade {id}")));
            }
            if !seen.insert(id) {
                return Err(RegistryError::InvalidOrder(format!("duplicate trade {id}")));
            }
        }
        self.order = order;
        Ok(())
    }

    fn index_of(&self, id: &TradeId) -> RegistryResult<usize> {
        if !self.trades.contains_key(id) {
            return Err(self.not_found(id));
        }
        self.order
            .iter()
            .position(|other| other == id)
            .ok_or_else(|| self.not_found(id))
    }

    fn not_found(&self, id: &TradeId) -> RegistryError {
        RegistryError::TradeNotFound {
            shop: self.id.clone(),
            trade: id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protrades_types::ItemStack;

    fn trade(id: &str) -> Trade {
        Trade::new(
            TradeId::new(id).unwrap(),
            vec![ItemStack::of("emerald", 1).unwrap()],
            ItemStack::of("diamond", 1).unwrap(),
        )
        .unwrap()
    }

    fn tid(id: &str) -> TradeId {
        TradeId::new(id).unwrap()
    }

    fn state_with(ids: &[&str]) -> ShopState {
        let mut state = ShopState::new(ShopId::new("s").unwrap(), "S".into(), 3);
        for id in ids {
            state.insert(trade(id));
        }
        state
    }

    fn order_of(state: &ShopState) -> Vec<&str> {
        state.order().iter().map(TradeId::as_str).collect()
    }

    #[test]
    fn reconcile_repairs_loaded_order() {
        let trades: HashMap<_, _> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|id| (tid(id), trade(id)))
            .collect();
        let order = vec![tid("c"), tid("ghost"), tid("a"), tid("c")];
        let state = ShopState::from_parts(ShopId::new("s").unwrap(), "S".into(), 3, trades, order);
        assert_eq!(order_of(&state), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn reconcile_is_noop_when_consistent() {
        let mut state = state_with(&["a", "b"]);
        assert!(!state.reconcile());
    }

    #[test]
    fn replacing_keeps_position() {
        let mut state = state_with(&["a", "b", "c"]);
        state.insert(trade("b"));
        assert_eq!(order_of(&state), vec!["a", "b", "c"]);
    }

    #[test]
    fn move_to_last_position_is_allowed() {
        let mut state = state_with(&["a", "b", "c"]);
        state.move_to(&tid("a"), 3).unwrap();
        assert_eq!(order_of(&state), vec!["b", "c", "a"]);
    }

    #[test]
    fn move_past_end_is_rejected() {
        let mut state = state_with(&["a", "b", "c"]);
        let err = state.move_to(&tid("a"), 4).unwrap_err();
        assert!(matches!(err, RegistryError::PositionOutOfRange { position: 4, len: 3 }));
        assert!(state.move_to(&tid("a"), 0).is_err());
        assert_eq!(order_of(&state), vec!["a", "b", "c"]);
    }

    #[test]
    fn set_order_rejects_duplicates() {
        let mut state = state_with(&["a", "b"]);
        assert!(matches!(
            state.set_order(vec![tid("a"), tid("a")]),
            Err(RegistryError::InvalidOrder(_))
        ));
        assert!(state.set_order(vec![tid("a")]).is_err());
        assert!(state.set_order(vec![tid("a"), tid("x")]).is_err());
        state.set_order(vec![tid("b"), tid("a")]).unwrap();
        assert_eq!(order_of(&state), vec!["b", "a"]);
    }
}
