use protrades_items::TagBridge;
use protrades_types::{ItemStack, Trade};
use std::fmt;

/// Counts of custom tags and clone records across the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagStats {
    pub shops: usize,
    pub trades: usize,
    /// Input and output stacks of every trade.
    pub items: usize,
    /// Trades with at least one item carrying custom tags.
    pub tagged_trades: usize,
    pub tagged_items: usize,
    /// Items carrying a clone integrity record.
    pub stamped_items: usize,
}

impl TagStats {
    pub(crate) fn add_shop<'a>(
        &mut self,
        bridge: &TagBridge,
        trades: impl Iterator<Item = &'a Trade>,
    ) {
        self.shops += 1;
        for trade in trades {
            self.trades += 1;
            let mut tagged = false;
            for item in trade.inputs().iter().chain(std::iter::once(trade.output())) {
                tagged |= self.add_item(bridge, item);
            }
            if tagged {
                self.tagged_trades += 1;
            }
        }
    }

    fn add_item(&mut self, bridge: &TagBridge, item: &ItemStack) -> bool {
        self.items += 1;
        if item.clone_record().is_some() {
            self.stamped_items += 1;
        }
        let tagged = bridge.has_custom_tags(item);
        if tagged {
            self.tagged_items += 1;
        }
        tagged
    }
}

impl fmt::Display for TagStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} shops, {} trades ({} with custom tags), {} items ({} tagged, {} stamped)",
            self.shops,
            self.trades,
            self.tagged_trades,
            self.items,
            self.tagged_items,
            self.stamped_items
        )
    }
}
