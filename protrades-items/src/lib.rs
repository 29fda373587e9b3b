//! Item handling for ProTrades.
//!
//! - [`TagBridge`]: extracts an item's metadata into a compound tag and
//!   applies a compound tag back onto an item
//! - [`CloningEngine`]: tiered, verified cloning
//! - [`item_codec`]: whole-item text encoding, with legacy `TYPE:AMOUNT`
//!   parsing for old stored trades
//! - [`inventory`]: paying for trades out of a slot inventory

mod bridge;
mod clone;
pub mod inventory;
pub mod item_codec;
pub mod keys;

pub use bridge::{ApplyReport, TagBridge};
pub use clone::{
    ClonePurpose, CloneOutcome, CloneStats, CloningEngine, ItemHost, StandardHost,
};
pub use inventory::{Inventory, execute_trade};
pub use item_codec::{decode_item, encode_item, parse_item};
pub use protrades_types::CloneConfidence;

use protrades_nbt::CodecError;
use protrades_types::ItemType;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, ItemsError>;

/// Errors raised by item operations.
#[derive(Debug, thiserror::Error)]
pub enum ItemsError {
    /// The item cannot carry metadata (air).
    #[error("{0} has no metadata surface")]
    NoMetaSurface(ItemType),

    #[error("item codec error: {0}")]
    Codec(#[from] CodecError),

    /// A `TYPE:AMOUNT` string that does not parse.
    #[error("invalid legacy item string {0:?}")]
    LegacyFormat(String),

    #[error("inventory has no room for the item")]
    InventoryFull,

    #[error("inventory does not hold the required items")]
    MissingInputs,
}
