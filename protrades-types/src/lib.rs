//! Core type definitions for ProTrades.
//!
//! This crate defines the host-facing model the engine works against:
//! - Shop and trade identifiers
//! - Items (`ItemStack`), their metadata surface and custom tag container
//! - Trades (inputs consumed, output produced)
//!
//! Tag values themselves live in `protrades-nbt`; cloning, tag transfer and
//! persistence live in the crates above this one.

mod container;
mod ids;
mod item;
mod meta;
mod trade;

pub use container::{DEFAULT_NAMESPACE, NamespacedKey, PersistentTags, TagContainer};
pub use ids::{ShopId, TradeId};
pub use item::{CloneConfidence, CloneIntegrityRecord, ItemStack, ItemType};
pub use meta::{ItemFlag, ItemMeta};
pub use trade::Trade;

use protrades_nbt::TagKind;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A value failed construction-time validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A namespaced key was malformed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The tag container cannot hold values of this kind.
    #[error("unsupported tag kind: {0}")]
    UnsupportedKind(TagKind),
}
