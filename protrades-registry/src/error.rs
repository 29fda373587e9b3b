//! Error types for the registry.

use protrades_items::ItemsError;
use protrades_nbt::CodecError;
use protrades_types::{ShopId, TradeId};
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur in registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A shop with this id already exists.
    #[error("shop already exists: {0}")]
    AlreadyExists(ShopId),

    #[error("shop not found: {0}")]
    ShopNotFound(ShopId),

    #[error("trade {trade} not found in shop {shop}")]
    TradeNotFound { shop: ShopId, trade: TradeId },

    /// A 1-based position outside `1..=len`.
    #[error("position {position} out of range 1..={len}")]
    PositionOutOfRange { position: usize, len: usize },

    /// A proposed order that is not a permutation of the shop's trades.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("validation error: {0}")]
    Validation(#[from] protrades_types::Error),

    /// An item failed to encode or decode.
    #[error("item codec error: {0}")]
    Decode(#[from] CodecError),

    /// A stored item string could not be turned into an item.
    #[error("item error: {0}")]
    Items(#[from] ItemsError),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template is disabled: {0}")]
    TemplateDisabled(String),

    #[error("invalid template {template}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The config store failed for a reason of its own.
    #[error("store error: {0}")]
    Store(String),
}
