//! Shop and trade registry for ProTrades.
//!
//! A [`TradeRegistry`] holds named shops, each an ordered collection of
//! trades. Items are cloned when a trade is stored, so later changes to the
//! caller's items never leak into the registry.
//!
//! # Persistence
//!
//! Every mutation schedules a background save through a [`ConfigStore`].
//! Saves for one shop are applied in mutation order and stale snapshots
//! are dropped. [`FileConfigStore`] keeps one JSON file per shop;
//! [`MemoryConfigStore`] is for tests and embedding.
//!
//! # Templates
//!
//! A [`TemplateLibrary`] holds reusable [`TradeTemplate`]s read from TOML
//! files. Applying one adds a fresh trade to a shop.
//!
//! # Example
//!
//! ```ignore
//! let config = RegistryConfig::load("protrades.toml")?;
//! let store = Arc::new(FileConfigStore::from_config(&config));
//! let templates = TemplateLibrary::load_dir(&config.templates_dir)?;
//! let registry = TradeRegistry::new(config, store, Handle::current())?;
//! registry.load_all().await?;
//!
//! let shop = ShopId::new("blacksmith")?;
//! registry.create_shop(&shop)?;
//! registry.apply_category(&shop, &templates, "weapons", 9)?;
//! ```

mod config;
mod error;
mod file_store;
mod persist;
mod record;
mod registry;
mod shop;
mod stats;
mod store;
mod templates;

pub use config::{MAX_ROWS, RegistryConfig};
pub use error::{RegistryError, RegistryResult};
pub use file_store::FileConfigStore;
pub use record::{LoadReport, ShopRecord, SkippedEntry, TradeRecord};
pub use registry::TradeRegistry;
pub use shop::ShopInfo;
pub use stats::TagStats;
pub use store::{ConfigStore, MemoryConfigStore};
pub use templates::{
    TemplateItem, TemplateItemKind, TemplateLibrary, TemplateStats, TradeTemplate,
};
