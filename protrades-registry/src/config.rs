//! Registry configuration (`protrades.toml`).

use crate::error::{RegistryError, RegistryResult};
use protrades_items::ClonePurpose;
use protrades_types::ShopId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Largest number of rows a shop page can have.
pub const MAX_ROWS: u8 = 6;

/// Settings for a [`TradeRegistry`](crate::TradeRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory holding one `<shop>.json` per shop.
    pub data_dir: PathBuf,
    /// Directory searched recursively for `*.toml` trade templates.
    pub templates_dir: PathBuf,
    /// Rows given to new shops and to records without a valid row count.
    pub default_rows: u8,
    /// Title given to new shops; `{id}` is replaced by the shop id.
    pub title_format: String,
    /// How items are cloned when a trade is stored.
    pub clone_purpose: ClonePurpose,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("trades"),
            templates_dir: PathBuf::from("templates"),
            default_rows: 3,
            title_format: "&1&l{id} Shop".to_string(),
            clone_purpose: ClonePurpose::Trade,
        }
    }
}

impl RegistryConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> RegistryResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| RegistryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded registry config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> RegistryResult<()> {
        if !valid_rows(self.default_rows) {
            return Err(RegistryError::Config(format!(
                "default_rows must be between 1 and {MAX_ROWS}, got {}",
                self.default_rows
            )));
        }
        if self.title_format.trim().is_empty() {
            return Err(RegistryError::Config("title_format must not be blank".into()));
        }
        Ok(())
    }

    /// The default title for `shop`.
    #[must_use]
    pub fn title_for(&self, shop: &ShopId) -> String {
        self.title_format.replace("{id}", shop.as_str())
    }
}

pub(crate) fn valid_rows(rows: u8) -> bool {
    (1..=MAX_ROWS).contains(&rows)
}
