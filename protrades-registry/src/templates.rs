//! Reusable trade templates loaded from TOML.
//!
//! A template file holds one table per template, keyed by template id:
//!
//! ```toml
//! [iron_sword]
//! name = "Iron Sword"
//! category = "weapons"
//! inputs = [{ item = "emerald", amount = 5 }]
//! output = { item = "iron_sword", name = "&fTrusty Blade" }
//!
//! [relic]
//! category = "rare"
//! enabled = false
//! inputs = [{ item = "DIAMOND:3", kind = "encoded" }]
//! output = { item = "H4sIAAAA...", kind = "encoded" }
//! ```
//!
//! Loading is tolerant per template: a malformed or invalid entry is
//! skipped with a warning and the rest of the file still loads.

use crate::error::{RegistryError, RegistryResult};
use protrades_items::parse_item;
use protrades_types::{ItemStack, Trade, TradeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const EXTENSION: &str = "toml";

fn default_category() -> String {
    "default".to_string()
}

fn default_enabled() -> bool {
    true
}

/// How a template item's `item` field is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateItemKind {
    /// An item type id such as `iron_sword`.
    #[default]
    Regular,
    /// A stored item string: encoded form or legacy `TYPE:AMOUNT`.
    Encoded,
}

/// One input or output of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateItem {
    #[serde(default)]
    pub kind: TemplateItemKind,
    pub item: String,
    /// Stack size. Defaults to 1 for regular items and to the stored
    /// amount for encoded ones; values below 1 are raised to 1.
    #[serde(default)]
    pub amount: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lore: Vec<String>,
    #[serde(default)]
    pub enchantments: BTreeMap<String, i32>,
}

impl TemplateItem {
    /// A regular item of `amount`.
    #[must_use]
    pub fn regular(item: impl Into<String>, amount: u32) -> Self {
        Self {
            kind: TemplateItemKind::Regular,
            item: item.into(),
            amount: Some(amount),
            name: None,
            lore: Vec::new(),
            enchantments: BTreeMap::new(),
        }
    }

    /// An item read from its stored string form.
    #[must_use]
    pub fn encoded(text: impl Into<String>) -> Self {
        Self {
            kind: TemplateItemKind::Encoded,
            amount: None,
            ..Self::regular(text, 1)
        }
    }

    /// Builds the stack this entry describes. Air is refused.
    pub fn build(&self) -> RegistryResult<ItemStack> {
        let mut item = match self.kind {
            TemplateItemKind::Regular => {
                ItemStack::of(&self.item, self.amount.unwrap_or(1).max(1))?
            }
            TemplateItemKind::Encoded => {
                let mut item = parse_item(&self.item)?;
                if let Some(amount) = self.amount {
                    item.set_quantity(amount.max(1));
                }
                item
            }
        };
        if item.is_air() {
            return Err(protrades_types::Error::Validation("air cannot be traded".into()).into());
        }

        if self.name.is_none() && self.lore.is_empty() && self.enchantments.is_empty() {
            return Ok(item);
        }
        if let Some(meta) = item.meta_mut() {
            if let Some(name) = &self.name {
                meta.set_display_name(Some(name.clone()));
            }
            if !self.lore.is_empty() {
                meta.set_lore(Some(self.lore.clone()));
            }
            for (enchantment, level) in &self.enchantments {
                meta.add_enchantment(enchantment.clone(), *level);
            }
        }
        Ok(item)
    }
}

/// A named recipe for a trade that can be added to any shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeTemplate {
    /// Taken from the table key when loaded from TOML.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub inputs: Vec<TemplateItem>,
    pub output: TemplateItem,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Free-form data carried along for callers.
    #[serde(default)]
    pub metadata: BTreeMap<String, toml::Value>,
}

impl TradeTemplate {
    /// An enabled template in the default category.
    #[must_use]
    pub fn new(id: impl Into<String>, inputs: Vec<TemplateItem>, output: TemplateItem) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: String::new(),
            category: default_category(),
            inputs,
            output,
            enabled: true,
            metadata: BTreeMap::new(),
        }
    }

    /// The display name, falling back to the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    fn invalid(&self, reason: impl fmt::Display) -> RegistryError {
        RegistryError::InvalidTemplate {
            template: self.id.clone(),
            reason: reason.to_string(),
        }
    }

    /// Checks that the template has an id and inputs and that every item
    /// builds.
    pub fn validate(&self) -> RegistryResult<()> {
        self.build_items().map(|_| ())
    }

    fn build_items(&self) -> RegistryResult<(Vec<ItemStack>, ItemStack)> {
        if self.id.trim().is_empty() {
            return Err(self.invalid("blank id"));
        }
        if self.inputs.is_empty() {
            return Err(self.invalid("no inputs"));
        }
        let inputs = self
            .inputs
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.build()
                    .map_err(|e| self.invalid(format!("input {}: {e}", i + 1)))
            })
            .collect::<RegistryResult<Vec<_>>>()?;
        let output = self
            .output
            .build()
            .map_err(|e| self.invalid(format!("output: {e}")))?;
        Ok((inputs, output))
    }

    /// Builds a trade with id `trade_id`. Disabled templates are refused.
    pub fn instantiate(&self, trade_id: TradeId) -> RegistryResult<Trade> {
        if !self.enabled {
            return Err(RegistryError::TemplateDisabled(self.id.clone()));
        }
        let (inputs, output) = self.build_items()?;
        Ok(Trade::new(trade_id, inputs, output)?)
    }

    fn encoded_items(&self) -> (usize, usize) {
        let all = self.inputs.iter().chain(std::iter::once(&self.output));
        let encoded = all
            .filter(|item| item.kind == TemplateItemKind::Encoded)
            .count();
        (encoded, self.inputs.len() + 1)
    }
}

/// Counts over a [`TemplateLibrary`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateStats {
    pub total: usize,
    pub enabled: usize,
    pub categories: usize,
    /// Templates whose items are all encoded.
    pub encoded: usize,
    /// Templates whose items are all regular.
    pub regular: usize,
    pub mixed: usize,
}

impl fmt::Display for TemplateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} templates ({} enabled) in {} categories: {} regular, {} encoded, {} mixed",
            self.total, self.enabled, self.categories, self.regular, self.encoded, self.mixed
        )
    }
}

/// Templates by id.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: BTreeMap<String, TradeTemplate>,
}

impl TemplateLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one TOML document. A document that is not TOML at all is an
    /// error; individual bad templates are skipped.
    pub fn from_toml_str(text: &str) -> RegistryResult<Self> {
        let mut library = Self::new();
        library.add_document(text, "<inline>")?;
        Ok(library)
    }

    /// Loads every `*.toml` file under `dir`, recursively, in path order.
    /// A missing directory yields an empty library; unreadable files are
    /// skipped.
    pub fn load_dir(dir: impl AsRef<Path>) -> RegistryResult<Self> {
        let dir = dir.as_ref();
        let mut library = Self::new();
        if !dir.exists() {
            info!("No template directory at {:?}", dir);
            return Ok(library);
        }

        let mut files = Vec::new();
        collect_files(dir, &mut files)?;
        files.sort();
        for path in files {
            let source = path.display().to_string();
            let loaded = std::fs::read_to_string(&path)
                .map_err(RegistryError::from)
                .and_then(|text| library.add_document(&text, &source));
            match loaded {
                Ok(count) => debug!("Loaded {count} templates from {:?}", path),
                Err(e) => warn!("Skipping template file {:?}: {e}", path),
            }
        }
        info!("Loaded {} trade templates from {:?}", library.len(), dir);
        Ok(library)
    }

    fn add_document(&mut self, text: &str, source: &str) -> RegistryResult<usize> {
        let table: toml::Table =
            toml::from_str(text).map_err(|e| RegistryError::Config(e.to_string()))?;
        let mut count = 0;
        for (id, value) in table {
            let mut template: TradeTemplate = match value.try_into() {
                Ok(template) => template,
                Err(e) => {
                    warn!(template = %id, "skipping template in {source}: {e}");
                    continue;
                }
            };
            template.id = id;
            match self.insert(template) {
                Ok(()) => count += 1,
                Err(e) => warn!("skipping template in {source}: {e}"),
            }
        }
        Ok(count)
    }

    /// Adds a template after validating it, replacing one with the same id.
    pub fn insert(&mut self, template: TradeTemplate) -> RegistryResult<()> {
        template.validate()?;
        if let Some(old) = self.templates.insert(template.id.clone(), template) {
            warn!(template = %old.id, "template replaced by a later definition");
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<TradeTemplate> {
        self.templates.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TradeTemplate> {
        self.templates.get(id)
    }

    /// Like [`get`](Self::get) but fails with `TemplateNotFound`.
    pub fn require(&self, id: &str) -> RegistryResult<&TradeTemplate> {
        self.get(id)
            .ok_or_else(|| RegistryError::TemplateNotFound(id.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TradeTemplate> {
        self.templates.values()
    }

    /// Every category in use, sorted.
    #[must_use]
    pub fn categories(&self) -> BTreeSet<&str> {
        self.iter().map(|t| t.category.as_str()).collect()
    }

    /// Templates of `category` in id order, enabled or not.
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a TradeTemplate> {
        self.iter().filter(move |t| t.category == category)
    }

    /// Re-checks every template, returning the ids that no longer
    /// validate with their reasons.
    #[must_use]
    pub fn validate_all(&self) -> Vec<(String, RegistryError)> {
        self.iter()
            .filter_map(|t| t.validate().err().map(|e| (t.id.clone(), e)))
            .collect()
    }

    #[must_use]
    pub fn stats(&self) -> TemplateStats {
        let mut stats = TemplateStats {
            total: self.len(),
            categories: self.categories().len(),
            ..TemplateStats::default()
        };
        for template in self.iter() {
            if template.enabled {
                stats.enabled += 1;
            }
            match template.encoded_items() {
                (0, _) => stats.regular += 1,
                (encoded, all) if encoded == all => stats.encoded += 1,
                _ => stats.mixed += 1,
            }
        }
        stats
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> RegistryResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}
