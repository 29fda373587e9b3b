//! Directory-backed config store: one `<shop>.json` file per shop.
//!
//! Writes go to a temporary sibling file that is then renamed over the
//! target, so a crash never leaves a half-written record behind.

use crate::config::RegistryConfig;
use crate::error::RegistryResult;
use crate::record::ShopRecord;
use crate::store::ConfigStore;
use async_trait::async_trait;
use protrades_types::ShopId;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const EXTENSION: &str = "json";

/// Stores shop records as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    dir: PathBuf,
}

impl FileConfigStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A store rooted at the configured `data_dir`.
    #[must_use]
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(&config.data_dir)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ShopId) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    async fn ensure_dir(&self) -> RegistryResult<()> {
        if fs::metadata(&self.dir).await.is_err() {
            fs::create_dir_all(&self.dir).await?;
            info!("Created shop directory {:?}", self.dir);
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn list_shops(&self) -> RegistryResult<Vec<ShopId>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match ShopId::new(stem) {
                Ok(id) => ids.push(id),
                Err(e) => warn!("Skipping shop file {:?}: {e}", path),
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn load_shop(&self, id: &ShopId) -> RegistryResult<Option<ShopRecord>> {
        let path = self.path_for(id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        debug!("Read {} bytes from {:?}", bytes.len(), path);
        Ok(Some(ShopRecord::from_json(&bytes)?))
    }

    async fn save_shop(&self, id: &ShopId, record: &ShopRecord) -> RegistryResult<()> {
        self.ensure_dir().await?;
        let path = self.path_for(id);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));

        let bytes = record.to_json()?;
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Wrote shop {} ({} bytes)", id, bytes.len());
        Ok(())
    }

    async fn delete_shop(&self, id: &ShopId) -> RegistryResult<()> {
        let path = self.path_for(id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted shop file {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
