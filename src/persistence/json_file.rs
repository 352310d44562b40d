use super::*;
use anyhow::Context;
use std::{fs, path::PathBuf};
use tracing::debug;

/// Catalog kept as a JSON array of items in a single file
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn new_shared(path: impl Into<PathBuf>) -> SharedCatalogPersistence {
        Arc::new(Self::new(path))
    }
}

impl CatalogPersistence for JsonFilePersistence {
    fn load(&self) -> Result<Vec<Item>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read catalog {}", self.path.display()))?;
        let items: Vec<Item> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog {}", self.path.display()))?;
        debug!(path = %self.path.display(), count = items.len(), "catalog loaded");
        Ok(items)
    }

    fn snapshot(&self, items: &[Item]) -> Result<()> {
        let content = serde_json::to_string_pretty(items)?;

        // readers must never see a partially written catalog
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)
            .with_context(|| format!("Failed to write snapshot {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace snapshot {}", self.path.display()))?;

        debug!(path = %self.path.display(), count = items.len(), "catalog snapshot written");
        Ok(())
    }
}
