//! Process-wide memo of loaded datasets, keyed by file path.
//!
//! Entries live until explicitly replaced. Failed loads are not cached, so a
//! fixed file is picked up on the next request.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::services::dataset::{load_dataset, Dataset, DatasetError};

#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: RwLock<HashMap<PathBuf, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`, loading it from disk on a miss.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<Dataset>, DatasetError> {
        self.get_or_insert_with(path, || load_dataset(path))
    }

    /// Return the cached dataset for `path`, calling `load` on a miss.
    pub fn get_or_insert_with<F>(&self, path: &Path, load: F) -> Result<Arc<Dataset>, DatasetError>
    where
        F: FnOnce() -> Result<Dataset, DatasetError>,
    {
        if let Some(dataset) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            tracing::debug!("Dataset cache hit for {}", path.display());
            return Ok(Arc::clone(dataset));
        }

        tracing::debug!("Dataset cache miss for {}", path.display());
        let dataset = Arc::new(load()?);

        // Another caller may have loaded the same path meanwhile; keep the first entry
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(path.to_path_buf()).or_insert(dataset)))
    }

    /// Store `dataset` as the entry for `path`, dropping any previous one.
    pub fn replace(&self, path: &Path, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        let previous = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), Arc::clone(&dataset));
        if previous.is_some() {
            tracing::info!("Replaced cached dataset for {}", path.display());
        }
        dataset
    }
}
