//! Seen-token persistence
//!
//! Flat JSON array of mint addresses that have already been announced.
//! The whole set is rewritten after every insert so a restart never
//! re-announces a token. Writes go to a sibling temp file that is then
//! renamed over the target.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default seen-token file name
pub const DEFAULT_SEEN_FILE: &str = "seenTokens.json";

#[derive(Error, Debug, Clone)]
pub enum PersistError {
    #[error("Failed to serialize seen tokens: {0}")]
    SerializationError(String),

    #[error("Failed to write seen-token file: {0}")]
    WriteError(String),

    #[error("Failed to read seen-token file: {0}")]
    ReadError(String),

    #[error("Seen-token file is corrupted: {0}")]
    CorruptedFile(String),

    #[error("Failed to create directory: {0}")]
    DirectoryError(String),
}

/// Insertion-ordered set of announced mints backed by a JSON file
#[derive(Debug)]
pub struct SeenTokenStore {
    path: PathBuf,
    order: Vec<String>,
    index: HashSet<String>,
}

impl SeenTokenStore {
    /// Load the set from `path`. A missing or empty file yields an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        let mut store = Self {
            path,
            order: Vec::new(),
            index: HashSet::new(),
        };

        if !store.path.exists() {
            tracing::info!("No seen-token file at {}, starting empty", store.path.display());
            return Ok(store);
        }

        let content = fs::read_to_string(&store.path)
            .map_err(|e| PersistError::ReadError(e.to_string()))?;

        if content.trim().is_empty() {
            return Ok(store);
        }

        let mints: Vec<String> = serde_json::from_str(&content)
            .map_err(|e| PersistError::CorruptedFile(e.to_string()))?;

        for mint in mints {
            if store.index.insert(mint.clone()) {
                store.order.push(mint);
            }
        }

        tracing::info!(
            "Loaded {} seen tokens from {}",
            store.order.len(),
            store.path.display()
        );

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, mint: &str) -> bool {
        self.index.contains(mint)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Mints in the order they were first seen
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Record `mint` and persist the full set.
    ///
    /// Returns `Ok(false)` if the mint was already present (nothing written).
    /// On a write failure the insert is undone so memory matches disk.
    pub fn mark_seen(&mut self, mint: &str) -> Result<bool, PersistError> {
        if self.index.contains(mint) {
            return Ok(false);
        }

        self.index.insert(mint.to_string());
        self.order.push(mint.to_string());

        if let Err(e) = self.persist() {
            self.order.pop();
            self.index.remove(mint);
            return Err(e);
        }

        Ok(true)
    }

    /// Rewrite the whole file
    pub fn persist(&self) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| PersistError::DirectoryError(e.to_string()))?;
            }
        }

        let content = serde_json::to_string_pretty(&self.order)
            .map_err(|e| PersistError::SerializationError(e.to_string()))?;

        let tmp = self.tmp_path();
        fs::write(&tmp, content).map_err(|e| PersistError::WriteError(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            PersistError::WriteError(e.to_string())
        })?;

        tracing::debug!("Persisted {} seen tokens", self.order.len());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_SEEN_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
