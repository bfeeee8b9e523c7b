//! Id-to-text map persisted next to the index as a JSON object.
//!
//! Keys are the decimal index ids (`"0"`, `"1"`, ...), values the document
//! text.

use crate::types::Document;
use mytherapy_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataMap(BTreeMap<String, String>);

impl MetadataMap {
    /// Map each document's id to its text.
    pub fn from_documents(documents: &[Document]) -> Self {
        Self(
            documents
                .iter()
                .map(|d| (d.id.to_string(), d.text.clone()))
                .collect(),
        )
    }

    /// Text stored for an index id.
    pub fn get(&self, id: usize) -> Option<&str> {
        self.0.get(&id.to_string()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Write the map as JSON, replacing any existing file.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)
            .map_err(|e| AppError::Index(format!("Failed to write metadata {:?}: {}", path, e)))?;
        writer.flush()?;

        tracing::debug!("Saved {} metadata entries to {:?}", self.len(), path);
        Ok(())
    }

    /// Read a map written by [`MetadataMap::save`].
    ///
    /// Every key must be a non-negative integer in canonical decimal form,
    /// as written by [`MetadataMap::save`].
    pub fn load(path: &Path) -> AppResult<Self> {
        let file = File::open(path)
            .map_err(|e| AppError::Index(format!("Failed to open metadata {:?}: {}", path, e)))?;

        let map: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| AppError::Index(format!("Corrupt metadata file {:?}: {}", path, e)))?;

        if let Some(bad) = map.0.keys().find(|k| !is_canonical_id(k)) {
            return Err(AppError::Index(format!(
                "Corrupt metadata file {:?}: invalid id {:?}",
                path, bad
            )));
        }

        Ok(map)
    }
}

/// Keys round-trip through `usize`: `"7"` is an id, `"07"` and `"+7"` are not.
fn is_canonical_id(key: &str) -> bool {
    key.parse::<usize>()
        .map(|id| id.to_string() == key)
        .unwrap_or(false)
}
