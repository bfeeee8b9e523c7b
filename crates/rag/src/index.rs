//! Exact (brute-force) L2 vector index.
//!
//! Vectors are stored contiguously and identified by insertion position.
//! Search ranks every stored vector by squared Euclidean distance to the
//! query, ascending, with ties broken by id.

use mytherapy_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// A search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: usize,
    /// Squared L2 distance
    pub distance: f32,
}

/// Flat index over fixed-dimension `f32` vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatL2Index {
    dimension: usize,
    vectors: Vec<f32>,
}

impl FlatL2Index {
    /// Empty index for vectors of `dimension` components.
    pub fn new(dimension: usize) -> AppResult<Self> {
        if dimension == 0 {
            return Err(AppError::Index(
                "Index dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            vectors: Vec::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append a vector and return its id.
    pub fn add(&mut self, vector: &[f32]) -> AppResult<usize> {
        self.check_dimension(vector)?;
        let id = self.len();
        self.vectors.extend_from_slice(vector);
        Ok(id)
    }

    /// Stored vector by id.
    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        let start = id.checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.vectors.get(start..end)
    }

    /// The `k` nearest vectors to `query`, closest first.
    ///
    /// Returns `min(k, len)` neighbors.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>> {
        self.check_dimension(query)?;

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(id, stored)| Neighbor {
                id,
                distance: squared_l2(query, stored),
            })
            .collect();

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, compare);
            neighbors.truncate(k);
        }
        neighbors.sort_by(compare);

        Ok(neighbors)
    }

    /// Write the index to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)
            .map_err(|e| AppError::Index(format!("Failed to write index {:?}: {}", path, e)))?;
        writer.flush()?;

        tracing::debug!("Saved index with {} vectors to {:?}", self.len(), path);
        Ok(())
    }

    /// Read an index written by [`FlatL2Index::save`].
    pub fn load(path: &Path) -> AppResult<Self> {
        let file = File::open(path)
            .map_err(|e| AppError::Index(format!("Failed to open index {:?}: {}", path, e)))?;

        let index: Self = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| AppError::Index(format!("Corrupt index file {:?}: {}", path, e)))?;

        if index.dimension == 0 || index.vectors.len() % index.dimension != 0 {
            return Err(AppError::Index(format!(
                "Corrupt index file {:?}: {} values do not fit dimension {}",
                path,
                index.vectors.len(),
                index.dimension
            )));
        }

        tracing::debug!(
            "Loaded index with {} vectors (dim {}) from {:?}",
            index.len(),
            index.dimension,
            path
        );

        Ok(index)
    }

    fn check_dimension(&self, vector: &[f32]) -> AppResult<()> {
        if vector.len() != self.dimension {
            return Err(AppError::Index(format!(
                "Vector dimension mismatch: got {}, index expects {}",
                vector.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn compare(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.id.cmp(&b.id))
}
