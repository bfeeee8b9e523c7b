//! CSV corpus loader.
//!
//! Reads one text column from a CSV file with a header row. Rows whose text
//! field is missing or blank are dropped; surviving rows are numbered in
//! order from zero.

use crate::types::{Corpus, Document};
use mytherapy_core::{AppError, AppResult};
use std::io::Read;
use std::path::Path;

/// Load the corpus at `path`, reading the `column` field of every row.
///
/// # Errors
/// `AppError::Corpus` if the file cannot be read, the header has no such
/// column, or a row is malformed.
pub fn load_corpus(path: &Path, column: &str) -> AppResult<Corpus> {
    tracing::debug!("Loading corpus from {:?} (column '{}')", path, column);

    let file = std::fs::File::open(path)
        .map_err(|e| AppError::Corpus(format!("Failed to open corpus {:?}: {}", path, e)))?;

    let corpus = read_corpus(file, column)?;

    tracing::info!(
        "Loaded {} documents from {:?} ({} rows dropped)",
        corpus.len(),
        path,
        corpus.dropped_rows
    );

    Ok(corpus)
}

/// Read a corpus from any CSV source.
pub fn read_corpus<R: Read>(reader: R, column: &str) -> AppResult<Corpus> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| AppError::Corpus(format!("Failed to read CSV header: {}", e)))?;

    let position = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == column)
        .ok_or_else(|| {
            AppError::Corpus(format!(
                "Column '{}' not found. Available columns: {}",
                column,
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })?;

    let mut corpus = Corpus::default();

    for (row, record) in csv_reader.records().enumerate() {
        let record = record
            .map_err(|e| AppError::Corpus(format!("Malformed CSV row {}: {}", row + 1, e)))?;

        match record.get(position) {
            Some(text) if !text.trim().is_empty() => {
                let id = corpus.documents.len();
                corpus.documents.push(Document {
                    id,
                    text: text.to_string(),
                });
            }
            _ => corpus.dropped_rows += 1,
        }
    }

    Ok(corpus)
}
