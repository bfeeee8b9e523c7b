//! Index command handler.

use clap::{Args, Subcommand};
use mytherapy_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Build or inspect the example index
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Embed the corpus and write the index and metadata
    Build(IndexBuildCommand),
    /// Show statistics for the persisted index
    Stats(IndexStatsCommand),
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            IndexAction::Build(cmd) => cmd.execute(config).await,
            IndexAction::Stats(cmd) => cmd.execute(config),
        }
    }
}

/// Build the index
#[derive(Args, Debug)]
pub struct IndexBuildCommand {
    /// CSV corpus (default: rag.corpusPath)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Column holding the document text (default: rag.textColumn)
    #[arg(long)]
    pub column: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexBuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index build command");

        let mut config = config.clone();
        if let Some(ref corpus) = self.corpus {
            config.rag.corpus_path = corpus.clone();
        }
        if let Some(ref column) = self.column {
            config.rag.text_column = column.clone();
        }

        let stats = mytherapy_rag::build_index(&config).await?;

        if self.json {
            let output = serde_json::json!({
                "documents": stats.documents,
                "droppedRows": stats.dropped_rows,
                "dimension": stats.dimension,
                "provider": stats.provider,
                "model": stats.model,
                "indexPath": stats.index_path,
                "metadataPath": stats.metadata_path,
                "builtAt": stats.built_at,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} documents ({} rows dropped) with {}/{} in {:.2}s",
                stats.documents, stats.dropped_rows, stats.provider, stats.model, stats.duration_secs
            );
            println!("  Index:    {}", stats.index_path.display());
            println!("  Metadata: {}", stats.metadata_path.display());
        }

        Ok(())
    }
}

/// Show index statistics
#[derive(Args, Debug)]
pub struct IndexStatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexStatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index stats command");

        let stats = mytherapy_rag::index_stats(config)?;

        if self.json {
            let output = serde_json::json!({
                "vectors": stats.vectors,
                "metadataEntries": stats.metadata_entries,
                "dimension": stats.dimension,
                "indexPath": stats.index_path,
                "indexSizeBytes": stats.index_size_bytes,
                "metadataPath": stats.metadata_path,
                "metadataSizeBytes": stats.metadata_size_bytes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Vectors:          {}", stats.vectors);
            println!("Metadata entries: {}", stats.metadata_entries);
            println!("Dimension:        {}", stats.dimension);
            println!(
                "Index:            {} ({} bytes)",
                stats.index_path.display(),
                stats.index_size_bytes
            );
            println!(
                "Metadata:         {} ({} bytes)",
                stats.metadata_path.display(),
                stats.metadata_size_bytes
            );
        }

        Ok(())
    }
}
