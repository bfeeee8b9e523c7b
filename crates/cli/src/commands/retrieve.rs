//! Retrieve command handler.

use clap::Args;
use mytherapy_core::{config::AppConfig, AppError, AppResult};
use mytherapy_rag::Retriever;

/// Show the examples most similar to a description
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Description to search for
    pub query: String,

    /// Number of examples to return (default: rag.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command");

        if self.query.trim().is_empty() {
            return Err(AppError::Other("No query provided.".to_string()));
        }

        let top_k = self.top_k.unwrap_or(config.rag.top_k);
        let retriever = Retriever::load(config).await;

        if retriever.is_degraded() {
            eprintln!("Index unavailable; run 'mytherapy index build' first.");
        }

        let chunks = retriever.retrieve_scored(&self.query, top_k).await?;

        if self.json {
            let output = serde_json::json!({
                "query": self.query,
                "topK": top_k,
                "degraded": retriever.is_degraded(),
                "chunks": chunks,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if chunks.is_empty() {
            println!("No examples retrieved.");
        } else {
            for (rank, chunk) in chunks.iter().enumerate() {
                println!("{}. [id {}, distance {:.4}]", rank + 1, chunk.id, chunk.distance);
                println!("   {}", chunk.text.trim());
            }
        }

        Ok(())
    }
}
