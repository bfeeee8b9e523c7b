//! Advise command handler.

use clap::Args;
use mytherapy_core::{config::AppConfig, AppError, AppResult};
use mytherapy_rag::{AdviceGenerator, AdviceOutcome};

/// Generate advice for a description of a patient's situation
#[derive(Args, Debug)]
pub struct AdviseCommand {
    /// What the counselor shared about the patient
    pub description: String,

    /// Use these documents as context instead of retrieval (repeatable)
    #[arg(long = "doc")]
    pub docs: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AdviseCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing advise command");

        let description = self.checked_description()?;

        config.validate()?;

        let generator = AdviceGenerator::from_config(config).await?;

        if self.docs.is_empty() && generator.retriever().is_degraded() {
            eprintln!("Index unavailable; advising without retrieved examples.");
        }

        let outcome = if self.docs.is_empty() {
            generator.generate_advice(description).await
        } else {
            generator.advise_with_documents(description, &self.docs).await
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            return Ok(());
        }

        match outcome {
            AdviceOutcome::Generated(advice) => {
                println!("{}", advice.text);
                Ok(())
            }
            AdviceOutcome::Failed(failure) => Err(AppError::Other(failure.render())),
        }
    }

    /// The description as given, unless it is blank.
    fn checked_description(&self) -> AppResult<&str> {
        if self.description.trim().is_empty() {
            return Err(AppError::Other("No input description provided.".to_string()));
        }
        Ok(&self.description)
    }
}
