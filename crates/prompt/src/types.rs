//! Prompt types.

use serde::{Deserialize, Serialize};

/// Which advice template a prompt was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    /// Retrieved examples interpolated as context
    Rag,
    /// Context-free prompt used when retrieval returned nothing
    Fallback,
    /// Caller-supplied documents interpolated as context
    Direct,
}

impl PromptKind {
    /// All kinds, in loading order.
    pub const ALL: [PromptKind; 3] = [PromptKind::Rag, PromptKind::Fallback, PromptKind::Direct];

    /// Prompt identifier, also the override file stem.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Rag => "advice.rag",
            Self::Fallback => "advice.fallback",
            Self::Direct => "advice.direct",
        }
    }

    /// Whether the template carries a context block.
    pub fn has_context(&self) -> bool {
        !matches!(self, Self::Fallback)
    }
}

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// System message sent alongside the user prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Template string with Handlebars syntax (`{{query}}`, `{{context}}`)
    pub template: String,
}

/// A fully built prompt ready for the generative service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Template family
    pub kind: PromptKind,

    /// Number of context chunks interpolated
    #[serde(rename = "contextChunks")]
    pub context_chunks: usize,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(
        system: Option<String>,
        user: String,
        source_prompt_id: String,
        kind: PromptKind,
        context_chunks: usize,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                kind,
                context_chunks,
            },
        }
    }
}
