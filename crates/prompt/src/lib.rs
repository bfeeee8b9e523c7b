//! Prompt system for the MyTherapy advice engine.
//!
//! - Built-in advice templates (retrieval-augmented, fallback, direct)
//! - Optional per-workspace YAML overrides
//! - Handlebars rendering
//! - Prompt assembly from retrieved chunks

pub mod builder;
pub mod loader;
pub mod templates;
pub mod types;

// Re-export main types
pub use builder::{assemble, build_direct_prompt, build_prompt, join_context};
pub use loader::{load_prompt, PromptSet};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptKind};
