//! Prompt assembly: context joining and template rendering.

use crate::loader::PromptSet;
use crate::types::{BuiltPrompt, PromptDefinition, PromptKind};
use handlebars::Handlebars;
use mytherapy_core::{AppError, AppResult};
use std::collections::HashMap;

/// Join retrieved chunks into a single context block, one chunk per line.
pub fn join_context(chunks: &[String]) -> String {
    chunks.join("\n")
}

/// Assemble the advice prompt for a query.
///
/// Non-empty `chunks` select the retrieval-augmented template with the
/// chunks as context; an empty set selects the context-free fallback.
pub fn assemble(prompts: &PromptSet, chunks: &[String], query: &str) -> AppResult<BuiltPrompt> {
    if chunks.is_empty() {
        build_prompt(&prompts.fallback, PromptKind::Fallback, query, &[])
    } else {
        build_prompt(&prompts.rag, PromptKind::Rag, query, chunks)
    }
}

/// Build the direct prompt from caller-supplied documents.
pub fn build_direct_prompt(
    prompts: &PromptSet,
    documents: &[String],
    query: &str,
) -> AppResult<BuiltPrompt> {
    build_prompt(&prompts.direct, PromptKind::Direct, query, documents)
}

/// Render a prompt definition.
///
/// `query` is bound to `{{query}}`; for kinds with a context block the
/// joined `context` is bound to `{{context}}`.
///
/// # Example
/// ```
/// use mytherapy_prompt::{build_prompt, PromptKind, PromptSet};
///
/// let prompts = PromptSet::builtin();
/// let chunks = vec!["I can't sleep before exams.".to_string()];
/// let built = build_prompt(&prompts.rag, PromptKind::Rag, "My client panics", &chunks).unwrap();
/// assert!(built.user.contains("I can't sleep before exams."));
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    kind: PromptKind,
    query: &str,
    context: &[String],
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut variables = HashMap::new();
    variables.insert("query", query.to_string());

    let context_chunks = if kind.has_context() {
        variables.insert("context", join_context(context));
        context.len()
    } else {
        0
    };

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        definition.system.clone(),
        user,
        definition.id.clone(),
        kind,
        context_chunks,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<&str, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
