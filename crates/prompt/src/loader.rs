//! Prompt loader with per-workspace YAML overrides.

use crate::templates;
use crate::types::{PromptDefinition, PromptKind};
use mytherapy_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// The three advice prompts, resolved once per process.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSet {
    pub rag: PromptDefinition,
    pub fallback: PromptDefinition,
    pub direct: PromptDefinition,
}

impl PromptSet {
    /// Built-in templates only.
    pub fn builtin() -> Self {
        Self {
            rag: templates::builtin(PromptKind::Rag),
            fallback: templates::builtin(PromptKind::Fallback),
            direct: templates::builtin(PromptKind::Direct),
        }
    }

    /// Resolve every prompt, preferring workspace overrides.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        let mut set = Self::builtin();
        for kind in PromptKind::ALL {
            *set.get_mut(kind) = load_prompt(workspace_path, kind)?;
        }
        Ok(set)
    }

    /// Definition for a template family.
    pub fn get(&self, kind: PromptKind) -> &PromptDefinition {
        match kind {
            PromptKind::Rag => &self.rag,
            PromptKind::Fallback => &self.fallback,
            PromptKind::Direct => &self.direct,
        }
    }

    fn get_mut(&mut self, kind: PromptKind) -> &mut PromptDefinition {
        match kind {
            PromptKind::Rag => &mut self.rag,
            PromptKind::Fallback => &mut self.fallback,
            PromptKind::Direct => &mut self.direct,
        }
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Path of the override file for a prompt kind.
pub fn override_path(workspace_path: &Path, kind: PromptKind) -> PathBuf {
    workspace_path
        .join(".mytherapy/prompts")
        .join(format!("{}.yml", kind.id()))
}

/// Load a prompt definition.
///
/// Reads `.mytherapy/prompts/<id>.yml` when present, otherwise returns the
/// built-in template.
///
/// # Example
/// ```no_run
/// use mytherapy_prompt::{load_prompt, PromptKind};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), PromptKind::Rag)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, kind: PromptKind) -> AppResult<PromptDefinition> {
    let prompt_file = override_path(workspace_path, kind);

    if !prompt_file.exists() {
        return Ok(templates::builtin(kind));
    }

    tracing::debug!("Loading prompt override from: {:?}", prompt_file);

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition, kind)?;

    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Validate a prompt definition loaded for `kind`.
///
/// Context-bearing kinds must reference `{{context}}`; the fallback must not.
fn validate_prompt(def: &PromptDefinition, kind: PromptKind) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.id != kind.id() {
        return Err(AppError::Prompt(format!(
            "Prompt ID '{}' does not match override file for '{}'",
            def.id,
            kind.id()
        )));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    let has_context = def.template.contains("{{context}}");
    if kind.has_context() && !has_context {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' must include a {{{{context}}}} block",
            def.id
        )));
    }
    if !kind.has_context() && has_context {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' must not include a {{{{context}}}} block",
            def.id
        )));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, kind: PromptKind, content: &str) {
        let path = override_path(dir, kind);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_builtin_when_no_override() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), PromptKind::Rag).unwrap();
        assert_eq!(prompt, templates::builtin(PromptKind::Rag));
    }

    #[test]
    fn test_load_valid_override() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            PromptKind::Fallback,
            r#"
id: advice.fallback
title: "Short fallback"
apiVersion: "1.1"
system: "Be brief."
template: "Patient said: {{query}}"
"#,
        );

        let set = PromptSet::load(temp_dir.path()).unwrap();
        assert_eq!(set.fallback.title, "Short fallback");
        assert_eq!(set.fallback.system.as_deref(), Some("Be brief."));
        assert_eq!(set.rag, templates::builtin(PromptKind::Rag));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), PromptKind::Rag, "invalid: yaml: content:");

        let result = load_prompt(temp_dir.path(), PromptKind::Rag);
        assert!(result.is_err());
    }

    #[test]
    fn test_rag_override_without_context_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            PromptKind::Rag,
            r#"
id: advice.rag
title: "No examples"
apiVersion: "1.0"
template: "Counselor said: {{query}}"
"#,
        );

        let err = PromptSet::load(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("must include a {{context}} block"));
    }

    #[test]
    fn test_fallback_override_with_context_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            PromptKind::Fallback,
            r#"
id: advice.fallback
title: "Leaky fallback"
apiVersion: "1.0"
template: "{{context}} {{query}}"
"#,
        );

        let err = load_prompt(temp_dir.path(), PromptKind::Fallback).unwrap_err();
        assert!(err.to_string().contains("must not include a {{context}} block"));
    }

    #[test]
    fn test_override_id_must_match_kind() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            PromptKind::Direct,
            r#"
id: advice.rag
title: "Misplaced"
apiVersion: "1.0"
template: "{{context}} {{query}}"
"#,
        );

        let err = load_prompt(temp_dir.path(), PromptKind::Direct).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_get_returns_kind_definition() {
        let set = PromptSet::builtin();
        for kind in PromptKind::ALL {
            assert_eq!(set.get(kind).id, kind.id());
        }
    }

    #[test]
    fn test_rejects_bad_api_version() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            PromptKind::Direct,
            r#"
id: advice.direct
title: "Direct"
apiVersion: "1"
template: "{{context}}"
"#,
        );

        let err = load_prompt(temp_dir.path(), PromptKind::Direct).unwrap_err();
        assert!(err.to_string().contains("apiVersion"));
    }
}
