//! Built-in advice templates.
//!
//! Used whenever the workspace does not provide an override under
//! `.mytherapy/prompts/<id>.yml`.

use crate::types::{PromptDefinition, PromptKind};

/// System message for the context-free fallback request.
pub const FALLBACK_SYSTEM: &str = "You are a helpful and compassionate mental health assistant.";

/// Retrieval-augmented advice template.
pub const RAG_TEMPLATE: &str = "You're a friendly and thoughtful mental health assistant.
The counselor is asking for support with a specific situation. Use the following real-life examples to gently guide your response.

Here\u{2019}s what we know so far:
{{context}}

Here\u{2019}s what the counselor shared:
{{query}}

Now, please offer kind, supportive, and practical advice that feels personal and emotionally sensitive.
Keep your tone warm and reassuring.
Advice:
";

/// Context-free template used when nothing was retrieved.
pub const FALLBACK_TEMPLATE: &str = "You are a compassionate and experienced mental health advisor.
The following is a concern shared by a patient:
\"{{query}}\"

Please provide empathetic, supportive, and constructive advice that a counselor could use to help this patient.
Ensure the response is gentle, encouraging, and prioritizes emotional well-being.";

/// Template for advice over caller-supplied documents.
pub const DIRECT_TEMPLATE: &str = "You\u{2019}re a warm and friendly mental health assistant.
Based on the real-world context below, help a counselor who\u{2019}s trying their best to support someone going through a tough time.

Context:
{{context}}

Here\u{2019}s what the counselor said:
{{query}}

Now, kindly share heartfelt and encouraging guidance \u{2014} something gentle, clear, and truly supportive.
Helpful Advice:
";

/// Built-in definition for a template family.
pub fn builtin(kind: PromptKind) -> PromptDefinition {
    let (title, system, template) = match kind {
        PromptKind::Rag => ("Retrieval-augmented advice", None, RAG_TEMPLATE),
        PromptKind::Fallback => (
            "Fallback advice",
            Some(FALLBACK_SYSTEM.to_string()),
            FALLBACK_TEMPLATE,
        ),
        PromptKind::Direct => ("Advice from supplied documents", None, DIRECT_TEMPLATE),
    };

    PromptDefinition {
        id: kind.id().to_string(),
        title: title.to_string(),
        api_version: "1.0".to_string(),
        created_by: "builtin".to_string(),
        system,
        template: template.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_fallback_has_system_message() {
        assert!(builtin(PromptKind::Rag).system.is_none());
        assert!(builtin(PromptKind::Direct).system.is_none());
        assert_eq!(
            builtin(PromptKind::Fallback).system.as_deref(),
            Some(FALLBACK_SYSTEM)
        );
    }

    #[test]
    fn test_fallback_template_has_no_context_slot() {
        assert!(!FALLBACK_TEMPLATE.contains("{{context}}"));
        assert!(RAG_TEMPLATE.contains("{{context}}"));
        assert!(DIRECT_TEMPLATE.contains("{{context}}"));
    }
}
