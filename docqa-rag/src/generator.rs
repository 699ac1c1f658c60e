//! Grounded answer generation.
//!
//! [`GroundedAnswerGenerator`] formats the grounded prompt, asks the model
//! with temperature 0, and hands the model's text back unmodified. When the
//! evidence is empty it answers with the refusal sentence directly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::Result;
use crate::model::{ChatModel, ChatRequest};
use crate::prompt::{Language, LanguagePolicy, PromptTemplate};
use crate::retriever::EvidenceContext;

/// Whether an answer came from the evidence or is the refusal sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    /// Text produced by the model from the evidence.
    Grounded,
    /// The fixed refusal sentence.
    Refusal,
}

/// The response to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// The text shown to the user.
    pub text: String,
    /// The language the answer was requested in.
    pub language: Language,
    /// Grounded answer or refusal.
    pub kind: AnswerKind,
}

impl Answer {
    /// The refusal answer for `language`.
    pub fn refusal(language: Language) -> Self {
        Self { text: language.refusal().to_string(), language, kind: AnswerKind::Refusal }
    }

    /// `true` if this is the refusal sentence.
    pub fn is_refusal(&self) -> bool {
        self.kind == AnswerKind::Refusal
    }
}

/// Answers questions strictly from an [`EvidenceContext`].
pub struct GroundedAnswerGenerator {
    model: Arc<dyn ChatModel>,
    template: PromptTemplate,
    language: LanguagePolicy,
}

impl GroundedAnswerGenerator {
    /// Create a generator using the default grounded template.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model, template: PromptTemplate::default(), language: LanguagePolicy::default() }
    }

    /// Choose how the answer language is decided.
    pub fn with_language_policy(mut self, policy: LanguagePolicy) -> Self {
        self.language = policy;
        self
    }

    /// Replace the prompt template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// The prompt that [`answer`](Self::answer) would send.
    pub fn format(&self, question: &str, context: &EvidenceContext) -> (String, Language) {
        let language = self.language.resolve(question);
        (self.template.render(&context.render(), question, language), language)
    }

    /// Answer `question` from `context`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Generation`](crate::RagError::Generation) if the
    /// model call fails. There is no retry.
    pub async fn answer(&self, question: &str, context: &EvidenceContext) -> Result<Answer> {
        let language = self.language.resolve(question);
        if context.is_empty() {
            info!(%language, "no evidence retrieved, refusing");
            return Ok(Answer::refusal(language));
        }

        let (prompt, _) = self.format(question, context);
        debug!(model = self.model.name(), %language, prompt_len = prompt.len(), "invoking model");

        let text = self.model.complete(ChatRequest::deterministic(prompt)).await.map_err(|e| {
            error!(model = self.model.name(), error = %e, "generation failed");
            e
        })?;

        let kind = if is_refusal_text(&text, language) {
            AnswerKind::Refusal
        } else {
            AnswerKind::Grounded
        };
        info!(%language, ?kind, answer_len = text.len(), "answer generated");
        Ok(Answer { text, language, kind })
    }
}

/// Compare ignoring surrounding whitespace and quotes the model may add.
fn is_refusal_text(text: &str, language: Language) -> bool {
    text.trim().trim_matches('"').trim() == language.refusal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Chunk, RetrievalResult};
    use crate::mock::ScriptedChatModel;

    fn context(text: &str) -> EvidenceContext {
        EvidenceContext::new(vec![RetrievalResult {
            chunk: Chunk { content: text.into(), ..Default::default() },
            score: 0.8,
        }])
    }

    #[tokio::test]
    async fn empty_context_refuses_without_calling_model() {
        let model = Arc::new(ScriptedChatModel::always("should not be used"));
        let generator = GroundedAnswerGenerator::new(model.clone());

        let answer =
            generator.answer("Qual é o faturamento?", &EvidenceContext::default()).await.unwrap();

        assert_eq!(answer.text, Language::Portuguese.refusal());
        assert!(answer.is_refusal());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn model_output_is_passed_through_unmodified() {
        let model = Arc::new(ScriptedChatModel::always("  The revenue was $10M.\n"));
        let generator = GroundedAnswerGenerator::new(model.clone());

        let answer =
            generator.answer("What is the revenue?", &context("revenue $10M")).await.unwrap();

        assert_eq!(answer.text, "  The revenue was $10M.\n");
        assert_eq!(answer.kind, AnswerKind::Grounded);
        let request = &model.requests()[0];
        assert_eq!(request.temperature, 0.0);
        assert!(request.prompt.contains("DOCUMENT (Score: 0.80):\nrevenue $10M"));
        assert!(request.prompt.contains("USER QUESTION:\nWhat is the revenue?"));
    }

    #[tokio::test]
    async fn model_refusal_is_classified() {
        let quoted = format!("\"{}\"", Language::English.refusal());
        let model = Arc::new(ScriptedChatModel::always(quoted));
        let generator = GroundedAnswerGenerator::new(model);
        let answer = generator
            .answer("What is the capital of France?", &context("unrelated"))
            .await
            .unwrap();
        assert!(answer.is_refusal());
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let model = Arc::new(ScriptedChatModel::failing("timeout"));
        let generator = GroundedAnswerGenerator::new(model);
        let err = generator.answer("What?", &context("x")).await.unwrap_err();
        assert!(matches!(err, crate::RagError::Generation { .. }));
    }

    #[tokio::test]
    async fn fixed_language_overrides_detection() {
        let generator = GroundedAnswerGenerator::new(Arc::new(ScriptedChatModel::always("-")))
            .with_language_policy(LanguagePolicy::Fixed(Language::Portuguese));
        let answer = generator.answer("What is it?", &EvidenceContext::default()).await.unwrap();
        assert_eq!(answer.text, Language::Portuguese.refusal());
    }
}
