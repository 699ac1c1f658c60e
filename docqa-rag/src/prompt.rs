//! The grounded-answer prompt and its language handling.
//!
//! One parameterized template serves every supported language. The
//! [`Language`] picks the refusal sentence, the answer-language instruction
//! and the out-of-context examples.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// A natural language the pipeline can answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    #[default]
    English,
    /// Portuguese.
    Portuguese,
}

impl Language {
    /// The fixed sentence returned when the evidence does not answer the question.
    pub fn refusal(self) -> &'static str {
        match self {
            Language::English => "I don't have the necessary information to answer your question.",
            Language::Portuguese => {
                "Não tenho as informações necessárias para responder à sua pergunta."
            }
        }
    }

    /// The rule line telling the model which language to answer in.
    fn instruction(self) -> &'static str {
        match self {
            Language::English => {
                "Always answer in English, the same language as the USER QUESTION."
            }
            Language::Portuguese => {
                "Always answer in Portuguese, the same language as the USER QUESTION."
            }
        }
    }

    fn out_of_context_questions(self) -> [&'static str; 3] {
        match self {
            Language::English => [
                "What is the capital of France?",
                "How many clients do we have in 2024?",
                "Do you think this is good or bad?",
            ],
            Language::Portuguese => [
                "Qual é a capital da França?",
                "Quantos clientes temos em 2024?",
                "Você acha isso bom ou ruim?",
            ],
        }
    }

    /// Guess the language of `text` from accented letters and function words.
    ///
    /// Falls back to English when the evidence is even.
    pub fn detect(text: &str) -> Language {
        const PT_WORDS: &[&str] = &[
            "o", "a", "os", "as", "um", "uma", "de", "do", "da", "dos", "das", "em", "no", "na",
            "para", "por", "que", "qual", "quais", "quem", "quando", "onde", "como", "quanto",
            "quantos", "quantas", "é", "são", "foi", "foram", "tem", "têm", "não", "sim", "empresa",
            "ano", "faturamento", "receita", "você",
        ];
        const EN_WORDS: &[&str] = &[
            "the", "a", "an", "of", "in", "on", "for", "to", "is", "are", "was", "were", "what",
            "which", "who", "when", "where", "how", "many", "much", "does", "do", "did", "has",
            "have", "company", "year", "revenue", "you",
        ];
        const PT_LETTERS: &[char] = &['ã', 'õ', 'ç', 'á', 'é', 'í', 'ó', 'ú', 'â', 'ê', 'ô', 'à'];

        let lowered = text.to_lowercase();
        let mut pt = lowered.chars().filter(|c| PT_LETTERS.contains(c)).count();
        let mut en = 0;

        for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            // Words shared by both lists ("a") count for neither.
            let in_pt = PT_WORDS.contains(&word);
            let in_en = EN_WORDS.contains(&word);
            match (in_pt, in_en) {
                (true, false) => pt += 1,
                (false, true) => en += 1,
                _ => {}
            }
        }

        if pt > en { Language::Portuguese } else { Language::English }
    }

    /// Short code used in configuration (`en`, `pt`).
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Portuguese => "pt",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "pt" | "pt-br" | "portuguese" => Ok(Language::Portuguese),
            other => Err(RagError::Config(format!("unsupported language '{other}'"))),
        }
    }
}

/// How the answer language is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LanguagePolicy {
    /// Detect the language of each question.
    #[default]
    Auto,
    /// Always answer in the given language.
    Fixed(Language),
}

impl LanguagePolicy {
    /// Resolve the answer language for `question`.
    pub fn resolve(self, question: &str) -> Language {
        match self {
            LanguagePolicy::Auto => Language::detect(question),
            LanguagePolicy::Fixed(language) => language,
        }
    }
}

impl FromStr for LanguagePolicy {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(LanguagePolicy::Auto);
        }
        s.parse().map(LanguagePolicy::Fixed)
    }
}

const GROUNDED_TEMPLATE: &str = r#"CONTEXT:
{context}

RULES:
- Answer only based on the CONTEXT.
- If the information is not explicitly in the CONTEXT, respond exactly:
  "{refusal}"
- Never invent or use external knowledge.
- Never produce opinions or interpretations beyond what is written.
- {language_instruction}

Examples of words to be translated:
- "faturamento" -> "revenue"
- "ano de fundação" -> "foundation year"

EXAMPLES OF QUESTIONS OUTSIDE THE CONTEXT:
{out_of_context_examples}

USER QUESTION:
{question}

ANSWER THE "USER QUESTION"
"#;

/// A prompt template with `{context}` and `{question}` placeholders.
///
/// `{refusal}`, `{language_instruction}` and `{out_of_context_examples}` are
/// filled from the answer [`Language`]. Substitution is single-pass, so
/// braces inside the context or the question are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: GROUNDED_TEMPLATE.to_string() }
    }
}

impl PromptTemplate {
    /// Use a custom template.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `{context}` or `{question}` is missing.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in ["{context}", "{question}"] {
            if !template.contains(placeholder) {
                return Err(RagError::Config(format!("prompt template is missing {placeholder}")));
            }
        }
        Ok(Self { template })
    }

    /// Render the prompt for one question.
    pub fn render(&self, context: &str, question: &str, language: Language) -> String {
        let examples = language
            .out_of_context_questions()
            .iter()
            .map(|q| format!("Question: \"{q}\"\nAnswer: \"{}\"", language.refusal()))
            .collect::<Vec<_>>()
            .join("\n\n");

        substitute(&self.template, |name| match name {
            "context" => Some(context),
            "question" => Some(question),
            "refusal" => Some(language.refusal()),
            "language_instruction" => Some(language.instruction()),
            "out_of_context_examples" => Some(examples.as_str()),
            _ => None,
        })
    }
}

/// Replace `{name}` placeholders in one pass; unknown names are kept verbatim.
fn substitute<'a, F>(template: &str, value: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_placeholder_name(&after[..close]) => {
                let name = &after[..close];
                match value(name) {
                    Some(v) => out.push_str(v),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_placeholder_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_english_questions() {
        assert_eq!(
            Language::detect("What is the revenue of Alfa Energia Holding?"),
            Language::English
        );
        assert_eq!(Language::detect("What is the capital of France?"), Language::English);
    }

    #[test]
    fn detects_portuguese_questions() {
        assert_eq!(
            Language::detect("Qual é o faturamento da Alfa Energia Holding?"),
            Language::Portuguese
        );
        assert_eq!(Language::detect("Quantos clientes temos em 2024?"), Language::Portuguese);
    }

    #[test]
    fn empty_text_defaults_to_english() {
        assert_eq!(Language::detect(""), Language::English);
    }

    #[test]
    fn policy_parses_from_config_values() {
        assert_eq!("auto".parse::<LanguagePolicy>().unwrap(), LanguagePolicy::Auto);
        let parse = |s: &str| s.parse::<LanguagePolicy>().unwrap();
        assert_eq!(parse("PT"), LanguagePolicy::Fixed(Language::Portuguese));
        assert_eq!(parse("english"), LanguagePolicy::Fixed(Language::English));
        assert!("klingon".parse::<LanguagePolicy>().is_err());
    }

    #[test]
    fn fixed_policy_ignores_question_language() {
        let policy = LanguagePolicy::Fixed(Language::Portuguese);
        assert_eq!(policy.resolve("What is the revenue?"), Language::Portuguese);
    }

    #[test]
    fn render_fills_every_placeholder() {
        let prompt = PromptTemplate::default().render(
            "DOCUMENT (Score: 0.91):\nfacts",
            "Who?",
            Language::English,
        );
        assert!(prompt.contains("DOCUMENT (Score: 0.91):\nfacts"));
        assert!(prompt.contains("USER QUESTION:\nWho?"));
        assert!(prompt.contains(Language::English.refusal()));
        assert!(prompt.contains("Always answer in English"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn render_uses_language_specific_refusal_and_examples() {
        let prompt =
            PromptTemplate::default().render("ctx", "Qual é a receita?", Language::Portuguese);
        assert!(prompt.contains(Language::Portuguese.refusal()));
        assert!(prompt.contains("Qual é a capital da França?"));
        assert!(!prompt.contains(Language::English.refusal()));
    }

    #[test]
    fn braces_in_inputs_are_not_expanded() {
        let prompt = PromptTemplate::new("{context}|{question}").unwrap();
        let rendered = prompt.render("{question}", "{context}", Language::English);
        assert_eq!(rendered, "{question}|{context}");
    }

    #[test]
    fn custom_template_requires_placeholders() {
        assert!(PromptTemplate::new("no placeholders").is_err());
        assert!(PromptTemplate::new("{context} only").is_err());
    }
}
