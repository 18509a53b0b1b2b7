use tracing::debug;

use crate::error::CallError;
use crate::prompts;
use crate::providers::{GenerationParams, Provider, ProviderResponse};

pub const TRANSLATE_PARAMS: GenerationParams = GenerationParams::new(0.5, 512);
pub const TERM_PARAMS: GenerationParams = GenerationParams::new(0.3, 60);
pub const ROMANIZE_PARAMS: GenerationParams = GenerationParams::new(0.2, 150);
pub const GRAMMAR_PARAMS: GenerationParams = GenerationParams::new(0.4, 250);

/// Stands in for a Romaji line the model did not return.
pub const PLACEHOLDER: &str = "-";

const QUOTE_CHARS: [char; 3] = ['"', '“', '”'];

/// Completion calls used by the assistant, one prompt per request.
#[derive(Debug, Clone)]
pub struct Translator<P: Provider> {
    provider: P,
}

impl<P: Provider> Translator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub async fn translate(&self, text: &str, language: &str) -> Result<String, CallError> {
        let prompt = build(prompts::build_translation_prompt(text, language))?;
        let response = self.complete(prompt, TRANSLATE_PARAMS).await?;
        Ok(response.text)
    }

    /// Single drill token; surrounding quotes the model likes to add are removed.
    pub async fn translate_term(&self, term: &str, language: &str) -> Result<String, CallError> {
        let prompt = build(prompts::build_translation_prompt(term, language))?;
        let response = self.complete(prompt, TERM_PARAMS).await?;
        Ok(strip_quotes(&response.text))
    }

    /// One Romaji entry per term, in input order.
    pub async fn romanize(&self, terms: &[String]) -> Result<Vec<String>, CallError> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = build(prompts::build_romanization_prompt(terms))?;
        let response = self.complete(prompt, ROMANIZE_PARAMS).await?;
        Ok(parse_romanization(&response.text, terms.len()))
    }

    pub async fn explain_grammar(&self, text: &str, language: &str) -> Result<String, CallError> {
        let prompt = build(prompts::build_grammar_prompt(text, language))?;
        let response = self.complete(prompt, GRAMMAR_PARAMS).await?;
        Ok(response.text)
    }

    async fn complete(
        &self,
        prompt: String,
        params: GenerationParams,
    ) -> Result<ProviderResponse, CallError> {
        let mut response = self
            .provider
            .clone()
            .with_generation(params)
            .append_user_input(prompt)
            .complete()
            .await?;
        debug!(
            model = response.model.as_deref().unwrap_or("unavailable"),
            total_tokens = response.usage.as_ref().and_then(|usage| usage.total_tokens),
            "completion finished"
        );
        response.text = response.text.trim().to_string();
        Ok(response)
    }
}

/// Trimmed non-blank lines, padded with [`PLACEHOLDER`] up to `expected`.
/// Extra lines are kept; callers zip positionally.
pub fn parse_romanization(text: &str, expected: usize) -> Vec<String> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if lines.len() < expected {
        lines.resize(expected, PLACEHOLDER.to_string());
    }
    lines
}

pub fn placeholders(count: usize) -> Vec<String> {
    vec![PLACEHOLDER.to_string(); count]
}

pub fn strip_quotes(text: &str) -> String {
    text.trim().trim_matches(&QUOTE_CHARS[..]).trim().to_string()
}

fn build(prompt: anyhow::Result<String>) -> Result<String, CallError> {
    prompt.map_err(|err| CallError::Prompt(format!("{:#}", err)))
}
