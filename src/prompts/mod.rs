use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

use crate::languages::GrammarHint;

const TRANSLATE_TEMPLATE: &str = include_str!("templates/translate.tera");
const ROMANIZE_TEMPLATE: &str = include_str!("templates/romanize.tera");
const GRAMMAR_TEMPLATE: &str = include_str!("templates/grammar.tera");

/// Literal, uncensored translation instruction for `text`.
///
/// The grammar hint is chosen by a case-insensitive match on `target_language`;
/// unknown languages get the plain "straightforward and natural" clause.
pub fn build_translation_prompt(text: &str, target_language: &str) -> Result<String> {
    let hint = GrammarHint::for_language(target_language);
    let mut context = TeraContext::new();
    context.insert("text", text);
    context.insert("target_language", target_language);
    context.insert("grammar_hint", hint.clause());
    render(TRANSLATE_TEMPLATE, &context, "translation")
}

pub fn build_romanization_prompt(terms: &[String]) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("terms", &terms.join("\n"));
    render(ROMANIZE_TEMPLATE, &context, "romanization")
}

pub fn build_grammar_prompt(text: &str, language: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("text", text);
    context.insert("language", language);
    render(GRAMMAR_TEMPLATE, &context, "grammar")
}

fn render(template: &str, context: &TeraContext, name: &str) -> Result<String> {
    let rendered = Tera::one_off(template, context, false)
        .with_context(|| format!("failed to render {} prompt", name))?;
    Ok(rendered.trim_end().to_string())
}
