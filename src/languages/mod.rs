use serde::Serialize;

const FALLBACK_LOCALE: &str = "en-US";

/// Grammar guidance appended to a translation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarHint {
    Polish,
    Japanese,
    Default,
}

impl GrammarHint {
    pub fn for_language(language: &str) -> Self {
        match normalize_name(language).as_str() {
            "polish" => GrammarHint::Polish,
            "japanese" => GrammarHint::Japanese,
            _ => GrammarHint::Default,
        }
    }

    pub fn clause(&self) -> &'static str {
        match self {
            GrammarHint::Polish => {
                "Pay special attention to correct Polish grammar, especially reflexive pronouns like 'się', cases, and verb conjugations. Make sure the translation sounds natural and grammatically correct."
            }
            GrammarHint::Japanese => {
                "Make sure the translation uses natural Japanese grammar and expressions, including proper particles and honorifics."
            }
            GrammarHint::Default => "Keep the translation straightforward and natural.",
        }
    }
}

/// Romaji is only produced for Japanese targets.
pub fn is_japanese(language: &str) -> bool {
    GrammarHint::for_language(language) == GrammarHint::Japanese
}

/// Locale tag for a display language name, `en-US` when unknown.
pub fn locale_code(language: &str) -> &'static str {
    match normalize_name(language).as_str() {
        "english" => "en-US",
        "polish" => "pl-PL",
        "japanese" => "ja-JP",
        _ => FALLBACK_LOCALE,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageOption {
    pub name: String,
    pub locale: String,
}

pub fn language_options(languages: &[String]) -> Vec<LanguageOption> {
    languages
        .iter()
        .map(|name| LanguageOption {
            name: name.clone(),
            locale: locale_code(name).to_string(),
        })
        .collect()
}

/// Surrounding whitespace from form or CLI input is not part of the name.
fn normalize_name(language: &str) -> String {
    language.trim().to_lowercase()
}
