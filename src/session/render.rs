use serde::Serialize;

use super::state::SessionState;
use crate::languages::{self, LanguageOption};

const NO_ROMANIZATION: &str = "—";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub translation: Option<TranslationView>,
    pub can_play_audio: bool,
    pub show_romanization: bool,
    pub vocabulary: Vec<VocabularyRow>,
    pub languages: Vec<LanguageOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationView {
    pub text: String,
    pub language: String,
    pub grammar_explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VocabularyRow {
    /// One-based.
    pub number: usize,
    pub original: String,
    pub romanization: String,
    pub translation: String,
}

/// Pure snapshot of what the UI should show for `state`.
pub fn render(state: &SessionState, languages: &[String]) -> View {
    let translation = state.has_translation().then(|| TranslationView {
        text: state.current_translation.clone(),
        language: state.translated_language.clone(),
        grammar_explanation: state.grammar_explanation.clone(),
    });
    let show_romanization = languages::is_japanese(&state.vocabulary_language);
    let vocabulary = state
        .vocabulary
        .iter()
        .enumerate()
        .map(|(index, item)| VocabularyRow {
            number: index + 1,
            original: item.original.clone(),
            romanization: match (&item.romanization, show_romanization) {
                (Some(romaji), true) => romaji.clone(),
                _ => NO_ROMANIZATION.to_string(),
            },
            translation: item.translation.clone(),
        })
        .collect();

    View {
        can_play_audio: translation.is_some(),
        translation,
        show_romanization,
        vocabulary,
        languages: languages::language_options(languages),
    }
}

/// Terminal rendering used by the CLI.
pub fn format_view_text(view: &View) -> String {
    let mut sections = Vec::new();

    if let Some(translation) = &view.translation {
        let mut lines = vec![translation.text.clone()];
        if let Some(explanation) = &translation.grammar_explanation {
            lines.push(String::new());
            lines.push(format!("Grammar ({}):", translation.language));
            lines.push(explanation.clone());
        }
        sections.push(lines.join("\n"));
    }

    if !view.vocabulary.is_empty() {
        let rows = view
            .vocabulary
            .iter()
            .map(|row| {
                if view.show_romanization {
                    format!(
                        "{}.\t{}\t{}\t{}",
                        row.number, row.original, row.romanization, row.translation
                    )
                } else {
                    format!("{}.\t{}\t{}", row.number, row.original, row.translation)
                }
            })
            .collect::<Vec<_>>();
        sections.push(rows.join("\n"));
    }

    sections.join("\n\n")
}
