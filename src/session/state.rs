use serde::{Deserialize, Serialize};

/// Everything one interactive session remembers between actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_translation: String,
    pub translated_language: String,
    pub grammar_explanation: Option<String>,
    pub vocabulary: Vec<VocabularyItem>,
    /// Target language of the latest drill.
    pub vocabulary_language: String,
    pub last_input_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub original: String,
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub romanization: Option<String>,
}

impl SessionState {
    pub fn has_translation(&self) -> bool {
        !self.current_translation.trim().is_empty()
    }
}
