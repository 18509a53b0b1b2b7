use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::state::SessionState;

/// A user-triggered event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Translate { text: String, language: String },
    PlayAudio,
    DrillVocabulary { text: String, language: String },
    /// Zero-based position in the vocabulary list.
    PlayItemAudio { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[derive(Debug, Clone)]
pub struct AudioClip {
    pub path: PathBuf,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Result of dispatching one action.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: SessionState,
    pub notices: Vec<Notice>,
    pub audio: Option<AudioClip>,
}

impl Outcome {
    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(Notice::is_error)
    }
}
