use serde::Serialize;

use crate::languages::LanguageOption;
use crate::session::{Notice, SessionId, View};

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) id: SessionId,
    pub(crate) view: View,
}

#[derive(Debug, Serialize)]
pub(crate) struct ActionResponse {
    pub(crate) view: View,
    pub(crate) notices: Vec<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) audio: Option<AudioPayload>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AudioPayload {
    pub(crate) mime: String,
    pub(crate) data_base64: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LanguagesResponse {
    pub(crate) languages: Vec<LanguageOption>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
