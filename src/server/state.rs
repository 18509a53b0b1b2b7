use crate::providers::{Provider, SpeechProvider};
use crate::session::{Assistant, SessionStore};

pub(crate) struct ServerState<P: Provider, S: SpeechProvider> {
    pub(crate) assistant: Assistant<P, S>,
    pub(crate) store: Box<dyn SessionStore>,
    pub(crate) languages: Vec<String>,
    pub(crate) page: String,
}
