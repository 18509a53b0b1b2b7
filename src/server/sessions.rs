use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::info;

use super::models::{ActionResponse, AudioPayload, SessionResponse};
use super::state::ServerState;
use crate::providers::{Provider, SpeechProvider};
use crate::session::{render, Action, AudioClip, SessionId};

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    fn not_found(id: &SessionId) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("session {} not found", id),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

pub(crate) fn parse_session_id(raw: &str) -> Result<SessionId, ServerError> {
    raw.trim()
        .parse::<SessionId>()
        .map_err(|_| ServerError::bad_request(format!("invalid session id: {}", raw)))
}

pub(crate) fn create_session<P: Provider, S: SpeechProvider>(
    state: &ServerState<P, S>,
) -> SessionResponse {
    let id = state.store.create();
    info!("session {} created", id);
    let view = state
        .store
        .load(&id)
        .map(|session| render(&session, &state.languages))
        .unwrap_or_else(|| render(&Default::default(), &state.languages));
    SessionResponse { id, view }
}

pub(crate) fn session_view<P: Provider, S: SpeechProvider>(
    state: &ServerState<P, S>,
    id: &SessionId,
) -> Result<SessionResponse, ServerError> {
    let session = state.store.load(id).ok_or_else(|| ServerError::not_found(id))?;
    Ok(SessionResponse {
        id: *id,
        view: render(&session, &state.languages),
    })
}

pub(crate) fn remove_session<P: Provider, S: SpeechProvider>(
    state: &ServerState<P, S>,
    id: &SessionId,
) -> Result<(), ServerError> {
    if state.store.remove(id) {
        info!("session {} discarded", id);
        Ok(())
    } else {
        Err(ServerError::not_found(id))
    }
}

pub(crate) async fn apply_action<P: Provider, S: SpeechProvider>(
    state: &ServerState<P, S>,
    id: &SessionId,
    action: Action,
) -> Result<ActionResponse, ServerError> {
    let session = state.store.load(id).ok_or_else(|| ServerError::not_found(id))?;
    let outcome = state.assistant.dispatch(session, action).await;
    if !state.store.save(id, outcome.state.clone()) {
        return Err(ServerError::not_found(id));
    }
    Ok(ActionResponse {
        view: render(&outcome.state, &state.languages),
        notices: outcome.notices,
        audio: outcome.audio.map(audio_payload),
    })
}

fn audio_payload(clip: AudioClip) -> AudioPayload {
    AudioPayload {
        mime: clip.mime,
        data_base64: BASE64.encode(&clip.bytes),
    }
}
