use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::client::render_client_html;
use super::models::{ActionResponse, ErrorResponse, LanguagesResponse, SessionResponse};
use super::sessions::{self, ServerError};
use super::state::ServerState;
use crate::languages;
use crate::providers::{Provider, SpeechProvider};
use crate::session::{Action, MemorySessionStore};
use crate::settings::Settings;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Sessions whose page closed without sending DELETE.
const SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

pub async fn run_server(settings: Settings, key: Option<String>, addr: String) -> Result<()> {
    let state = Arc::new(ServerState {
        assistant: crate::build_assistant(&settings, key, None),
        store: Box::new(MemorySessionStore::with_idle_ttl(SESSION_IDLE_TTL)),
        page: render_client_html(&settings.languages)?,
        languages: settings.languages,
    });
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| "failed to bind server address")?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn router<P, S>(state: Arc<ServerState<P, S>>) -> Router
where
    P: Provider + 'static,
    S: SpeechProvider + 'static,
{
    Router::new()
        .route("/", get(index::<P, S>))
        .route("/health", get(health))
        .route("/api/languages", get(languages_list::<P, S>))
        .route("/api/sessions", post(create_session::<P, S>))
        .route(
            "/api/sessions/:id",
            get(session_view::<P, S>).delete(remove_session::<P, S>),
        )
        .route("/api/sessions/:id/actions", post(dispatch_action::<P, S>))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,DELETE,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
}

async fn index<P: Provider, S: SpeechProvider>(
    State(state): State<Arc<ServerState<P, S>>>,
) -> Html<String> {
    Html(state.page.clone())
}

async fn languages_list<P: Provider, S: SpeechProvider>(
    State(state): State<Arc<ServerState<P, S>>>,
) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: languages::language_options(&state.languages),
    })
}

async fn create_session<P: Provider, S: SpeechProvider>(
    State(state): State<Arc<ServerState<P, S>>>,
) -> (StatusCode, Json<SessionResponse>) {
    (StatusCode::CREATED, Json(sessions::create_session(&state)))
}

async fn session_view<P: Provider, S: SpeechProvider>(
    State(state): State<Arc<ServerState<P, S>>>,
    Path(raw): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = sessions::parse_session_id(&raw).map_err(error_response)?;
    sessions::session_view(&state, &id)
        .map(Json)
        .map_err(error_response)
}

async fn remove_session<P: Provider, S: SpeechProvider>(
    State(state): State<Arc<ServerState<P, S>>>,
    Path(raw): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = sessions::parse_session_id(&raw).map_err(error_response)?;
    sessions::remove_session(&state, &id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(error_response)
}

async fn dispatch_action<P: Provider, S: SpeechProvider>(
    State(state): State<Arc<ServerState<P, S>>>,
    Path(raw): Path<String>,
    payload: Result<Json<Action>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let id = sessions::parse_session_id(&raw).map_err(error_response)?;
    let Json(action) = payload
        .map_err(|err| error_response(ServerError::bad_request(err.body_text())))?;
    sessions::apply_action(&state, &id, action)
        .await
        .map(Json)
        .map_err(error_response)
}

fn error_response(err: ServerError) -> ApiError {
    (err.status, Json(ErrorResponse { error: err.message }))
}
