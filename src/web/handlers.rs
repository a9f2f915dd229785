//! HTTP request handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::page::{self, Banner, EMPTY_INPUT_WARNING};
use super::AppState;
use crate::conversation::{ChatError, SessionHandle};
use crate::groq_client::ClientError;

const SESSION_COOKIE: &str = "media_session";

/// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Page
        .route("/", get(index))
        .route("/chat", post(submit_form))
        .route("/reset", post(reset))
        // JSON API
        .route("/api/chat", post(api_chat))
        .route("/api/transcript", get(api_transcript))
        .route("/health", get(health))
        .with_state(state)
}

fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Returns the caller's session id, issuing a cookie for a new one when
/// there is none. No session is allocated until a message is submitted.
fn ensure_cookie(jar: CookieJar) -> (CookieJar, Uuid) {
    match session_id(&jar) {
        Some(id) => (jar, id),
        None => {
            let id = Uuid::new_v4();
            (jar.add(session_cookie(id)), id)
        }
    }
}

async fn session_for(state: &AppState, jar: CookieJar) -> (CookieJar, SessionHandle) {
    let (jar, id) = ensure_cookie(jar);
    (jar, state.sessions.get_or_create(id).await)
}

// ============================================================
// Page
// ============================================================

async fn index(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Html<String>) {
    let (jar, id) = ensure_cookie(jar);
    let html = match state.sessions.get(id).await {
        Some(handle) => {
            let session = handle.lock().await;
            page::render_page(&session.state().transcript(), None)
        }
        None => page::render_page(&[], None),
    };
    (jar, Html(html))
}

#[derive(Debug, Deserialize)]
struct ChatForm {
    #[serde(default)]
    message: String,
}

async fn submit_form(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ChatForm>,
) -> Response {
    let (jar, handle) = session_for(&state, jar).await;
    let mut session = handle.lock().await;

    match state.chat.submit(&mut session, &form.message).await {
        // Redirect so a refresh does not resubmit the form
        Ok(_) => (jar, Redirect::to("/")).into_response(),
        Err(e) => {
            let (status, banner) = if e.is_warning() {
                (StatusCode::OK, Banner::Warning(EMPTY_INPUT_WARNING.to_string()))
            } else {
                (
                    AppError::for_chat(&e).status(),
                    Banner::Error(format!("Não foi possível obter uma resposta: {e}")),
                )
            };
            let html = page::render_page(&session.state().transcript(), Some(&banner));
            (status, jar, Html(html)).into_response()
        }
    }
}

/// Ends the current session and starts the caller on a fresh one.
async fn reset(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(id) = session_id(&jar) {
        state.sessions.remove(id).await;
    }

    (jar.add(session_cookie(Uuid::new_v4())), Redirect::to("/"))
}

// ============================================================
// JSON API
// ============================================================

#[derive(Debug, Deserialize)]
struct ApiChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ApiChatResponse {
    reply: String,
}

async fn api_chat(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<ApiChatRequest>,
) -> Response {
    let (jar, handle) = session_for(&state, jar).await;
    let mut session = handle.lock().await;

    // Failures still carry the session cookie
    match state.chat.submit(&mut session, &req.message).await {
        Ok(reply) => (jar, Json(ApiChatResponse { reply })).into_response(),
        Err(e) => (jar, AppError::for_chat(&e)).into_response(),
    }
}

#[derive(Debug, Serialize)]
struct TurnBody {
    user: String,
    assistant: String,
}

#[derive(Debug, Serialize)]
struct TranscriptResponse {
    session_id: String,
    started_at: Option<String>,
    window_messages: usize,
    turns: Vec<TurnBody>,
}

async fn api_transcript(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<TranscriptResponse>) {
    let (jar, id) = ensure_cookie(jar);

    let body = match state.sessions.get(id).await {
        Some(handle) => {
            let session = handle.lock().await;
            let turns = session
                .state()
                .transcript()
                .into_iter()
                .map(|turn| TurnBody {
                    user: turn.user.to_string(),
                    assistant: turn.assistant.to_string(),
                })
                .collect();

            TranscriptResponse {
                session_id: session.id().to_string(),
                started_at: Some(session.created_at().to_rfc3339()),
                window_messages: session.state().window().len(),
                turns,
            }
        }
        None => TranscriptResponse {
            session_id: id.to_string(),
            started_at: None,
            window_messages: 0,
            turns: Vec::new(),
        },
    };

    (jar, Json(body))
}

async fn health() -> &'static str {
    "ok"
}

// ============================================================
// Errors
// ============================================================

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    BadGateway(String),
    GatewayTimeout(String),
}

impl AppError {
    fn for_chat(error: &ChatError) -> Self {
        let message = error.to_string();
        match error {
            ChatError::EmptyInput => AppError::BadRequest(message),
            ChatError::Client(ClientError::Timeout(_)) => AppError::GatewayTimeout(message),
            ChatError::Client(_) => AppError::BadGateway(message),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest(msg) | AppError::BadGateway(msg) | AppError::GatewayTimeout(msg) => msg,
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
