use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use augur_engine::ConversationStep;
use augur_utils::redaction::redact_secrets;
use augur_utils::types::{Profile, ResultBundle, SEGMENT_COUNT};

use super::AppState;

const NO_STORE: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

/// Body of a successful prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub text: String,
    pub segments: [String; SEGMENT_COUNT],
    /// Base64-encoded image bytes, index-aligned with `segments`
    pub images: [String; SEGMENT_COUNT],
    pub prompts: [String; SEGMENT_COUNT],
}

impl From<ResultBundle> for PredictionResponse {
    fn from(bundle: ResultBundle) -> Self {
        Self {
            text: bundle.text,
            segments: bundle.segments,
            images: bundle
                .images
                .map(|image| image.map(|bytes| STANDARD.encode(bytes)).unwrap_or_default()),
            prompts: bundle.prompts,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub complete: bool,
    pub step: ConversationStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionResponse>,
}

fn text_response(status: StatusCode, body: impl Into<String>) -> Response<Body> {
    let mut response = Response::new(Body::from(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

fn no_store(mut response: Response<Body>) -> Response<Body> {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    response
}

pub(super) async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(super) async fn prediction_head() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub(super) async fn prediction(State(state): State<AppState>, body: Bytes) -> Response<Body> {
    let profile: Profile = match serde_json::from_slice(&body) {
        Ok(profile) => profile,
        Err(err) => {
            warn!(error = %err, "Rejected prediction request body");
            return text_response(StatusCode::BAD_REQUEST, "Invalid JSON in request body");
        }
    };
    if let Err(err) = profile.validate() {
        return text_response(StatusCode::BAD_REQUEST, format!("Invalid profile: {err}"));
    }

    info!(topic = %profile.topic, "Prediction requested");
    no_store(run_prediction(&state, &profile).await)
}

async fn run_prediction(state: &AppState, profile: &Profile) -> Response<Body> {
    match state.engine.request_prediction(profile).await {
        Ok(bundle) => Json(PredictionResponse::from(bundle)).into_response(),
        Err(err) => text_response(StatusCode::INTERNAL_SERVER_ERROR, redact_secrets(&err.to_string())),
    }
}

pub(super) async fn chat(State(state): State<AppState>, body: Bytes) -> Response<Body> {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(_) => return text_response(StatusCode::BAD_REQUEST, "Invalid JSON in request body"),
    };
    let session_id = request.session_id.trim();
    if session_id.is_empty() {
        return text_response(StatusCode::BAD_REQUEST, "session_id must not be empty");
    }

    let (turn, step) = state.sessions.advance(session_id, &request.message).await;
    let Some(profile) = turn.profile else {
        return Json(ChatResponse {
            reply: turn.reply,
            complete: false,
            step,
            prediction: None,
        })
        .into_response();
    };

    info!(session_id = %session_id, topic = %profile.topic, "Conversation complete");
    match state.engine.request_prediction(&profile).await {
        Ok(bundle) => no_store(
            Json(ChatResponse {
                reply: turn.reply,
                complete: true,
                step,
                prediction: Some(bundle.into()),
            })
            .into_response(),
        ),
        Err(err) => text_response(StatusCode::INTERNAL_SERVER_ERROR, redact_secrets(&err.to_string())),
    }
}

pub(super) async fn end_chat(State(state): State<AppState>, Path(session_id): Path<String>) -> StatusCode {
    if state.sessions.remove(&session_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
