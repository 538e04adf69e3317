//! HTTP front-end
//!
//! | Route | Method | |
//! |-------|--------|-|
//! | `/prediction` | POST | Profile JSON in, reading out |
//! | `/prediction` | HEAD | Liveness probe used by the web client |
//! | `/chat` | POST | One conversation turn; the last turn runs the reading |
//! | `/chat/{session_id}` | DELETE | Forget a conversation |
//! | `/health` | GET | Status and version |
//!
//! Malformed input is rejected with 400 before the engine is called. Engine
//! failures become 500 with the redacted error text.

mod routes;
mod session;

pub use routes::{ChatRequest, ChatResponse, PredictionResponse};
pub use session::SessionStore;

use std::io;

use axum::Router;
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;
use tracing::info;

use augur_engine::PredictionEngine;

#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: PredictionEngine,
    pub sessions: SessionStore,
}

impl AppState {
    #[must_use]
    pub fn new(engine: PredictionEngine) -> Self {
        Self {
            engine,
            sessions: SessionStore::new(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/prediction", post(routes::prediction).head(routes::prediction_head))
        .route("/chat", post(routes::chat))
        .route("/chat/{session_id}", delete(routes::end_chat))
        .route("/health", get(routes::health))
        .with_state(state)
}

/// Serve until Ctrl-C, then drain in-flight requests.
///
/// # Errors
///
/// Fails if the address cannot be bound or the server stops unexpectedly.
pub async fn serve(address: &str, state: AppState) -> io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!(address = %listener.local_addr()?, "Listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
}

async fn wait_for_shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
