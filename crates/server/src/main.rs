use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::SessionId,
    error::{ApiError, ErrorCode},
    protocol::{MoveReply, MoveRequest, OpenSessionRequest, OpenSessionResponse},
};
use tracing::{info, warn};

mod api;
mod config;

use api::{
    moves_route, open_session, play_move, session_summary, sessions_route, ApiContext, GameLimits,
    SessionSummary,
};
use config::load_settings;

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings()?;
    let api = ApiContext::new(GameLimits {
        max_sessions: settings.max_sessions,
        draw_halfmove_limit: settings.draw_halfmove_limit,
    });
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        max_sessions = settings.max_sessions,
        draw_halfmove_limit = settings.draw_halfmove_limit,
        "move service listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(sessions_route(), post(http_open_session))
        .route("/sessions/:session_id", get(http_session_summary))
        .route(moves_route(), post(http_play_move))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_open_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<Json<OpenSessionResponse>, HttpError> {
    open_session(&state.api, req)
        .await
        .map(Json)
        .map_err(into_http)
}

async fn http_play_move(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MoveReply>, HttpError> {
    play_move(&state.api, &SessionId(session_id), req)
        .await
        .map(Json)
        .map_err(into_http)
}

async fn http_session_summary(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSummary>, HttpError> {
    session_summary(&state.api, &SessionId(session_id))
        .await
        .map(Json)
        .map_err(into_http)
}

fn into_http(error: ApiError) -> HttpError {
    let status = match error.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation | ErrorCode::IllegalMove => StatusCode::BAD_REQUEST,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(status = status.as_u16(), code = ?error.code, message = %error.message, "request rejected");
    (status, Json(error))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
