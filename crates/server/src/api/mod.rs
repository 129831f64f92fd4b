use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{MoverKind, SessionId, SessionMode},
    error::{ApiError, ErrorCode},
    protocol::{MoveReply, MoveRequest, OpenSessionRequest, OpenSessionResponse},
};
use tokio::sync::Mutex;
use tracing::{debug, info};

mod game;

use game::HostedGame;

const SESSION_ID_LEN: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct GameLimits {
    pub max_sessions: usize,
    pub draw_halfmove_limit: u32,
}

#[derive(Clone)]
pub struct ApiContext {
    games: Arc<Mutex<HashMap<SessionId, HostedGame>>>,
    pub limits: GameLimits,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub player_one: MoverKind,
    pub player_two: MoverKind,
    pub mode: SessionMode,
    pub position: String,
    pub plies: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl ApiContext {
    pub fn new(limits: GameLimits) -> Self {
        Self {
            games: Arc::new(Mutex::new(HashMap::new())),
            limits,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.games.lock().await.len()
    }

    /// Registers a prepared game under a fresh id. Finished games only
    /// count against the limit until a new game needs their slot.
    pub async fn insert_game(&self, game: HostedGame) -> Result<SessionId, ApiError> {
        let mut games = self.games.lock().await;
        if games.len() >= self.limits.max_sessions {
            let before = games.len();
            games.retain(|_, hosted| !hosted.is_over());
            debug!(evicted = before - games.len(), "finished sessions evicted");
        }
        if games.len() >= self.limits.max_sessions {
            return Err(ApiError::new(
                ErrorCode::RateLimited,
                format!("session limit of {} reached", self.limits.max_sessions),
            ));
        }
        let session_id = loop {
            let candidate = new_session_id();
            if !games.contains_key(&candidate) {
                break candidate;
            }
        };
        games.insert(session_id.clone(), game);
        Ok(session_id)
    }
}

pub async fn open_session(
    ctx: &ApiContext,
    request: OpenSessionRequest,
) -> Result<OpenSessionResponse, ApiError> {
    let implied = SessionMode::from_movers(&request.player_one, &request.player_two);
    if implied != request.mode {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!(
                "mode {} does not match movers {} / {} (expected {implied})",
                request.mode, request.player_one, request.player_two
            ),
        ));
    }

    let game = HostedGame::new(
        request.player_one,
        request.player_two,
        request.mode,
        ctx.limits.draw_halfmove_limit,
    );
    let session_id = ctx.insert_game(game).await?;
    let active = ctx.session_count().await;
    info!(
        %session_id,
        mode = %request.mode,
        active,
        "session opened"
    );
    Ok(OpenSessionResponse { session_id })
}

pub async fn play_move(
    ctx: &ApiContext,
    session_id: &SessionId,
    request: MoveRequest,
) -> Result<MoveReply, ApiError> {
    let mut games = ctx.games.lock().await;
    let game = games.get_mut(session_id).ok_or_else(|| not_found(session_id))?;
    let reply = game.play(request.side, request.descriptor, &mut rand::thread_rng())?;
    debug!(
        %session_id,
        side = %request.side,
        applied = %reply.applied_move,
        result = ?reply.result,
        "move played"
    );
    if let Some(result) = reply.result {
        info!(%session_id, result, plies = game.plies(), "game finished");
    }
    Ok(reply)
}

pub async fn session_summary(
    ctx: &ApiContext,
    session_id: &SessionId,
) -> Result<SessionSummary, ApiError> {
    let games = ctx.games.lock().await;
    let game = games.get(session_id).ok_or_else(|| not_found(session_id))?;
    Ok(SessionSummary {
        session_id: session_id.clone(),
        player_one: game.player_one.clone(),
        player_two: game.player_two.clone(),
        mode: game.mode,
        position: game.fen(),
        plies: game.plies(),
        result: game.result(),
        created_at: game.created_at,
    })
}

pub fn sessions_route() -> &'static str {
    "/sessions"
}

pub fn moves_route() -> &'static str {
    "/sessions/:session_id/moves"
}

fn new_session_id() -> SessionId {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect();
    SessionId(token)
}

fn not_found(session_id: &SessionId) -> ApiError {
    ApiError::new(ErrorCode::NotFound, format!("unknown session {session_id}"))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
