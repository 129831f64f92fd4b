//! Error taxonomy for game setup, session opening and round trips.

use shared::{
    domain::{MoveDescriptor, Side, Square},
    error::ApiError,
};
use thiserror::Error;

/// Mover selection problems, reported before any session is opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no mover selected for player {player}")]
    Unselected { player: u8 },
    #[error("invalid move service url '{url}': {reason}")]
    InvalidServiceUrl { url: String, reason: String },
}

/// Failure talking to the remote move service.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("move service unreachable: {0}")]
    Transport(String),
    #[error("move service rejected the request ({status}): {error}")]
    Rejected { status: u16, error: ApiError },
    #[error("malformed move service response: {0}")]
    Decode(String),
}

/// Opening the session failed; the game cannot start.
#[derive(Debug, Clone, Error)]
#[error("failed to open game session: {0}")]
pub struct SessionOpenError(#[from] pub ServiceError);

/// A round trip that ended without an applied move.
#[derive(Debug, Clone, Error)]
pub enum RoundTripError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("illegal move {0}")]
    IllegalMove(MoveDescriptor),
    #[error("move service applied {applied} but reported position '{reported}' instead of '{expected}'")]
    Desync {
        applied: MoveDescriptor,
        expected: String,
        reported: String,
    },
}

/// Why a drag or drop was refused before any remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GestureRejection {
    #[error("the game session is still initializing")]
    Initializing,
    #[error("the game is over")]
    GameOver,
    #[error("a move is already being resolved")]
    Busy,
    #[error("{side} is not moved by a human in this game")]
    NotHumanTurn { side: Side },
    #[error("no {side} piece on {square}")]
    NoMovablePiece { side: Side, square: Square },
}
