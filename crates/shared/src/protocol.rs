use serde::{Deserialize, Serialize};

use crate::domain::{GameOutcome, MoveDescriptor, MoverKind, SessionId, SessionMode, Side};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenSessionRequest {
    pub player_one: MoverKind,
    pub player_two: MoverKind,
    pub mode: SessionMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenSessionResponse {
    pub session_id: SessionId,
}

/// One round trip: a human move when `descriptor` is present, otherwise a
/// request for the service to pick the move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub side: Side,
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<MoveDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveReply {
    pub applied_move: MoveDescriptor,
    /// FEN of the position after `applied_move`.
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
}

impl MoveReply {
    pub fn outcome(&self) -> GameOutcome {
        GameOutcome::from_result(self.result)
    }
}
