//! Board state of one hosted game.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::{seq::SliceRandom, Rng};
use shakmaty::{fen::Fen, Chess, Color, EnPassantMode, Position};
use shared::{
    board::{descriptor_of, find_move, side_from_color},
    domain::{MoveDescriptor, MoverKind, SessionMode, Side, DRAW_RESULT},
    error::{ApiError, ErrorCode},
    protocol::MoveReply,
};

/// Positions repeated this many times end the game in a draw.
const REPETITION_LIMIT: u32 = 3;

#[derive(Debug, Clone)]
pub struct HostedGame {
    pub player_one: MoverKind,
    pub player_two: MoverKind,
    pub mode: SessionMode,
    pub created_at: DateTime<Utc>,
    position: Chess,
    plies: u32,
    result: Option<f64>,
    repetitions: HashMap<String, u32>,
    draw_halfmove_limit: u32,
}

impl HostedGame {
    pub fn new(
        player_one: MoverKind,
        player_two: MoverKind,
        mode: SessionMode,
        draw_halfmove_limit: u32,
    ) -> Self {
        Self::from_position(player_one, player_two, mode, Chess::default(), draw_halfmove_limit)
    }

    pub fn from_position(
        player_one: MoverKind,
        player_two: MoverKind,
        mode: SessionMode,
        position: Chess,
        draw_halfmove_limit: u32,
    ) -> Self {
        let mut repetitions = HashMap::new();
        repetitions.insert(repetition_key(&position), 1);
        Self {
            player_one,
            player_two,
            mode,
            created_at: Utc::now(),
            position,
            plies: 0,
            result: None,
            repetitions,
            draw_halfmove_limit,
        }
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    pub fn side_to_move(&self) -> Side {
        side_from_color(self.position.turn())
    }

    pub fn plies(&self) -> u32 {
        self.plies
    }

    pub fn result(&self) -> Option<f64> {
        self.result
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// Applies a human move, or picks a uniformly random legal one for an
    /// automated side when `descriptor` is absent.
    pub fn play<R: Rng + ?Sized>(
        &mut self,
        side: Side,
        descriptor: Option<MoveDescriptor>,
        rng: &mut R,
    ) -> Result<MoveReply, ApiError> {
        if self.is_over() {
            return Err(ApiError::new(ErrorCode::Validation, "game is already over"));
        }
        let to_move = self.side_to_move();
        if side != to_move {
            return Err(ApiError::new(
                ErrorCode::Validation,
                format!("it is {to_move}'s turn, not {side}'s"),
            ));
        }

        let human = self.mode.is_human(side);
        let chosen = match (descriptor, human) {
            (Some(descriptor), true) => find_move(&self.position, &descriptor).ok_or_else(|| {
                ApiError::new(ErrorCode::IllegalMove, format!("illegal move {descriptor}"))
            })?,
            (None, false) => self
                .position
                .legal_moves()
                .choose(rng)
                .cloned()
                .ok_or_else(|| ApiError::new(ErrorCode::Internal, "no legal move available"))?,
            (Some(_), false) => {
                return Err(ApiError::new(
                    ErrorCode::Validation,
                    format!("{side} is automated and cannot submit moves"),
                ))
            }
            (None, true) => {
                return Err(ApiError::new(
                    ErrorCode::Validation,
                    format!("{side} is human and must submit a move"),
                ))
            }
        };

        let applied_move = descriptor_of(&chosen).ok_or_else(|| {
            ApiError::new(ErrorCode::Internal, "move does not map to board squares")
        })?;
        let next = self
            .position
            .clone()
            .play(chosen)
            .map_err(|err| ApiError::new(ErrorCode::Internal, err.to_string()))?;
        self.position = next;
        self.plies += 1;
        *self
            .repetitions
            .entry(repetition_key(&self.position))
            .or_insert(0) += 1;
        self.result = self.evaluate();

        Ok(MoveReply {
            applied_move,
            position: self.fen(),
            result: self.result,
        })
    }

    fn evaluate(&self) -> Option<f64> {
        let position = &self.position;
        if position.is_checkmate() {
            // The side to move is the one mated.
            return Some(match position.turn() {
                Color::Black => 1.0,
                Color::White => -1.0,
            });
        }
        let repeated = self
            .repetitions
            .get(&repetition_key(position))
            .is_some_and(|count| *count >= REPETITION_LIMIT);
        if position.is_stalemate()
            || position.is_insufficient_material()
            || position.halfmoves() >= self.draw_halfmove_limit
            || repeated
        {
            return Some(DRAW_RESULT);
        }
        None
    }
}

/// Placement, turn, castling rights and en passant square.
fn repetition_key(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal)
        .to_string()
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "tests/game_tests.rs"]
mod tests;
