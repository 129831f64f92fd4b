//! Legality capability consumed by the session core.
//!
//! The core never reasons about chess itself; it asks a [`Rules`]
//! implementation to apply candidate moves, list targets for highlighting
//! and describe positions. [`ShakmatyRules`] backs it with `shakmaty`.

use std::fmt;

use shakmaty::{fen::Fen, san::San, CastlingMode, Chess, EnPassantMode, Position, Role};
use shared::{
    board::{board_target, find_move, from_shakmaty_square, side_from_color, to_shakmaty_square},
    domain::{MoveDescriptor, Side, Square},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPiece {
    pub side: Side,
    pub kind: PieceKind,
}

/// Result of a validator-confirmed move.
#[derive(Debug, Clone)]
pub struct AppliedMove<P> {
    pub position: P,
    pub san: String,
}

pub trait Rules: Clone + Send + Sync + 'static {
    type Position: Clone + fmt::Debug + Send + Sync + 'static;

    fn initial_position(&self) -> Self::Position;

    fn parse_position(&self, notation: &str) -> Option<Self::Position>;

    /// FEN of `position`.
    fn notation(&self, position: &Self::Position) -> String;

    fn side_to_move(&self, position: &Self::Position) -> Side;

    fn piece_at(&self, position: &Self::Position, square: Square) -> Option<BoardPiece>;

    /// `None` when the move is illegal in `position`.
    fn apply_move(
        &self,
        position: &Self::Position,
        descriptor: &MoveDescriptor,
    ) -> Option<AppliedMove<Self::Position>>;

    fn legal_targets(&self, position: &Self::Position, square: Square) -> Vec<Square>;

    /// Checkmate, stalemate or insufficient material.
    fn is_finished(&self, position: &Self::Position) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyRules;

impl Rules for ShakmatyRules {
    type Position = Chess;

    fn initial_position(&self) -> Chess {
        Chess::default()
    }

    fn parse_position(&self, notation: &str) -> Option<Chess> {
        let fen: Fen = notation.parse().ok()?;
        fen.into_position(CastlingMode::Standard).ok()
    }

    fn notation(&self, position: &Chess) -> String {
        Fen::from_position(position, EnPassantMode::Legal).to_string()
    }

    fn side_to_move(&self, position: &Chess) -> Side {
        side_from_color(position.turn())
    }

    fn piece_at(&self, position: &Chess, square: Square) -> Option<BoardPiece> {
        position
            .board()
            .piece_at(to_shakmaty_square(square))
            .map(|piece| BoardPiece {
                side: side_from_color(piece.color),
                kind: piece_kind(piece.role),
            })
    }

    fn apply_move(
        &self,
        position: &Chess,
        descriptor: &MoveDescriptor,
    ) -> Option<AppliedMove<Chess>> {
        let m = find_move(position, descriptor)?;
        let san = San::from_move(position, m.clone()).to_string();
        let position = position.clone().play(m).ok()?;
        Some(AppliedMove { position, san })
    }

    fn legal_targets(&self, position: &Chess, square: Square) -> Vec<Square> {
        let from = to_shakmaty_square(square);
        let mut targets: Vec<Square> = position
            .legal_moves()
            .iter()
            .filter(|m| m.from() == Some(from))
            .filter_map(|m| from_shakmaty_square(board_target(m)))
            .collect();
        targets.sort_by_key(|sq| (sq.rank(), sq.file()));
        targets.dedup();
        targets
    }

    fn is_finished(&self, position: &Chess) -> bool {
        position.is_checkmate() || position.is_stalemate() || position.is_insufficient_material()
    }
}

fn piece_kind(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(text: &str) -> MoveDescriptor {
        text.parse().expect("descriptor")
    }

    fn square(name: &str) -> Square {
        name.parse().expect("square")
    }

    #[test]
    fn applies_legal_move_and_reports_san() {
        let rules = ShakmatyRules;
        let start = rules.initial_position();
        let applied = rules
            .apply_move(&start, &descriptor("e2e4"))
            .expect("legal");
        assert_eq!(applied.san, "e4");
        assert_eq!(rules.side_to_move(&applied.position), Side::Black);
        assert!(rules
            .notation(&applied.position)
            .starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"));
    }

    #[test]
    fn rejects_illegal_move_without_touching_position() {
        let rules = ShakmatyRules;
        let start = rules.initial_position();
        assert!(rules.apply_move(&start, &descriptor("e2e5")).is_none());
        assert!(rules.apply_move(&start, &descriptor("e7e5")).is_none());
        assert_eq!(rules.notation(&start), rules.notation(&Chess::default()));
    }

    #[test]
    fn promotion_requires_matching_piece() {
        let rules = ShakmatyRules;
        let position = rules
            .parse_position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1")
            .expect("fen");
        assert!(rules.apply_move(&position, &descriptor("e7e8")).is_none());
        let applied = rules
            .apply_move(&position, &descriptor("e7e8q"))
            .expect("promotion");
        assert_eq!(applied.san, "e8=Q");
        let piece = rules.piece_at(&applied.position, square("e8")).expect("queen");
        assert_eq!(piece.kind, PieceKind::Queen);
    }

    #[test]
    fn castling_uses_king_destination() {
        let rules = ShakmatyRules;
        let position = rules
            .parse_position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1")
            .expect("fen");
        let targets = rules.legal_targets(&position, square("e1"));
        assert!(targets.contains(&square("g1")));
        assert!(targets.contains(&square("c1")));
        let applied = rules
            .apply_move(&position, &descriptor("e1g1"))
            .expect("castle");
        assert_eq!(applied.san, "O-O");
    }

    #[test]
    fn legal_targets_deduplicate_promotions() {
        let rules = ShakmatyRules;
        let position = rules
            .parse_position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1")
            .expect("fen");
        assert_eq!(rules.legal_targets(&position, square("e7")), vec![square("e8")]);
    }

    #[test]
    fn finished_positions_are_detected() {
        let rules = ShakmatyRules;
        let mated = rules
            .parse_position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .expect("fen");
        assert!(rules.is_finished(&mated));
        assert!(!rules.is_finished(&rules.initial_position()));
    }
}
