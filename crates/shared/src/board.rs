//! Conversions between the wire types and `shakmaty`.
//!
//! Boards and descriptors name castling by the king's destination (`e1g1`),
//! while `shakmaty` encodes it as king-takes-rook. Everything that matches
//! descriptors against legal moves goes through [`board_target`].

use shakmaty::{Chess, Color, File, Move, Position, Rank, Role};

use crate::domain::{MoveDescriptor, PromotionPiece, Side, Square};

pub fn to_shakmaty_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::from_coords(
        File::new(u32::from(square.file())),
        Rank::new(u32::from(square.rank())),
    )
}

pub fn from_shakmaty_square(square: shakmaty::Square) -> Option<Square> {
    square.to_string().parse().ok()
}

/// Destination square as a board shows it.
pub fn board_target(m: &Move) -> shakmaty::Square {
    match *m {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            shakmaty::Square::from_coords(file, king.rank())
        }
        _ => m.to(),
    }
}

pub fn side_from_color(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

pub fn promotion_role(piece: PromotionPiece) -> Role {
    match piece {
        PromotionPiece::Knight => Role::Knight,
        PromotionPiece::Bishop => Role::Bishop,
        PromotionPiece::Rook => Role::Rook,
        PromotionPiece::Queen => Role::Queen,
    }
}

pub fn promotion_piece(role: Role) -> Option<PromotionPiece> {
    match role {
        Role::Knight => Some(PromotionPiece::Knight),
        Role::Bishop => Some(PromotionPiece::Bishop),
        Role::Rook => Some(PromotionPiece::Rook),
        Role::Queen => Some(PromotionPiece::Queen),
        Role::Pawn | Role::King => None,
    }
}

/// The legal move `descriptor` names in `position`, promotion included.
pub fn find_move(position: &Chess, descriptor: &MoveDescriptor) -> Option<Move> {
    let from = to_shakmaty_square(descriptor.from);
    let to = to_shakmaty_square(descriptor.to);
    let promotion = descriptor.promotion.map(promotion_role);
    position
        .legal_moves()
        .into_iter()
        .find(|m| m.from() == Some(from) && board_target(m) == to && m.promotion() == promotion)
}

pub fn descriptor_of(m: &Move) -> Option<MoveDescriptor> {
    let from = from_shakmaty_square(m.from()?)?;
    let to = from_shakmaty_square(board_target(m))?;
    let descriptor = MoveDescriptor::new(from, to);
    Some(match m.promotion().and_then(promotion_piece) {
        Some(piece) => descriptor.with_promotion(piece),
        None => descriptor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{fen::Fen, CastlingMode};

    fn position(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .expect("fen")
            .into_position(CastlingMode::Standard)
            .expect("position")
    }

    fn descriptor(text: &str) -> MoveDescriptor {
        text.parse().expect("descriptor")
    }

    #[test]
    fn squares_keep_their_coordinates() {
        let e4: Square = "e4".parse().expect("square");
        assert_eq!(to_shakmaty_square(e4), shakmaty::Square::E4);
        assert_eq!(from_shakmaty_square(shakmaty::Square::H8), "h8".parse().ok());
    }

    #[test]
    fn castling_is_named_by_king_destination() {
        let position = position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        for (text, rook) in [("e1g1", shakmaty::Square::H1), ("e1c1", shakmaty::Square::A1)] {
            let m = find_move(&position, &descriptor(text)).expect("castle");
            assert!(matches!(m, Move::Castle { rook: r, .. } if r == rook));
            assert_eq!(descriptor_of(&m), Some(descriptor(text)));
        }
        assert!(find_move(&position, &descriptor("e1h1")).is_none());
    }

    #[test]
    fn promotion_piece_must_match() {
        let position = position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1");
        assert!(find_move(&position, &descriptor("e7e8")).is_none());
        let m = find_move(&position, &descriptor("e7e8r")).expect("underpromotion");
        assert_eq!(m.promotion(), Some(Role::Rook));
        assert_eq!(descriptor_of(&m), Some(descriptor("e7e8r")));
    }
}
