//! Decides whether a user gesture may start on the current position.

use shared::domain::{GameOutcome, SessionMode, Side, Square};

use crate::{error::GestureRejection, rules::Rules, session::Phase};

/// Pure in `(mode, side_to_move)`; never consults remote state.
pub fn is_human_turn(mode: SessionMode, side_to_move: Side) -> bool {
    mode.is_human(side_to_move)
}

/// Synchronous gate run on drag start and again on drop.
pub fn check_gesture<R: Rules>(
    rules: &R,
    phase: Phase,
    mode: SessionMode,
    outcome: GameOutcome,
    position: &R::Position,
    from: Square,
) -> Result<(), GestureRejection> {
    if outcome.is_terminal() || phase == Phase::Terminal || rules.is_finished(position) {
        return Err(GestureRejection::GameOver);
    }
    match phase {
        Phase::Idle => {}
        Phase::Initializing => return Err(GestureRejection::Initializing),
        _ => return Err(GestureRejection::Busy),
    }

    let side = rules.side_to_move(position);
    if !is_human_turn(mode, side) {
        return Err(GestureRejection::NotHumanTurn { side });
    }
    match rules.piece_at(position, from) {
        Some(piece) if piece.side == side => Ok(()),
        _ => Err(GestureRejection::NoMovablePiece { side, square: from }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ShakmatyRules;

    fn square(name: &str) -> Square {
        name.parse().expect("square")
    }

    #[test]
    fn human_turn_table() {
        use SessionMode::*;
        use Side::*;

        let table = [
            (HumanHuman, White, true),
            (HumanHuman, Black, true),
            (HumanAutomated, White, true),
            (HumanAutomated, Black, false),
            (AutomatedHuman, White, false),
            (AutomatedHuman, Black, true),
            (AutomatedAutomated, White, false),
            (AutomatedAutomated, Black, false),
        ];
        for (mode, side, expected) in table {
            assert_eq!(is_human_turn(mode, side), expected, "{mode} {side}");
        }
    }

    #[test]
    fn gesture_allowed_for_own_piece_when_idle() {
        let rules = ShakmatyRules;
        let position = rules.initial_position();
        assert_eq!(
            check_gesture(
                &rules,
                Phase::Idle,
                SessionMode::HumanAutomated,
                GameOutcome::Ongoing,
                &position,
                square("e2"),
            ),
            Ok(())
        );
    }

    #[test]
    fn gesture_rejected_on_automated_side() {
        let rules = ShakmatyRules;
        let position = rules.initial_position();
        assert_eq!(
            check_gesture(
                &rules,
                Phase::Idle,
                SessionMode::AutomatedHuman,
                GameOutcome::Ongoing,
                &position,
                square("e2"),
            ),
            Err(GestureRejection::NotHumanTurn { side: Side::White })
        );
    }

    #[test]
    fn gesture_rejected_for_opponent_piece_or_empty_square() {
        let rules = ShakmatyRules;
        let position = rules.initial_position();
        for from in ["e7", "e4"] {
            assert_eq!(
                check_gesture(
                    &rules,
                    Phase::Idle,
                    SessionMode::HumanHuman,
                    GameOutcome::Ongoing,
                    &position,
                    square(from),
                ),
                Err(GestureRejection::NoMovablePiece {
                    side: Side::White,
                    square: square(from),
                })
            );
        }
    }

    #[test]
    fn gesture_rejected_once_outcome_is_terminal_or_busy() {
        let rules = ShakmatyRules;
        let position = rules.initial_position();
        assert_eq!(
            check_gesture(
                &rules,
                Phase::Idle,
                SessionMode::HumanHuman,
                GameOutcome::Draw,
                &position,
                square("e2"),
            ),
            Err(GestureRejection::GameOver)
        );
        assert_eq!(
            check_gesture(
                &rules,
                Phase::SubmittingHumanMove,
                SessionMode::HumanHuman,
                GameOutcome::Ongoing,
                &position,
                square("e2"),
            ),
            Err(GestureRejection::Busy)
        );
    }

    #[test]
    fn gesture_rejected_on_finished_position() {
        let rules = ShakmatyRules;
        // Fool's mate, white to move and mated.
        let position = rules
            .parse_position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .expect("fen");
        assert_eq!(
            check_gesture(
                &rules,
                Phase::Idle,
                SessionMode::HumanHuman,
                GameOutcome::Ongoing,
                &position,
                square("e2"),
            ),
            Err(GestureRejection::GameOver)
        );
    }
}
