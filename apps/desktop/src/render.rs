//! Plain-text board, history and status lines.

use client_core::{GameUpdate, MovePair};

const FILES: &str = "  a b c d e f g h";

/// Draws the placement field of a FEN string, rank 8 at the top.
pub fn board(fen: &str) -> String {
    let placement = fen.split_whitespace().next().unwrap_or_default();
    let mut out = String::new();
    for (index, row) in placement.split('/').take(8).enumerate() {
        let rank = 8 - index;
        out.push_str(&rank.to_string());
        for symbol in row.chars() {
            match symbol.to_digit(10) {
                Some(empty) => {
                    for _ in 0..empty {
                        out.push_str(" .");
                    }
                }
                None => {
                    out.push(' ');
                    out.push(symbol);
                }
            }
        }
        out.push('\n');
    }
    out.push_str(FILES);
    out
}

pub fn history(pairs: &[MovePair]) -> String {
    pairs
        .iter()
        .map(MovePair::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Status line for an update, if it warrants one.
pub fn status(update: &GameUpdate) -> Option<String> {
    match update {
        GameUpdate::Ready { mode } => Some(format!("game ready ({mode})")),
        GameUpdate::HumanTurn { side } => Some(format!("{side} to move")),
        GameUpdate::Thinking { side } => Some(format!("{side} is thinking...")),
        GameUpdate::Snapback { from, to } => Some(format!("{from}-{to} taken back")),
        GameUpdate::Rejected(rejection) => Some(format!("not now: {rejection}")),
        GameUpdate::PromotionRequested { to, .. } => {
            Some(format!("promote on {to}: q, r, b, n or cancel"))
        }
        GameUpdate::PromotionDismissed => None,
        GameUpdate::MoveApplied { san, .. } => Some(format!("played {san}")),
        GameUpdate::GameOver(outcome) => Some(outcome.announcement().to_string()),
        GameUpdate::Failed(message) => Some(format!(
            "move failed: {message} (type 'retry' to resume an automated side)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{GameOutcome, Side};

    #[test]
    fn draws_start_position() {
        let text = board("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "8 r n b q k b n r");
        assert_eq!(lines[4], "4 . . . . P . . .");
        assert_eq!(lines[8], FILES);
    }

    #[test]
    fn history_lines_are_numbered() {
        let pairs = vec![
            MovePair {
                number: 1,
                white: "e4".into(),
                black: Some("e5".into()),
            },
            MovePair {
                number: 2,
                white: "Nf3".into(),
                black: None,
            },
        ];
        assert_eq!(history(&pairs), "1. e4 e5\n2. Nf3");
    }

    #[test]
    fn result_and_thinking_lines() {
        assert_eq!(
            status(&GameUpdate::GameOver(GameOutcome::Draw)).as_deref(),
            Some("Draw!")
        );
        assert_eq!(
            status(&GameUpdate::Thinking { side: Side::Black }).as_deref(),
            Some("black is thinking...")
        );
        assert_eq!(status(&GameUpdate::PromotionDismissed), None);
    }
}
