//! Line commands typed at the terminal board.

use client_core::UserCommand;
use shared::domain::{MoveDescriptor, PromotionPiece, Square};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// A drag-and-drop gesture; a trailing piece letter also answers the
    /// promotion picker.
    Move(MoveDescriptor),
    Hint(Square),
    Promote(PromotionPiece),
    CancelPromotion,
    Retry,
    Board,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("empty input")]
    Empty,
    #[error("choose q, r, b or n, or type cancel")]
    PromotionExpected,
    #[error("usage: moves <square>")]
    MissingSquare,
    #[error("{0}")]
    Invalid(String),
}

pub const HELP: &str = "\
commands:
  e2 e4 | e2e4     move a piece (add q/r/b/n to promote)
  moves e2         list legal targets from a square
  retry            resume the automated side after a failure
  board            print the board again
  quit             leave the game";

pub fn parse_input(line: &str, promotion_pending: bool) -> Result<Input, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(InputError::Empty);
    }
    let lowered = line.to_ascii_lowercase();

    if promotion_pending {
        if lowered == "cancel" {
            return Ok(Input::CancelPromotion);
        }
        if matches!(lowered.as_str(), "quit" | "exit") {
            return Ok(Input::Quit);
        }
        return lowered
            .parse::<PromotionPiece>()
            .map(Input::Promote)
            .map_err(|_| InputError::PromotionExpected);
    }

    let mut words = lowered.split_whitespace();
    match words.next() {
        Some("quit" | "exit") => Ok(Input::Quit),
        Some("retry" | "resume") => Ok(Input::Retry),
        Some("board") => Ok(Input::Board),
        Some("help" | "?") => Ok(Input::Help),
        Some("moves") => {
            let square = words.next().ok_or(InputError::MissingSquare)?;
            square
                .parse::<Square>()
                .map(Input::Hint)
                .map_err(|err| InputError::Invalid(err.to_string()))
        }
        _ => lowered
            .parse::<MoveDescriptor>()
            .map(Input::Move)
            .map_err(|err| InputError::Invalid(err.to_string())),
    }
}

/// Driver commands for a parsed line, in dispatch order. Lines handled by
/// the terminal itself map to nothing.
pub fn commands(input: &Input) -> Vec<UserCommand> {
    match *input {
        Input::Move(descriptor) => {
            let mut commands = vec![UserCommand::Drop {
                from: descriptor.from,
                to: descriptor.to,
            }];
            if let Some(piece) = descriptor.promotion {
                commands.push(UserCommand::Promote(Some(piece)));
            }
            commands
        }
        Input::Promote(piece) => vec![UserCommand::Promote(Some(piece))],
        Input::CancelPromotion => vec![UserCommand::CancelPromotion],
        Input::Retry => vec![UserCommand::ResumeAutomated],
        Input::Hint(_) | Input::Board | Input::Help | Input::Quit => Vec::new(),
    }
}
