use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque handle the move service hands out for one game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// White registers first and is "player 1".
    pub const fn player_number(self) -> u8 {
        match self {
            Self::White => 1,
            Self::Black => 2,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("white"),
            Self::Black => f.write_str("black"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid square '{0}'")]
    Square(String),
    #[error("invalid promotion piece '{0}'")]
    Promotion(String),
    #[error("invalid move '{0}'")]
    Move(String),
}

/// Board coordinate, zero-based file (a..h) and rank (1..8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    /// Rank 1 or rank 8.
    pub fn is_back_rank(self) -> bool {
        self.rank == 0 || self.rank == 7
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            char::from(b'a' + self.file),
            char::from(b'1' + self.rank)
        )
    }
}

impl FromStr for Square {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        let [file @ b'a'..=b'h', rank @ b'1'..=b'8'] = bytes else {
            return Err(ParseError::Square(s.to_string()));
        };
        Ok(Self {
            file: file - b'a',
            rank: rank - b'1',
        })
    }
}

impl TryFrom<String> for Square {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(value: Square) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionPiece {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl PromotionPiece {
    pub const ALL: [PromotionPiece; 4] = [Self::Knight, Self::Bishop, Self::Rook, Self::Queen];

    pub const fn letter(self) -> char {
        match self {
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
        }
    }
}

impl FromStr for PromotionPiece {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "knight" => Ok(Self::Knight),
            "b" | "bishop" => Ok(Self::Bishop),
            "r" | "rook" => Ok(Self::Rook),
            "q" | "queen" => Ok(Self::Queen),
            _ => Err(ParseError::Promotion(s.to_string())),
        }
    }
}

/// Source, target and optional promotion piece of one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDescriptor {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionPiece>,
}

impl MoveDescriptor {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, piece: PromotionPiece) -> Self {
        self.promotion = Some(piece);
        self
    }
}

/// Long algebraic form, e.g. `e7e8q`.
impl fmt::Display for MoveDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece.letter())?;
        }
        Ok(())
    }
}

/// Accepts `e2e4`, `e7e8q`, `e2 e4` and `e7 e8 q`.
impl FromStr for MoveDescriptor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.split_whitespace().collect();
        if !compact.is_ascii() || !(4..=5).contains(&compact.len()) {
            return Err(ParseError::Move(s.to_string()));
        }
        let from = compact[0..2].parse()?;
        let to = compact[2..4].parse()?;
        let promotion = match compact.get(4..) {
            Some(rest) if !rest.is_empty() => Some(rest.parse()?),
            _ => None,
        };
        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

/// Who supplies the moves for one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoverKind {
    Human,
    /// Engine labels select a strength on the service side; the client treats
    /// every engine the same.
    Automated { engine: String },
}

impl MoverKind {
    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human)
    }
}

impl fmt::Display for MoverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => f.write_str("human"),
            Self::Automated { engine } => write!(f, "automated ({engine})"),
        }
    }
}

/// Which sides are human: first letter white, second letter black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionMode {
    #[serde(rename = "HH")]
    HumanHuman,
    #[serde(rename = "HR")]
    HumanAutomated,
    #[serde(rename = "RH")]
    AutomatedHuman,
    #[serde(rename = "RR")]
    AutomatedAutomated,
}

impl SessionMode {
    pub fn from_movers(player_one: &MoverKind, player_two: &MoverKind) -> Self {
        match (player_one.is_human(), player_two.is_human()) {
            (true, true) => Self::HumanHuman,
            (true, false) => Self::HumanAutomated,
            (false, true) => Self::AutomatedHuman,
            (false, false) => Self::AutomatedAutomated,
        }
    }

    pub const fn is_human(self, side: Side) -> bool {
        match (self, side) {
            (Self::HumanHuman, _) => true,
            (Self::HumanAutomated, Side::White) => true,
            (Self::AutomatedHuman, Side::Black) => true,
            _ => false,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::HumanHuman => "HH",
            Self::HumanAutomated => "HR",
            Self::AutomatedHuman => "RH",
            Self::AutomatedAutomated => "RR",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Value the service reports for a drawn game.
pub const DRAW_RESULT: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    #[default]
    Ongoing,
    PlayerOneWin,
    PlayerTwoWin,
    Draw,
}

impl GameOutcome {
    /// `1` is a player one win, `-1` a player two win, anything else present
    /// is a draw.
    pub fn from_result(result: Option<f64>) -> Self {
        match result {
            None => Self::Ongoing,
            Some(value) if value == 1.0 => Self::PlayerOneWin,
            Some(value) if value == -1.0 => Self::PlayerTwoWin,
            Some(_) => Self::Draw,
        }
    }

    pub fn result_value(self) -> Option<f64> {
        match self {
            Self::Ongoing => None,
            Self::PlayerOneWin => Some(1.0),
            Self::PlayerTwoWin => Some(-1.0),
            Self::Draw => Some(DRAW_RESULT),
        }
    }

    pub fn winner(side: Side) -> Self {
        match side {
            Side::White => Self::PlayerOneWin,
            Side::Black => Self::PlayerTwoWin,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Self::Ongoing
    }

    pub fn announcement(self) -> &'static str {
        match self {
            Self::Ongoing => "Game in progress",
            Self::PlayerOneWin => "Player 1 wins!",
            Self::PlayerTwoWin => "Player 2 wins!",
            Self::Draw => "Draw!",
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.announcement())
    }
}
