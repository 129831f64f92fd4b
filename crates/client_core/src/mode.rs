//! Mover selection to session mode resolution.

use shared::{
    domain::{MoverKind, SessionMode},
    protocol::OpenSessionRequest,
};

use crate::error::ConfigError;

/// Resolved pairing for one game. Only constructed from two valid selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSetup {
    pub player_one: MoverKind,
    pub player_two: MoverKind,
    pub mode: SessionMode,
}

impl GameSetup {
    pub fn resolve(
        player_one: Option<MoverKind>,
        player_two: Option<MoverKind>,
    ) -> Result<Self, ConfigError> {
        let player_one = player_one.ok_or(ConfigError::Unselected { player: 1 })?;
        let player_two = player_two.ok_or(ConfigError::Unselected { player: 2 })?;
        let mode = SessionMode::from_movers(&player_one, &player_two);
        Ok(Self {
            player_one,
            player_two,
            mode,
        })
    }

    pub fn from_selections(player_one: &str, player_two: &str) -> Result<Self, ConfigError> {
        Self::resolve(parse_selection(player_one), parse_selection(player_two))
    }

    pub fn open_request(&self) -> OpenSessionRequest {
        OpenSessionRequest {
            player_one: self.player_one.clone(),
            player_two: self.player_two.clone(),
            mode: self.mode,
        }
    }
}

/// `human` selects a human mover, any other non-empty label an engine.
/// Blank and `invalid` mean nothing was selected.
pub fn parse_selection(selection: &str) -> Option<MoverKind> {
    let selection = selection.trim();
    match selection.to_ascii_lowercase().as_str() {
        "" | "invalid" | "none" => None,
        "human" => Some(MoverKind::Human),
        _ => Some(MoverKind::Automated {
            engine: selection.to_string(),
        }),
    }
}
