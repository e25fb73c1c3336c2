use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Eu,
    Us,
    Jp,
    Unknown,
}

/// Game-ID tags written by every known release of the game.
pub const KNOWN_GAME_IDS: [(&str, Region); 6] = [
    ("BESCES-02380GAME", Region::Eu),
    ("BESCES-12380GAME", Region::Eu),
    ("BASCUS-94455GAME", Region::Us),
    ("BASCUS-94488GAME", Region::Us),
    ("BISCPS-10116GAME", Region::Jp),
    ("BISCPS-10117GAME", Region::Jp),
];

impl Region {
    /// Exact lookup against [`KNOWN_GAME_IDS`].
    pub fn from_known_game_id(game_id: &str) -> Option<Self> {
        KNOWN_GAME_IDS
            .iter()
            .find(|(id, _)| *id == game_id)
            .map(|&(_, region)| region)
    }

    /// Region from the two-letter product-code prefix of a game-ID tag.
    pub fn from_prefix(game_id: &str) -> Self {
        match game_id.get(..2) {
            Some("BE") => Self::Eu,
            Some("BA") => Self::Us,
            Some("BI") => Self::Jp,
            _ => Self::Unknown,
        }
    }

    pub fn from_game_id(game_id: &str) -> Self {
        Self::from_known_game_id(game_id).unwrap_or_else(|| Self::from_prefix(game_id))
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Eu => "EU",
            Self::Us => "US",
            Self::Jp => "JP",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
