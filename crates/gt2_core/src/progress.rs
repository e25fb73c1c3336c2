//! Byte-level enumerations for language and progress fields. Every raw byte
//! maps to a variant; values the game never writes land in `Unknown`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layout::{ARCADE_TRACK_COUNT, CAREER_EVENTS_FOR_FULL_COMPLETION};

pub const ARCADE_TRACKS: [&str; ARCADE_TRACK_COUNT] = [
    "Rome",
    "Rome Short",
    "Rome Night",
    "Seattle",
    "Seattle Short",
    "Super Speedway",
    "Laguna Seca",
    "Midfield",
    "Apricot Hill",
    "Red Rock Valley",
    "Tahiti Road",
    "High Speed Ring",
    "Autumn Ring",
    "Trial Mountain",
    "Deep Forest",
    "Grand Valley",
    "Grand Valley East",
    "Special Stage Route 5",
    "Clubman Stage Route 5",
    "Grindelwald",
    "Test Course",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    Japanese,
    EnglishUs,
    EnglishGb,
    French,
    German,
    Italian,
    Spanish,
    Unknown(u8),
}

impl Language {
    pub const ALL: [Language; 7] = [
        Self::Japanese,
        Self::EnglishUs,
        Self::EnglishGb,
        Self::French,
        Self::German,
        Self::Italian,
        Self::Spanish,
    ];

    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Japanese,
            1 => Self::EnglishUs,
            2 => Self::EnglishGb,
            3 => Self::French,
            4 => Self::German,
            5 => Self::Italian,
            6 => Self::Spanish,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match *self {
            Self::Japanese => 0,
            Self::EnglishUs => 1,
            Self::EnglishGb => 2,
            Self::French => 3,
            Self::German => 4,
            Self::Italian => 5,
            Self::Spanish => 6,
            Self::Unknown(other) => other,
        }
    }

    /// Short code used on the command line and in reports.
    pub fn code(&self) -> &'static str {
        match *self {
            Self::Japanese => "ja",
            Self::EnglishUs => "en-us",
            Self::EnglishGb => "en-gb",
            Self::French => "fr",
            Self::German => "de",
            Self::Italian => "it",
            Self::Spanish => "es",
            Self::Unknown(_) => "invalid",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.code() == code)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcadeRank {
    None,
    Easy,
    Normal,
    Hard,
    Unknown(u8),
}

impl ArcadeRank {
    pub const ALL: [ArcadeRank; 4] = [Self::None, Self::Easy, Self::Normal, Self::Hard];

    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Easy,
            2 => Self::Normal,
            4 => Self::Hard,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match *self {
            Self::None => 0,
            Self::Easy => 1,
            Self::Normal => 2,
            Self::Hard => 4,
            Self::Unknown(other) => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::None => "none",
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
            Self::Unknown(_) => "invalid",
        }
    }
}

impl fmt::Display for ArcadeRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finishing position stored in one career nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CareerRank {
    None,
    Place(u8),
    Unknown(u8),
}

impl CareerRank {
    pub const ALL: [CareerRank; 7] = [
        Self::None,
        Self::Place(1),
        Self::Place(2),
        Self::Place(3),
        Self::Place(4),
        Self::Place(5),
        Self::Place(6),
    ];

    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::None,
            1..=6 => Self::Place(raw),
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match *self {
            Self::None => 0,
            Self::Place(place) | Self::Unknown(place) => place,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::None => "none",
            Self::Place(1) => "1st",
            Self::Place(2) => "2nd",
            Self::Place(3) => "3rd",
            Self::Place(4) => "4th",
            Self::Place(5) => "5th",
            Self::Place(6) => "6th",
            Self::Place(_) | Self::Unknown(_) => "invalid",
        }
    }

    /// Contribution of this event to the completion score.
    pub fn weight(&self) -> f64 {
        match *self {
            Self::Place(place) if (1..=6).contains(&place) => 1.0 / f64::from(place),
            _ => 0.0,
        }
    }
}

impl fmt::Display for CareerRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseRank {
    None,
    Kid,
    Bronze,
    Silver,
    Gold,
    Unknown(u8),
}

impl LicenseRank {
    pub const ALL: [LicenseRank; 5] = [
        Self::None,
        Self::Kid,
        Self::Bronze,
        Self::Silver,
        Self::Gold,
    ];

    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Kid,
            2 => Self::Bronze,
            3 => Self::Silver,
            4 => Self::Gold,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match *self {
            Self::None => 0,
            Self::Kid => 1,
            Self::Bronze => 2,
            Self::Silver => 3,
            Self::Gold => 4,
            Self::Unknown(other) => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::None => "none",
            Self::Kid => "kid",
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Unknown(_) => "invalid",
        }
    }
}

impl fmt::Display for LicenseRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted career completion: each event scores `1/place`, the sum is
/// normalised against 219 events and rounded to two decimals. The 219 figure
/// is taken as given and has not been checked against game documentation.
pub fn career_completion(events: &[CareerRank]) -> f64 {
    let score: f64 = events.iter().map(CareerRank::weight).sum();
    let percent = score * 100.0 / CAREER_EVENTS_FOR_FULL_COMPLETION as f64;
    round_to_hundredths(percent)
}

/// Rounds the exact binary value to two decimals with ties to even, so
/// `0.125` becomes `0.12` rather than `0.13`.
fn round_to_hundredths(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}
