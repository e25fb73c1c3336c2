use serde::{Deserialize, Serialize};

use crate::checksum::ChecksumStatus;
use crate::container::ContainerKind;
use crate::progress::{ArcadeRank, CareerRank, Language, LicenseRank};
use crate::region::Region;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotSummary {
    pub index: usize,
    pub start_offset: usize,
    pub game_id_offset: usize,
    pub game_id: String,
    pub region: Region,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScalarEntry {
    pub offset: usize,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LicenseEntry {
    pub name: String,
    pub offset: usize,
    pub tests: Vec<LicenseRank>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArcadeEntry {
    pub track: String,
    pub rank: ArcadeRank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CareerProgress {
    pub offset: usize,
    pub events: Vec<CareerRank>,
    pub completion_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarFieldValue {
    pub name: String,
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarEntry {
    pub index: usize,
    pub offset: usize,
    pub name: String,
    pub code: String,
    pub bytes: String,
    pub fields: Vec<CarFieldValue>,
}

impl CarEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.hex.as_str())
    }
}

/// Everything the editor decodes from one save slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotSnapshot {
    pub slot: SlotSummary,
    pub container: ContainerKind,
    pub checksum: ChecksumStatus,
    pub language_offset: usize,
    pub language: Language,
    pub money: ScalarEntry,
    pub days: ScalarEntry,
    pub races: ScalarEntry,
    pub wins: ScalarEntry,
    pub best_rank_sum: ScalarEntry,
    pub rank_sum: ScalarEntry,
    pub average_ranking: f64,
    pub prize: ScalarEntry,
    pub licenses: Vec<LicenseEntry>,
    pub arcade_offset: usize,
    pub arcade: Vec<ArcadeEntry>,
    pub career: CareerProgress,
    pub ending_movie_offset: usize,
    pub ending_movie_unlocked: bool,
    pub car_count: ScalarEntry,
    pub current_car_offset: usize,
    pub current_car: Option<u8>,
    pub cars: Vec<CarEntry>,
}
