//! Sparse save updates applied to one or every slot of an image, followed by
//! a checksum refresh per slot.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::car::{self, CarEdit, RecordIndexPolicy};
use crate::checksum;
use crate::container::SaveSlot;
use crate::core_api::{CoreError, CoreErrorCode};
use crate::field::{self, FieldValue};
use crate::image::MemoryCardImage;
use crate::layout::{
    ARCADE_PROGRESS, BEST_RANK_SUM, CAREER_PROGRESS, DAYS, FieldDescriptor, LANGUAGE,
    LICENSE_PROGRESS, MONEY, PRIZE, RACES, RANK_SUM, WINS,
};
use crate::progress::{ArcadeRank, CareerRank, Language, LicenseRank};

/// Every field is optional; only the ones present are written. Rank values
/// apply to the whole group (every arcade track, every license test, every
/// career event).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveUpdates {
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub arcade: Option<ArcadeRank>,
    #[serde(default)]
    pub days: Option<i64>,
    #[serde(default)]
    pub races: Option<i64>,
    #[serde(default)]
    pub wins: Option<i64>,
    #[serde(default)]
    pub best_rank_sum: Option<i64>,
    #[serde(default)]
    pub rank_sum: Option<i64>,
    #[serde(default)]
    pub prize: Option<i64>,
    #[serde(default)]
    pub career: Option<CareerRank>,
    #[serde(default)]
    pub license: Option<LicenseRank>,
    #[serde(default)]
    pub car_edit: Option<CarEdit>,
    #[serde(default)]
    pub money: Option<i64>,
    #[serde(default)]
    pub current_car: Option<i64>,
}

impl SaveUpdates {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedSlot {
    pub checksum: u32,
    /// Record index written by the car edit, if one was requested.
    pub car_index: Option<usize>,
    /// Byte stored in the current-car field, if one was requested.
    pub current_car: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotOutcome {
    pub slot: usize,
    pub start_offset: usize,
    pub result: Result<AppliedSlot, CoreError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchReport {
    pub outcomes: Vec<SlotOutcome>,
}

impl PatchReport {
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SlotOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// Applies `updates` to slot `target`, or to every slot when `target` is
/// `None`. A failing slot keeps whatever was already written to it and its
/// old checksum; the remaining slots are still processed.
pub fn apply(
    image: &mut MemoryCardImage,
    target: Option<usize>,
    updates: &SaveUpdates,
    policy: RecordIndexPolicy,
) -> Result<PatchReport, CoreError> {
    let selected: Vec<usize> = match target {
        Some(index) if index < image.slots().len() => vec![index],
        Some(index) => {
            return Err(CoreError::new(
                CoreErrorCode::InvalidIndex,
                format!(
                    "save slot {index} does not exist, image holds {} slots",
                    image.slots().len()
                ),
            ));
        }
        None => (0..image.slots().len()).collect(),
    };

    let mut report = PatchReport::default();
    for index in selected {
        let Some((slot, bytes)) = image.slot_and_bytes_mut(index) else {
            continue;
        };
        let start_offset = slot.start_offset;
        let result = apply_slot(bytes, slot, updates, policy);
        match &result {
            Ok(applied) => debug!(
                slot = index,
                start = start_offset,
                checksum = applied.checksum,
                "patched save slot"
            ),
            Err(e) => warn!(
                slot = index,
                start = start_offset,
                error = %e,
                "save slot patch failed"
            ),
        }
        report.outcomes.push(SlotOutcome {
            slot: index,
            start_offset,
            result,
        });
    }
    Ok(report)
}

fn apply_slot(
    bytes: &mut [u8],
    slot: &SaveSlot,
    updates: &SaveUpdates,
    policy: RecordIndexPolicy,
) -> Result<AppliedSlot, CoreError> {
    let base = slot.start_offset;

    if let Some(language) = updates.language {
        write_scalar(bytes, base, &LANGUAGE, i64::from(language.raw()))?;
    }
    if let Some(rank) = updates.arcade {
        write_scalar(bytes, base, &ARCADE_PROGRESS, i64::from(rank.raw()))?;
    }
    write_optional(bytes, base, &DAYS, updates.days)?;
    write_optional(bytes, base, &RACES, updates.races)?;
    write_optional(bytes, base, &WINS, updates.wins)?;
    write_optional(bytes, base, &BEST_RANK_SUM, updates.best_rank_sum)?;
    write_optional(bytes, base, &RANK_SUM, updates.rank_sum)?;
    write_optional(bytes, base, &PRIZE, updates.prize)?;
    if let Some(rank) = updates.career {
        field::fill_nibble_pairs(bytes, base, &CAREER_PROGRESS, rank.raw())?;
        debug!(field = CAREER_PROGRESS.name, rank = %rank, "updated field");
    }
    if let Some(rank) = updates.license {
        write_scalar(bytes, base, &LICENSE_PROGRESS, i64::from(rank.raw()))?;
    }

    let car_index = match &updates.car_edit {
        Some(edit) => car::set_record(bytes, slot, edit, policy)?,
        None => None,
    };

    write_optional(bytes, base, &MONEY, updates.money)?;
    let current_car = updates
        .current_car
        .map(|value| car::set_current_car(bytes, slot, value))
        .transpose()?;

    let checksum = checksum::refresh(bytes, slot)?;
    Ok(AppliedSlot {
        checksum,
        car_index,
        current_car,
    })
}

fn write_optional(
    bytes: &mut [u8],
    base: usize,
    desc: &FieldDescriptor,
    value: Option<i64>,
) -> Result<(), CoreError> {
    match value {
        Some(value) => write_scalar(bytes, base, desc, value),
        None => Ok(()),
    }
}

fn write_scalar(
    bytes: &mut [u8],
    base: usize,
    desc: &FieldDescriptor,
    value: i64,
) -> Result<(), CoreError> {
    field::set(bytes, base, desc, Some(&FieldValue::Int(value)))?;
    debug!(field = desc.name, value, "updated field");
    Ok(())
}
