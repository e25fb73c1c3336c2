use tracing::debug;

use crate::car::{self, RecordIndexPolicy};
use crate::checksum::{self, ChecksumStatus};
use crate::container::{ContainerKind, SaveSlot};
use crate::field;
use crate::image::MemoryCardImage;
use crate::layout::{
    ARCADE_PROGRESS, BEST_RANK_SUM, CAR_COUNT, CAREER_EVENT_COUNT, CAREER_PROGRESS, CURRENT_CAR,
    DAYS, ENDING_MOVIE, FieldDescriptor, LANGUAGE, LICENSE_NAMES, LICENSE_TEST_STRIDE, MONEY,
    PRIZE, RACES, RANK_SUM, TESTS_PER_LICENSE, WINS, career_event, license_offset,
};
use crate::patch::{self, PatchReport, SaveUpdates};
use crate::progress::{
    ARCADE_TRACKS, ArcadeRank, CareerRank, Language, LicenseRank, career_completion,
};

use super::car_catalog::CarCatalog;
use super::error::{CoreError, CoreErrorCode};
use super::types::{
    ArcadeEntry, CarEntry, CareerProgress, LicenseEntry, ScalarEntry, SlotSnapshot, SlotSummary,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub record_index_policy: RecordIndexPolicy,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine {
    options: EngineOptions,
}

#[derive(Debug)]
pub struct Session {
    options: EngineOptions,
    image: MemoryCardImage,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Loads `bytes` as a container of `kind`. An image without any
    /// recognisable save is still a valid session with no slots.
    pub fn open_bytes<B: Into<Vec<u8>>>(&self, bytes: B, kind: ContainerKind) -> Session {
        let image = MemoryCardImage::load(bytes.into(), kind);
        debug!(kind = %kind, slots = image.slots().len(), "opened image");
        Session {
            options: self.options,
            image,
        }
    }
}

impl Session {
    pub fn kind(&self) -> ContainerKind {
        self.image.kind()
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn slots(&self) -> Vec<SlotSummary> {
        self.image
            .slots()
            .iter()
            .enumerate()
            .map(|(index, slot)| summarize(index, slot))
            .collect()
    }

    pub fn slot_count(&self) -> usize {
        self.image.slots().len()
    }

    pub fn snapshot(
        &self,
        index: usize,
        catalog: Option<&CarCatalog>,
    ) -> Result<SlotSnapshot, CoreError> {
        let slot = self.slot(index)?;
        build_snapshot(self.image.bytes(), self.kind(), index, slot, catalog)
    }

    pub fn snapshots(&self, catalog: Option<&CarCatalog>) -> Result<Vec<SlotSnapshot>, CoreError> {
        (0..self.slot_count())
            .map(|index| self.snapshot(index, catalog))
            .collect()
    }

    pub fn cars(
        &self,
        index: usize,
        catalog: Option<&CarCatalog>,
    ) -> Result<Vec<CarEntry>, CoreError> {
        car::get_cars(self.image.bytes(), self.slot(index)?, catalog)
    }

    pub fn car(
        &self,
        index: usize,
        car_index: usize,
        catalog: Option<&CarCatalog>,
    ) -> Result<CarEntry, CoreError> {
        car::get_car(self.image.bytes(), self.slot(index)?, car_index, catalog)
    }

    /// Applies `updates` to one slot, or to all of them when `target` is
    /// `None`. See [`PatchReport`] for per-slot outcomes.
    pub fn apply(
        &mut self,
        target: Option<usize>,
        updates: &SaveUpdates,
    ) -> Result<PatchReport, CoreError> {
        patch::apply(
            &mut self.image,
            target,
            updates,
            self.options.record_index_policy,
        )
    }

    pub fn checksum_status(&self, index: usize) -> Result<ChecksumStatus, CoreError> {
        checksum::status(self.image.bytes(), self.slot(index)?)
    }

    pub fn verify_checksum(&self, index: usize) -> Result<bool, CoreError> {
        checksum::verify(self.image.bytes(), self.slot(index)?)
    }

    pub fn refresh_checksum(&mut self, index: usize) -> Result<u32, CoreError> {
        let (slot, bytes) = self
            .image
            .slot_and_bytes_mut(index)
            .ok_or_else(|| missing_slot(index))?;
        checksum::refresh(bytes, slot)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.image.bytes()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.image.into_bytes()
    }

    fn slot(&self, index: usize) -> Result<&SaveSlot, CoreError> {
        self.image.slot(index).ok_or_else(|| missing_slot(index))
    }
}

fn missing_slot(index: usize) -> CoreError {
    CoreError::new(
        CoreErrorCode::InvalidIndex,
        format!("save slot {index} does not exist"),
    )
}

fn summarize(index: usize, slot: &SaveSlot) -> SlotSummary {
    SlotSummary {
        index,
        start_offset: slot.start_offset,
        game_id_offset: slot.game_id_offset,
        game_id: slot.game_id.clone(),
        region: slot.region,
    }
}

fn build_snapshot(
    bytes: &[u8],
    kind: ContainerKind,
    index: usize,
    slot: &SaveSlot,
    catalog: Option<&CarCatalog>,
) -> Result<SlotSnapshot, CoreError> {
    let base = slot.start_offset;
    let scalar = |desc: &FieldDescriptor| -> Result<ScalarEntry, CoreError> {
        Ok(ScalarEntry {
            offset: base + desc.offset,
            value: field::read_int(bytes, base, desc)?,
        })
    };

    let best_rank_sum = scalar(&BEST_RANK_SUM)?;
    let rank_sum = scalar(&RANK_SUM)?;

    let licenses = LICENSE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| -> Result<LicenseEntry, CoreError> {
            let offset = license_offset(i);
            let tests = (0..TESTS_PER_LICENSE)
                .map(|t| {
                    let desc =
                        FieldDescriptor::byte("license_test", offset + t * LICENSE_TEST_STRIDE);
                    field::read_int(bytes, base, &desc)
                        .map(|raw| LicenseRank::from_raw(raw as u8))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(LicenseEntry {
                name: (*name).to_string(),
                offset: base + offset,
                tests,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let arcade = field::read_repeated(bytes, base, &ARCADE_PROGRESS)?
        .into_iter()
        .zip(ARCADE_TRACKS)
        .map(|(raw, track)| ArcadeEntry {
            track: track.to_string(),
            rank: ArcadeRank::from_raw(raw),
        })
        .collect();

    let events = (0..CAREER_EVENT_COUNT)
        .map(|i| {
            field::read_int(bytes, base, &career_event(i)).map(|raw| CareerRank::from_raw(raw as u8))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SlotSnapshot {
        slot: summarize(index, slot),
        container: kind,
        checksum: checksum::status(bytes, slot)?,
        language_offset: base + LANGUAGE.offset,
        language: Language::from_raw(field::read_int(bytes, base, &LANGUAGE)? as u8),
        money: scalar(&MONEY)?,
        days: scalar(&DAYS)?,
        races: scalar(&RACES)?,
        wins: scalar(&WINS)?,
        average_ranking: average_ranking(best_rank_sum.value, rank_sum.value),
        best_rank_sum,
        rank_sum,
        prize: scalar(&PRIZE)?,
        licenses,
        arcade_offset: base + ARCADE_PROGRESS.offset,
        arcade,
        career: CareerProgress {
            offset: base + CAREER_PROGRESS.offset,
            completion_percent: career_completion(&events),
            events,
        },
        ending_movie_offset: base + ENDING_MOVIE.offset,
        ending_movie_unlocked: field::read_int(bytes, base, &ENDING_MOVIE)? != 0,
        car_count: scalar(&CAR_COUNT)?,
        current_car_offset: base + CURRENT_CAR.offset,
        current_car: car::current_car(bytes, slot)?,
        cars: car::get_cars(bytes, slot, catalog)?,
    })
}

/// Ratio of the best-ranking sum to the ranking sum, or 0 before any race.
pub fn average_ranking(best_rank_sum: i64, rank_sum: i64) -> f64 {
    if rank_sum == 0 {
        0.0
    } else {
        best_rank_sum as f64 / rank_sum as f64
    }
}
