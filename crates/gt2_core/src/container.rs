use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layout::{
    ByteRange, CARD_BLOCK_SIZE, CARD_FRAMES, EMULATOR_PREFIX_SIZE, EXPORT_GAME_ID_OFFSET,
    EXPORT_START_OFFSET_BYTE, FRAME_GAME_ID_OFFSET, FRAME_HEADER_SIZE, FRAME_OCCUPIED,
    GAME_ID_LEN, SLOT_LEN,
};
use crate::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    RawCard,
    EmulatorCard,
    SingleSaveExport,
}

impl ContainerKind {
    /// `.mcr`, `.gme` and `.psv`, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mcr" => Some(Self::RawCard),
            "gme" => Some(Self::EmulatorCard),
            "psv" => Some(Self::SingleSaveExport),
            _ => None,
        }
    }

    fn prefix_len(&self) -> usize {
        match self {
            Self::EmulatorCard => EMULATOR_PREFIX_SIZE,
            Self::RawCard | Self::SingleSaveExport => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawCard => "raw card",
            Self::EmulatorCard => "emulator card",
            Self::SingleSaveExport => "single-save export",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSlot {
    pub start_offset: usize,
    pub game_id_offset: usize,
    pub game_id: String,
    pub region: Region,
}

impl SaveSlot {
    pub fn range(&self) -> ByteRange {
        ByteRange::new(self.start_offset, SLOT_LEN)
    }
}

/// Enumerates the save slots of `bytes` in container order. Frames and
/// exports whose game ID is not a known release are skipped, as are slots
/// that would run past the buffer or overlap an earlier slot.
pub fn locate_slots(bytes: &[u8], kind: ContainerKind) -> Vec<SaveSlot> {
    let candidates = match kind {
        ContainerKind::RawCard | ContainerKind::EmulatorCard => card_candidates(bytes, kind),
        ContainerKind::SingleSaveExport => export_candidate(bytes).into_iter().collect(),
    };

    let mut slots: Vec<SaveSlot> = Vec::with_capacity(candidates.len());
    for slot in candidates {
        let range = slot.range();
        if !range.fits_within(bytes.len()) {
            warn!(
                start = slot.start_offset,
                len = bytes.len(),
                "skipping save that extends past the end of the image"
            );
            continue;
        }
        if slots.iter().any(|kept| kept.range().overlaps(&range)) {
            warn!(start = slot.start_offset, "skipping save overlapping an earlier slot");
            continue;
        }
        debug!(
            start = slot.start_offset,
            game_id = %slot.game_id,
            region = %slot.region,
            "found save slot"
        );
        slots.push(slot);
    }
    slots
}

fn card_candidates(bytes: &[u8], kind: ContainerKind) -> Vec<SaveSlot> {
    let prefix = kind.prefix_len();
    let mut out = Vec::new();

    // Frame 0 is the card directory header.
    for frame in 1..CARD_FRAMES {
        let header_offset = FRAME_HEADER_SIZE * frame + prefix;
        let Some(header) = bytes.get(header_offset..header_offset + FRAME_HEADER_SIZE) else {
            break;
        };
        if header[0] != FRAME_OCCUPIED {
            continue;
        }

        let game_id_offset = header_offset + FRAME_GAME_ID_OFFSET;
        let Some((game_id, region)) = known_game_id(bytes, game_id_offset) else {
            continue;
        };
        out.push(SaveSlot {
            start_offset: CARD_BLOCK_SIZE * frame + prefix,
            game_id_offset,
            game_id,
            region,
        });
    }

    out
}

fn export_candidate(bytes: &[u8]) -> Option<SaveSlot> {
    let (game_id, region) = known_game_id(bytes, EXPORT_GAME_ID_OFFSET)?;
    let start_offset = usize::from(*bytes.get(EXPORT_START_OFFSET_BYTE)?);
    Some(SaveSlot {
        start_offset,
        game_id_offset: EXPORT_GAME_ID_OFFSET,
        game_id,
        region,
    })
}

fn known_game_id(bytes: &[u8], offset: usize) -> Option<(String, Region)> {
    let raw = bytes.get(offset..offset + GAME_ID_LEN)?;
    let game_id = std::str::from_utf8(raw).ok().filter(|s| s.is_ascii())?;
    Region::from_known_game_id(game_id)?;
    Some((game_id.to_string(), Region::from_game_id(game_id)))
}
