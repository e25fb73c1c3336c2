use serde::{Deserialize, Serialize};

use crate::container::SaveSlot;
use crate::core_api::CoreError;
use crate::field;
use crate::layout::CHECKSUM;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecksumStatus {
    pub offset: usize,
    pub stored: u32,
    pub computed: u32,
    pub valid: bool,
}

/// CRC32 of every slot byte that precedes the checksum field.
pub fn compute(bytes: &[u8], slot: &SaveSlot) -> Result<u32, CoreError> {
    let start = slot.start_offset;
    let end = start + CHECKSUM.offset;
    let covered = bytes
        .get(start..end)
        .ok_or_else(|| CoreError::out_of_bounds(start, CHECKSUM.offset, bytes.len()))?;
    Ok(crc32fast::hash(covered))
}

pub fn stored(bytes: &[u8], slot: &SaveSlot) -> Result<u32, CoreError> {
    let raw = field::read_int(bytes, slot.start_offset, &CHECKSUM)?;
    Ok(raw as u32)
}

pub fn status(bytes: &[u8], slot: &SaveSlot) -> Result<ChecksumStatus, CoreError> {
    let stored = stored(bytes, slot)?;
    let computed = compute(bytes, slot)?;
    Ok(ChecksumStatus {
        offset: slot.start_offset + CHECKSUM.offset,
        stored,
        computed,
        valid: stored == computed,
    })
}

pub fn verify(bytes: &[u8], slot: &SaveSlot) -> Result<bool, CoreError> {
    status(bytes, slot).map(|s| s.valid)
}

pub fn refresh(bytes: &mut [u8], slot: &SaveSlot) -> Result<u32, CoreError> {
    let crc = compute(bytes, slot)?;
    field::write_int(bytes, slot.start_offset, &CHECKSUM, i64::from(crc))?;
    Ok(crc)
}
