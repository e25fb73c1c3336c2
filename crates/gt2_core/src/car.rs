//! Garage records: up to 100 fixed-size car entries per save, each decoded
//! into named little-endian sub-fields exposed as hex.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::container::SaveSlot;
use crate::core_api::{CarCatalog, CarEntry, CarFieldValue, CoreError, CoreErrorCode};
use crate::field::{self, FieldValue};
use crate::layout::{
    CAR_COUNT, CURRENT_CAR, FIRST_CAR_OFFSET, FieldDescriptor, MAX_CAR_COUNT, NO_CURRENT_CAR,
};

pub const CAR_RECORD_LEN: usize = 164;
pub const INVALID_CAR_NAME: &str = "invalid";

/// The whole record as one opaque field.
pub const CAR_RECORD: FieldDescriptor = FieldDescriptor::hex("record", 0, CAR_RECORD_LEN);
pub const CAR_CODE: FieldDescriptor = FieldDescriptor::hex("code", 0, 4);

/// Named sub-fields of a record. Only `code` is a confirmed layout; the
/// other names are positional labels over the remaining bytes.
#[rustfmt::skip]
pub const CAR_FIELDS: [FieldDescriptor; 73] = [
    CAR_CODE,
    // Installed parts
    FieldDescriptor::hex("brakes",                4, 4),
    FieldDescriptor::hex("brake_controller",      8, 4),
    FieldDescriptor::hex("chassis",              12, 4),
    FieldDescriptor::hex("engine",               16, 4),
    FieldDescriptor::hex("drivetrain",           20, 4),
    FieldDescriptor::hex("transmission",         24, 4),
    FieldDescriptor::hex("suspension",           28, 4),
    FieldDescriptor::hex("lsd",                  32, 4),
    FieldDescriptor::hex("front_tyres",          36, 4),
    FieldDescriptor::hex("rear_tyres",           40, 4),
    FieldDescriptor::hex("weight_reduction",     44, 4),
    FieldDescriptor::hex("racing_modification",  48, 4),
    FieldDescriptor::hex("port_polish",          52, 4),
    FieldDescriptor::hex("engine_balance",       56, 4),
    FieldDescriptor::hex("displacement",         60, 4),
    FieldDescriptor::hex("computer",             64, 4),
    FieldDescriptor::hex("na_tune",              68, 4),
    FieldDescriptor::hex("turbo",                72, 4),
    FieldDescriptor::hex("flywheel",             76, 4),
    FieldDescriptor::hex("clutch",               80, 4),
    FieldDescriptor::hex("propeller_shaft",      84, 4),
    FieldDescriptor::hex("muffler",              88, 4),
    FieldDescriptor::hex("intercooler",          92, 4),
    FieldDescriptor::hex("stabilizers",          96, 4),
    // Setup
    FieldDescriptor::hex("colour",              100, 1),
    FieldDescriptor::hex("front_spring_rate",   101, 1),
    FieldDescriptor::hex("rear_spring_rate",    102, 1),
    FieldDescriptor::hex("front_ride_height",   103, 1),
    FieldDescriptor::hex("rear_ride_height",    104, 1),
    FieldDescriptor::hex("front_damper_bound",  105, 1),
    FieldDescriptor::hex("rear_damper_bound",   106, 1),
    FieldDescriptor::hex("front_damper_rebound",107, 1),
    FieldDescriptor::hex("rear_damper_rebound", 108, 1),
    FieldDescriptor::hex("front_camber",        109, 1),
    FieldDescriptor::hex("rear_camber",         110, 1),
    FieldDescriptor::hex("front_toe",           111, 1),
    FieldDescriptor::hex("rear_toe",            112, 1),
    FieldDescriptor::hex("front_stabilizer",    113, 1),
    FieldDescriptor::hex("rear_stabilizer",     114, 1),
    FieldDescriptor::hex("front_downforce",     115, 1),
    FieldDescriptor::hex("final_gear",          116, 2),
    FieldDescriptor::hex("gear_1",              118, 2),
    FieldDescriptor::hex("gear_2",              120, 2),
    FieldDescriptor::hex("gear_3",              122, 2),
    FieldDescriptor::hex("gear_4",              124, 2),
    FieldDescriptor::hex("gear_5",              126, 2),
    FieldDescriptor::hex("gear_6",              128, 2),
    FieldDescriptor::hex("gear_7",              130, 2),
    FieldDescriptor::hex("rear_downforce",      132, 1),
    FieldDescriptor::hex("front_lsd_initial",   133, 1),
    FieldDescriptor::hex("front_lsd_accel",     134, 1),
    FieldDescriptor::hex("front_lsd_decel",     135, 1),
    FieldDescriptor::hex("rear_lsd_initial",    136, 1),
    FieldDescriptor::hex("rear_lsd_accel",      137, 1),
    FieldDescriptor::hex("rear_lsd_decel",      138, 1),
    FieldDescriptor::hex("front_brake_balance", 139, 1),
    FieldDescriptor::hex("rear_brake_balance",  140, 1),
    FieldDescriptor::hex("boost_level",         141, 1),
    FieldDescriptor::hex("asm_level",           142, 1),
    FieldDescriptor::hex("tcs_level",           143, 1),
    FieldDescriptor::hex("vcd_level",           144, 1),
    FieldDescriptor::hex("yaw_control",         145, 1),
    // Stats
    FieldDescriptor::hex("power",               146, 2),
    FieldDescriptor::hex("torque",              148, 2),
    FieldDescriptor::hex("weight",              150, 2),
    FieldDescriptor::hex("odometer",            152, 4),
    FieldDescriptor::hex("wheels",              156, 1),
    FieldDescriptor::hex("body_flags",          157, 1),
    FieldDescriptor::hex("power_rpm",           158, 2),
    FieldDescriptor::hex("torque_rpm",          160, 2),
    FieldDescriptor::hex("tyre_wear",           162, 1),
    FieldDescriptor::hex("status_flags",        163, 1),
];

/// Behaviour of a record write whose index is not an existing car.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordIndexPolicy {
    /// Write the record after the last car and bump the car count, unless the
    /// garage is already full.
    #[default]
    Append,
    /// Reject the write.
    Strict,
}

/// One record edit: optional whole-record bytes, then named sub-fields, all
/// as hex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarEdit {
    pub index: i64,
    #[serde(default)]
    pub bytes: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl CarEdit {
    pub fn is_empty(&self) -> bool {
        self.bytes.as_deref().is_none_or(str::is_empty)
            && self.fields.values().all(String::is_empty)
    }
}

pub fn field_by_name(name: &str) -> Option<&'static FieldDescriptor> {
    CAR_FIELDS.iter().find(|f| f.name == name)
}

/// Stored car count, clamped to the garage size.
pub fn car_count(bytes: &[u8], slot: &SaveSlot) -> Result<usize, CoreError> {
    let raw = field::read_int(bytes, slot.start_offset, &CAR_COUNT)?;
    Ok((raw as usize).min(MAX_CAR_COUNT))
}

pub fn record_offset(slot: &SaveSlot, index: usize) -> usize {
    slot.start_offset + FIRST_CAR_OFFSET + CAR_RECORD_LEN * index
}

pub fn get_record(
    bytes: &[u8],
    slot: &SaveSlot,
    index: usize,
) -> Result<Vec<CarFieldValue>, CoreError> {
    ensure_existing(bytes, slot, index)?;
    let base = record_offset(slot, index);
    CAR_FIELDS
        .iter()
        .map(|desc| {
            Ok(CarFieldValue {
                name: desc.name.to_string(),
                hex: field::read_hex(bytes, base, desc)?,
            })
        })
        .collect()
}

pub fn get_car(
    bytes: &[u8],
    slot: &SaveSlot,
    index: usize,
    catalog: Option<&CarCatalog>,
) -> Result<CarEntry, CoreError> {
    let fields = get_record(bytes, slot, index)?;
    let base = record_offset(slot, index);
    let code = field::read_hex(bytes, base, &CAR_CODE)?;
    let name = catalog
        .and_then(|c| c.name(&code, slot.region))
        .unwrap_or(INVALID_CAR_NAME)
        .to_string();

    Ok(CarEntry {
        index,
        offset: base,
        name,
        code,
        bytes: field::read_hex(bytes, base, &CAR_RECORD)?,
        fields,
    })
}

pub fn get_cars(
    bytes: &[u8],
    slot: &SaveSlot,
    catalog: Option<&CarCatalog>,
) -> Result<Vec<CarEntry>, CoreError> {
    (0..car_count(bytes, slot)?)
        .map(|index| get_car(bytes, slot, index, catalog))
        .collect()
}

/// Applies `edit` and returns the index actually written. Every hex value and
/// field name is checked before the first byte changes.
pub fn set_record(
    bytes: &mut [u8],
    slot: &SaveSlot,
    edit: &CarEdit,
    policy: RecordIndexPolicy,
) -> Result<Option<usize>, CoreError> {
    if edit.is_empty() {
        return Ok(None);
    }

    let whole = edit.bytes.as_deref().filter(|hex| !hex.is_empty());
    if let Some(hex) = whole {
        field::decode_hex(hex)?;
    }
    let whole = whole.map(|hex| FieldValue::Hex(hex.to_string()));
    let mut updates = Vec::with_capacity(edit.fields.len());
    for (name, hex) in &edit.fields {
        let desc = field_by_name(name).ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::UnknownField,
                format!("unknown car field '{name}'"),
            )
        })?;
        if hex.is_empty() {
            continue;
        }
        field::decode_hex(hex)?;
        updates.push((desc, FieldValue::Hex(hex.clone())));
    }

    let index = resolve_write_index(bytes, slot, edit.index, policy)?;
    let base = record_offset(slot, index);
    field::set(bytes, base, &CAR_RECORD, whole.as_ref())?;
    for (desc, value) in &updates {
        field::set(bytes, base, desc, Some(value))?;
    }
    debug!(start = slot.start_offset, index, "wrote car record");
    Ok(Some(index))
}

/// Stores `value` as the current car when it names an existing car, and the
/// "no car" sentinel otherwise. Returns the stored byte.
pub fn set_current_car(bytes: &mut [u8], slot: &SaveSlot, value: i64) -> Result<u8, CoreError> {
    let count = car_count(bytes, slot)?;
    let stored = match usize::try_from(value) {
        Ok(index) if index < count => index as u8,
        _ => NO_CURRENT_CAR,
    };
    let value = FieldValue::Int(i64::from(stored));
    field::set(bytes, slot.start_offset, &CURRENT_CAR, Some(&value))?;
    Ok(stored)
}

pub fn current_car(bytes: &[u8], slot: &SaveSlot) -> Result<Option<u8>, CoreError> {
    let raw = field::read_int(bytes, slot.start_offset, &CURRENT_CAR)? as usize;
    Ok((raw < MAX_CAR_COUNT).then_some(raw as u8))
}

fn ensure_existing(bytes: &[u8], slot: &SaveSlot, index: usize) -> Result<(), CoreError> {
    let count = car_count(bytes, slot)?;
    if index >= count {
        return Err(CoreError::new(
            CoreErrorCode::InvalidIndex,
            format!("car index {index} out of range, save holds {count} cars"),
        ));
    }
    Ok(())
}

fn resolve_write_index(
    bytes: &mut [u8],
    slot: &SaveSlot,
    requested: i64,
    policy: RecordIndexPolicy,
) -> Result<usize, CoreError> {
    let count = car_count(bytes, slot)?;
    match usize::try_from(requested) {
        Ok(index) if index < count => return Ok(index),
        _ => {}
    }

    match policy {
        RecordIndexPolicy::Append if count < MAX_CAR_COUNT => {
            field::write_int(bytes, slot.start_offset, &CAR_COUNT, (count + 1) as i64)?;
            debug!(requested, appended_at = count, "appending car record");
            Ok(count)
        }
        RecordIndexPolicy::Append => Err(CoreError::new(
            CoreErrorCode::InvalidIndex,
            format!("car index {requested} out of range and the garage is full"),
        )),
        RecordIndexPolicy::Strict => Err(CoreError::new(
            CoreErrorCode::InvalidIndex,
            format!("car index {requested} out of range, save holds {count} cars"),
        )),
    }
}
