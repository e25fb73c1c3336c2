use std::ops::Range;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::layout::{FieldDescriptor, FieldEncoding};

const MAX_INT_WIDTH: usize = 4;

/// A decoded field value. Integer encodings (including nibbles and replicated
/// bytes when written) use `Int`; replicated blocks read back as `Bytes`;
/// opaque ranges travel as uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    Bytes(Vec<u8>),
    Hex(String),
}

pub fn get(buf: &[u8], base: usize, field: &FieldDescriptor) -> Result<FieldValue, CoreError> {
    match field.encoding {
        FieldEncoding::RepeatedByte { .. } => {
            read_repeated(buf, base, field).map(FieldValue::Bytes)
        }
        FieldEncoding::RawHex => read_hex(buf, base, field).map(FieldValue::Hex),
        _ => read_int(buf, base, field).map(FieldValue::Int),
    }
}

/// Writes `value` into `field`. `None`, an empty hex string and an empty
/// byte list are no-ops. Byte lists fill opaque ranges and replicated blocks
/// (one byte for every replica, or one byte per replica); any other field
/// takes exactly one byte, sign-extended for signed fields.
pub fn set(
    buf: &mut [u8],
    base: usize,
    field: &FieldDescriptor,
    value: Option<&FieldValue>,
) -> Result<(), CoreError> {
    let Some(value) = value else {
        return Ok(());
    };

    match (value, field.encoding) {
        (FieldValue::Hex(hex), _) if hex.is_empty() => Ok(()),
        (FieldValue::Bytes(bytes), _) if bytes.is_empty() => Ok(()),
        (FieldValue::Hex(hex), FieldEncoding::RawHex) => write_hex(buf, base, field, hex),
        (FieldValue::Bytes(bytes), FieldEncoding::RawHex) => {
            let len = bytes.len().min(field.size);
            slice_mut(buf, base, field)?[..len].copy_from_slice(&bytes[..len]);
            Ok(())
        }
        (FieldValue::Bytes(bytes), FieldEncoding::RepeatedByte { count, stride })
            if bytes.len() == count && count > 1 =>
        {
            let range = checked_range(buf.len(), base, field)?;
            for (i, &byte) in bytes.iter().enumerate() {
                buf[range.start + i * stride] = byte;
            }
            Ok(())
        }
        (FieldValue::Bytes(bytes), encoding) => match bytes.as_slice() {
            [byte] if encoding == FieldEncoding::SignedLe => {
                write_int(buf, base, field, i64::from(*byte as i8))
            }
            [byte] => write_int(buf, base, field, i64::from(*byte)),
            _ => Err(mismatch(field)),
        },
        (FieldValue::Int(v), _) => write_int(buf, base, field, *v),
        (FieldValue::Hex(_), _) => Err(mismatch(field)),
    }
}

fn mismatch(field: &FieldDescriptor) -> CoreError {
    CoreError::new(
        CoreErrorCode::InvalidValue,
        format!("value type does not match encoding of field {}", field.name),
    )
}

pub fn read_int(buf: &[u8], base: usize, field: &FieldDescriptor) -> Result<i64, CoreError> {
    match field.encoding {
        FieldEncoding::SignedLe => {
            check_int_width(field)?;
            let bytes = slice(buf, base, field)?;
            let mut raw = [0u8; 8];
            raw[..bytes.len()].copy_from_slice(bytes);
            let unsigned = i64::from_le_bytes(raw);
            let shift = 64 - 8 * bytes.len() as u32;
            Ok((unsigned << shift) >> shift)
        }
        FieldEncoding::UnsignedLe | FieldEncoding::SingleByte => {
            check_int_width(field)?;
            let bytes = slice(buf, base, field)?;
            let mut raw = [0u8; 8];
            raw[..bytes.len()].copy_from_slice(bytes);
            Ok(i64::from_le_bytes(raw))
        }
        FieldEncoding::NibbleLow => Ok(i64::from(slice(buf, base, field)?[0] & 0x0F)),
        FieldEncoding::NibbleHigh => Ok(i64::from((slice(buf, base, field)?[0] & 0xF0) >> 4)),
        FieldEncoding::RepeatedByte { .. } => {
            let replicas = read_repeated(buf, base, field)?;
            Ok(replicas.first().copied().map(i64::from).unwrap_or_default())
        }
        FieldEncoding::RawHex => Err(CoreError::new(
            CoreErrorCode::InvalidValue,
            format!("field {} is an opaque byte range", field.name),
        )),
    }
}

pub fn write_int(
    buf: &mut [u8],
    base: usize,
    field: &FieldDescriptor,
    value: i64,
) -> Result<(), CoreError> {
    match field.encoding {
        FieldEncoding::SignedLe | FieldEncoding::UnsignedLe | FieldEncoding::SingleByte => {
            check_int_width(field)?;
            let bits = 8 * field.size as u32;
            let (min, max) = if field.encoding == FieldEncoding::SignedLe {
                (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
            } else {
                (0, (1i64 << bits) - 1)
            };
            ensure_in_range(field, value, min, max)?;
            let bytes = value.to_le_bytes();
            slice_mut(buf, base, field)?.copy_from_slice(&bytes[..field.size]);
            Ok(())
        }
        FieldEncoding::NibbleLow => {
            ensure_in_range(field, value, 0, 0x0F)?;
            let byte = &mut slice_mut(buf, base, field)?[0];
            *byte = (*byte & 0xF0) | value as u8;
            Ok(())
        }
        FieldEncoding::NibbleHigh => {
            ensure_in_range(field, value, 0, 0x0F)?;
            let byte = &mut slice_mut(buf, base, field)?[0];
            *byte = (*byte & 0x0F) | ((value as u8) << 4);
            Ok(())
        }
        FieldEncoding::RepeatedByte { count, stride } => {
            ensure_in_range(field, value, 0, 0xFF)?;
            let range = checked_range(buf.len(), base, field)?;
            for i in 0..count {
                buf[range.start + i * stride] = value as u8;
            }
            Ok(())
        }
        FieldEncoding::RawHex => Err(CoreError::new(
            CoreErrorCode::InvalidValue,
            format!("field {} is an opaque byte range", field.name),
        )),
    }
}

pub fn read_repeated(
    buf: &[u8],
    base: usize,
    field: &FieldDescriptor,
) -> Result<Vec<u8>, CoreError> {
    let range = checked_range(buf.len(), base, field)?;
    match field.encoding {
        FieldEncoding::RepeatedByte { count, stride } => {
            Ok((0..count).map(|i| buf[range.start + i * stride]).collect())
        }
        _ => Ok(buf[range].to_vec()),
    }
}

/// Sets both nibbles of every byte in `field` to `nibble`, applying one rank
/// to every paired event in the range at once.
pub fn fill_nibble_pairs(
    buf: &mut [u8],
    base: usize,
    field: &FieldDescriptor,
    nibble: u8,
) -> Result<(), CoreError> {
    ensure_in_range(field, i64::from(nibble), 0, 0x0F)?;
    slice_mut(buf, base, field)?.fill((nibble << 4) | nibble);
    Ok(())
}

pub fn read_hex(buf: &[u8], base: usize, field: &FieldDescriptor) -> Result<String, CoreError> {
    Ok(hex::encode_upper(slice(buf, base, field)?))
}

/// Writes the bytes of `input` at the start of `field`. Shorter input leaves
/// the rest of the field untouched; longer input is truncated to the field.
pub fn write_hex(
    buf: &mut [u8],
    base: usize,
    field: &FieldDescriptor,
    input: &str,
) -> Result<(), CoreError> {
    if input.is_empty() {
        return Ok(());
    }

    let bytes = decode_hex(input)?;
    let len = bytes.len().min(field.size);
    let range = checked_range(buf.len(), base, field)?;
    buf[range.start..range.start + len].copy_from_slice(&bytes[..len]);
    Ok(())
}

pub fn decode_hex(input: &str) -> Result<Vec<u8>, CoreError> {
    hex::decode(input).map_err(|e| {
        CoreError::new(
            CoreErrorCode::MalformedHex,
            format!("invalid hex string '{input}': {e}"),
        )
    })
}

fn checked_range(
    buf_len: usize,
    base: usize,
    field: &FieldDescriptor,
) -> Result<Range<usize>, CoreError> {
    let range = field.range_at(base);
    if !range.fits_within(buf_len) {
        return Err(CoreError::out_of_bounds(range.start, range.len(), buf_len));
    }
    Ok(range.start..range.end)
}

fn slice<'a>(buf: &'a [u8], base: usize, field: &FieldDescriptor) -> Result<&'a [u8], CoreError> {
    let range = checked_range(buf.len(), base, field)?;
    Ok(&buf[range])
}

fn slice_mut<'a>(
    buf: &'a mut [u8],
    base: usize,
    field: &FieldDescriptor,
) -> Result<&'a mut [u8], CoreError> {
    let range = checked_range(buf.len(), base, field)?;
    Ok(&mut buf[range])
}

fn check_int_width(field: &FieldDescriptor) -> Result<(), CoreError> {
    if field.size == 0 || field.size > MAX_INT_WIDTH {
        return Err(CoreError::new(
            CoreErrorCode::InvalidValue,
            format!(
                "field {} has unsupported integer width {}",
                field.name, field.size
            ),
        ));
    }
    Ok(())
}

fn ensure_in_range(
    field: &FieldDescriptor,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), CoreError> {
    if value < min || value > max {
        return Err(CoreError::new(
            CoreErrorCode::InvalidValue,
            format!(
                "value {value} does not fit field {} (expected {min}..={max})",
                field.name
            ),
        ));
    }
    Ok(())
}
