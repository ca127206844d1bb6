//! Resolution of raw field bytes into values, and the session state it
//! depends on.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use tracing::warn;

use super::{
    base::{BaseType, ByteOrder},
    developer::DeveloperRegistry,
    profile::{Component, Scale},
    value::FieldValue,
};

/// State carried across the records of one document.
#[derive(Debug, Default)]
pub struct Session {
    pub accumulators: AccumulatorState,
    pub timestamps: TimestampState,
    pub developer: DeveloperRegistry,
}

/// Running totals of accumulated fields, by local message and field number.
#[derive(Debug, Default, Clone)]
pub struct AccumulatorState {
    totals: BTreeMap<(u8, u8), Accumulator>,
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    last: u64,
    total: u64,
}

impl AccumulatorState {
    /// Add a raw value of a field wrapping at `mask + 1`, returning the
    /// unwrapped total.
    ///
    /// The first value of a field starts its total. Each later value adds its
    /// distance from the previous one, counting forward through the wrap.
    pub fn accumulate(&mut self, local: u8, field: u8, raw: u64, mask: u64) -> u64 {
        let raw = raw & mask;

        let accumulator = self
            .totals
            .entry((local, field))
            .and_modify(|a| {
                let delta = raw.wrapping_sub(a.last) & mask;
                a.total = a.total.wrapping_add(delta);
                a.last = raw;
            })
            .or_insert(Accumulator {
                last: raw,
                total: raw,
            });

        accumulator.total
    }

    /// The current total of a field, if it has received a value.
    pub fn total(&self, local: u8, field: u8) -> Option<u64> {
        self.totals.get(&(local, field)).map(|a| a.total)
    }
}

/// The reference for expanding compressed timestamps.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimestampState {
    reference: Option<u32>,
}

impl TimestampState {
    /// Record a full timestamp.
    pub fn observe(&mut self, timestamp: u32) {
        self.reference = Some(timestamp);
    }

    /// The last full or expanded timestamp.
    pub fn reference(&self) -> Option<u32> {
        self.reference
    }

    /// Expand a 5-bit time offset against the reference, which it replaces.
    ///
    /// The result is the earliest timestamp not before the reference whose
    /// low 5 bits equal the offset. Returns `None` if no full timestamp has
    /// been seen.
    pub fn expand(&mut self, offset: u8) -> Option<u32> {
        const MASK: u32 = 0x1F;

        let reference = self.reference?;
        let offset = u32::from(offset) & MASK;

        let mut timestamp = (reference & !MASK).wrapping_add(offset);
        if offset < reference & MASK {
            timestamp = timestamp.wrapping_add(MASK + 1);
        }

        self.reference = Some(timestamp);
        Some(timestamp)
    }
}

/// How a field's bytes are to be resolved.
#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub base_type: BaseType,
    pub byte_order: ByteOrder,
    pub scale: Option<Scale>,
    /// Key into [`AccumulatorState`] when the field accumulates.
    pub accumulate: Option<(u8, u8)>,
}

impl Resolution {
    /// Resolve the bytes of a field. `r` must be a multiple of the base type's
    /// width in length; other lengths resolve as opaque bytes.
    pub fn resolve(&self, r: &[u8], accumulators: &mut AccumulatorState) -> FieldValue {
        let width = self.base_type.width();

        match self.base_type {
            BaseType::String => return string(r),
            BaseType::Byte => return opaque(r),
            _ if r.len() % width != 0 => return opaque(r),
            _ => {}
        }

        let mut elements = r.chunks_exact(width);

        if r.len() == width {
            let Some(value) = elements.next().and_then(|r| self.element(r)) else {
                return FieldValue::Invalid;
            };

            if let Some((local, field)) = self.accumulate {
                if let Some(raw) = raw_bits(&value) {
                    let mask = self.base_type.mask();
                    let total = accumulators.accumulate(local, field, raw, mask);

                    return match self.scale {
                        Some(scale) => FieldValue::Scaled(scale.apply(total as f64)),
                        None => FieldValue::UInt64(total),
                    };
                }
            }

            return self.scaled(value);
        }

        let items: Vec<_> = elements
            .map(|r| match self.element(r) {
                Some(value) => self.scaled(value),
                None => FieldValue::Invalid,
            })
            .collect();

        if items.iter().all(FieldValue::is_invalid) {
            FieldValue::Invalid
        } else {
            FieldValue::Array(items)
        }
    }

    fn scaled(&self, value: FieldValue) -> FieldValue {
        match (self.scale, value.as_f64()) {
            (Some(scale), Some(raw)) => FieldValue::Scaled(scale.apply(raw)),
            _ => value,
        }
    }

    /// Decode one element, or `None` if it holds the 'invalid' marker.
    fn element(&self, r: &[u8]) -> Option<FieldValue> {
        let byte_order = self.byte_order;

        macro_rules! read {
            ($t:ty) => {{
                let mut buf = [0; size_of::<$t>()];
                buf.copy_from_slice(r);
                match byte_order {
                    ByteOrder::Little => <$t>::from_le_bytes(buf),
                    ByteOrder::Big => <$t>::from_be_bytes(buf),
                }
            }};
        }

        macro_rules! element {
            ($t:ty, $invalid:expr, $variant:ident) => {{
                let x = read!($t);
                (x != $invalid).then_some(FieldValue::$variant(x))
            }};
        }

        match self.base_type {
            BaseType::Enum => element!(u8, u8::MAX, Enum),
            BaseType::UInt8 => element!(u8, u8::MAX, UInt8),
            BaseType::UInt8z => element!(u8, 0, UInt8),
            BaseType::SInt8 => element!(i8, i8::MAX, SInt8),
            BaseType::UInt16 => element!(u16, u16::MAX, UInt16),
            BaseType::UInt16z => element!(u16, 0, UInt16),
            BaseType::SInt16 => element!(i16, i16::MAX, SInt16),
            BaseType::UInt32 => element!(u32, u32::MAX, UInt32),
            BaseType::UInt32z => element!(u32, 0, UInt32),
            BaseType::SInt32 => element!(i32, i32::MAX, SInt32),
            BaseType::UInt64 => element!(u64, u64::MAX, UInt64),
            BaseType::UInt64z => element!(u64, 0, UInt64),
            BaseType::SInt64 => element!(i64, i64::MAX, SInt64),
            BaseType::Float32 => {
                let x = read!(u32);
                (x != u32::MAX).then(|| FieldValue::Float32(f32::from_bits(x)))
            }
            BaseType::Float64 => {
                let x = read!(u64);
                (x != u64::MAX).then(|| FieldValue::Float64(f64::from_bits(x)))
            }
            BaseType::String | BaseType::Byte => Some(FieldValue::Bytes(r.to_vec())),
        }
    }
}

/// Split the bits of a field into its components, from the lowest bits up.
///
/// `r` is read as one unsigned integer in `byte_order`, so it must be at most
/// eight bytes long. Accumulating components are keyed by `local` and the
/// component's field number.
pub fn expand_components(
    components: &[Component],
    r: &[u8],
    byte_order: ByteOrder,
    local: u8,
    accumulators: &mut AccumulatorState,
) -> Vec<(u8, FieldValue)> {
    if r.len() > size_of::<u64>() {
        warn!(size = r.len(), "Field is too wide to expand into components.");
        return Vec::new();
    }

    let mut bits = match byte_order {
        ByteOrder::Little => r.iter().rev().fold(0, |acc, &b| acc << 8 | u64::from(b)),
        ByteOrder::Big => r.iter().fold(0, |acc, &b| acc << 8 | u64::from(b)),
    };

    components
        .iter()
        .map(|component| {
            let mask = component.mask();
            let mut raw = bits & mask;
            bits = bits.checked_shr(u32::from(component.bits)).unwrap_or(0);

            if component.accumulate {
                raw = accumulators.accumulate(local, component.field, raw, mask);
            }

            let value = match component.scale {
                Some(scale) => FieldValue::Scaled(scale.apply(raw as f64)),
                None => FieldValue::UInt64(raw),
            };

            (component.field, value)
        })
        .collect()
}

/// The raw two's complement bits of an integer value.
fn raw_bits(value: &FieldValue) -> Option<u64> {
    match *value {
        FieldValue::SInt8(x) => Some(x as u64),
        FieldValue::SInt16(x) => Some(x as u64),
        FieldValue::SInt32(x) => Some(x as u64),
        FieldValue::SInt64(x) => Some(x as u64),
        _ => value.as_u64(),
    }
}

/// Decode a null-terminated string, or `Invalid` if it is empty.
fn string(r: &[u8]) -> FieldValue {
    let end = r.iter().position(|&b| b == 0).unwrap_or(r.len());
    if end == 0 {
        return FieldValue::Invalid;
    }

    let s = String::from_utf8_lossy(&r[..end]);
    if matches!(s, alloc::borrow::Cow::Owned(_)) {
        warn!("Replaced invalid UTF-8 in a string field.");
    }

    FieldValue::String(s.into_owned())
}

/// Keep opaque bytes, or `Invalid` if every byte is 0xFF.
pub(crate) fn opaque(r: &[u8]) -> FieldValue {
    if r.iter().all(|&b| b == u8::MAX) {
        FieldValue::Invalid
    } else {
        FieldValue::Bytes(r.to_vec())
    }
}
