//! Resolved field values.

use alloc::{string::String, vec::Vec};
use core::fmt;

use thiserror::Error;

/// The resolved value of a field.
///
/// Values holding their base type's 'invalid' marker resolve to
/// [`Invalid`](Self::Invalid), never to the marker's numeric value. Values
/// scaled by the profile resolve to [`Scaled`](Self::Scaled), and accumulated
/// values without a scale to the unwrapped total as [`UInt64`](Self::UInt64).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FieldValue {
    Invalid,
    Enum(u8),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    SInt8(i8),
    SInt16(i16),
    SInt32(i32),
    SInt64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Scaled(f64),
    Array(Vec<FieldValue>),
}

impl FieldValue {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// The value as an unsigned integer, if it is one.
    pub fn as_u64(&self) -> Option<u64> {
        Some(match *self {
            Self::Enum(x) | Self::UInt8(x) => x.into(),
            Self::UInt16(x) => x.into(),
            Self::UInt32(x) => x.into(),
            Self::UInt64(x) => x,
            _ => return None,
        })
    }

    /// The value as a signed integer, if it is any integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::SInt8(x) => Some(x.into()),
            Self::SInt16(x) => Some(x.into()),
            Self::SInt32(x) => Some(x.into()),
            Self::SInt64(x) => Some(x),
            _ => self.as_u64().and_then(|x| x.try_into().ok()),
        }
    }

    /// The value as a float, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float32(x) => Some(x.into()),
            Self::Float64(x) | Self::Scaled(x) => Some(x),
            Self::SInt8(_) | Self::SInt16(_) | Self::SInt32(_) | Self::SInt64(_) => {
                self.as_i64().map(|x| x as f64)
            }
            _ => self.as_u64().map(|x| x as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "invalid"),
            Self::Enum(x) | Self::UInt8(x) => write!(f, "{x}"),
            Self::UInt16(x) => write!(f, "{x}"),
            Self::UInt32(x) => write!(f, "{x}"),
            Self::UInt64(x) => write!(f, "{x}"),
            Self::SInt8(x) => write!(f, "{x}"),
            Self::SInt16(x) => write!(f, "{x}"),
            Self::SInt32(x) => write!(f, "{x}"),
            Self::SInt64(x) => write!(f, "{x}"),
            Self::Float32(x) => write!(f, "{x}"),
            Self::Float64(x) | Self::Scaled(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Bytes(b) => b.iter().try_for_each(|b| write!(f, "{b:02x}")),
            Self::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// A field value could not be converted to the requested type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Field value has an incompatible type.")]
pub struct ConversionError;

macro_rules! try_from_value {
    ($t:ty, $($variant:ident),+) => {
        impl TryFrom<&FieldValue> for $t {
            type Error = ConversionError;

            fn try_from(value: &FieldValue) -> Result<Self, Self::Error> {
                match *value {
                    $(FieldValue::$variant(x) => Ok(x.into()),)+
                    _ => Err(ConversionError),
                }
            }
        }
    };
}

try_from_value!(u8, UInt8, Enum);
try_from_value!(u16, UInt8, Enum, UInt16);
try_from_value!(u32, UInt8, Enum, UInt16, UInt32);
try_from_value!(u64, UInt8, Enum, UInt16, UInt32, UInt64);

try_from_value!(i8, SInt8);
try_from_value!(i16, SInt8, SInt16, UInt8);
try_from_value!(i32, SInt8, SInt16, SInt32, UInt8, UInt16);
try_from_value!(i64, SInt8, SInt16, SInt32, SInt64, UInt8, UInt16, UInt32);

try_from_value!(f32, Float32);

impl TryFrom<&FieldValue> for f64 {
    type Error = ConversionError;

    /// Any numeric value converts, including scaled values.
    fn try_from(value: &FieldValue) -> Result<Self, Self::Error> {
        value.as_f64().ok_or(ConversionError)
    }
}

impl TryFrom<&FieldValue> for String {
    type Error = ConversionError;

    fn try_from(value: &FieldValue) -> Result<Self, Self::Error> {
        value.as_str().map(String::from).ok_or(ConversionError)
    }
}

/// Arrays convert element-wise, skipping invalid elements; single values
/// convert to a one-element vector. Byte arrays convert as `UInt8` elements.
impl<T> TryFrom<&FieldValue> for Vec<T>
where
    T: for<'a> TryFrom<&'a FieldValue>,
{
    type Error = ConversionError;

    fn try_from(value: &FieldValue) -> Result<Self, Self::Error> {
        let convert = |v: &FieldValue| T::try_from(v).map_err(|_| ConversionError);

        match value {
            FieldValue::Invalid => Err(ConversionError),
            FieldValue::Array(items) => items
                .iter()
                .filter(|v| !v.is_invalid())
                .map(convert)
                .collect(),
            FieldValue::Bytes(bytes) => bytes
                .iter()
                .map(|b| convert(&FieldValue::UInt8(*b)))
                .collect(),
            value => convert(value).map(|v| alloc::vec![v]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{string::ToString, vec};

    #[test]
    fn widens_without_loss() {
        assert_eq!(u32::try_from(&FieldValue::UInt16(7)), Ok(7));
        assert_eq!(i64::try_from(&FieldValue::UInt32(7)), Ok(7));
        assert_eq!(u8::try_from(&FieldValue::UInt16(7)), Err(ConversionError));
        assert_eq!(u16::try_from(&FieldValue::SInt16(7)), Err(ConversionError));
    }

    #[test]
    fn invalid_is_never_numeric() {
        assert_eq!(u16::try_from(&FieldValue::Invalid), Err(ConversionError));
        assert_eq!(f64::try_from(&FieldValue::Invalid), Err(ConversionError));
        assert_eq!(FieldValue::Invalid.as_u64(), None);
    }

    #[test]
    fn converts_arrays() {
        let value = FieldValue::Array(vec![
            FieldValue::UInt16(1),
            FieldValue::Invalid,
            FieldValue::UInt16(3),
        ]);
        assert_eq!(Vec::<u16>::try_from(&value), Ok(vec![1, 3]));

        let value = FieldValue::Bytes(vec![0xDE, 0xAD]);
        assert_eq!(Vec::<u8>::try_from(&value), Ok(vec![0xDE, 0xAD]));
        assert_eq!(value.to_string(), "dead");
    }

    #[test]
    fn displays_scaled_values_in_shortest_form() {
        assert_eq!(FieldValue::Scaled(4.5).to_string(), "4.5");
        assert_eq!(FieldValue::Scaled(20.0).to_string(), "20");
        assert_eq!(
            FieldValue::Array(vec![FieldValue::Scaled(0.5), FieldValue::Invalid]).to_string(),
            "0.5|invalid"
        );
    }
}
