//! The protocol's base types.

/// Byte order of the fields of one definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Interpret a definition's architecture byte.
    pub fn from_architecture(architecture: u8) -> Option<Self> {
        match architecture {
            0 => Some(Self::Little),
            1 => Some(Self::Big),
            _ => None,
        }
    }
}

/// The base type of a field, as declared by a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BaseType {
    /// `enum`
    Enum,
    /// `sint8`
    SInt8,
    /// `uint8`
    UInt8,
    /// `sint16`
    SInt16,
    /// `uint16`
    UInt16,
    /// `sint32`
    SInt32,
    /// `uint32`
    UInt32,
    /// `string`, null-terminated UTF-8.
    String,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
    /// `uint8z`, invalid when zero.
    UInt8z,
    /// `uint16z`, invalid when zero.
    UInt16z,
    /// `uint32z`, invalid when zero.
    UInt32z,
    /// `byte`, an opaque array.
    Byte,
    /// `sint64`
    SInt64,
    /// `uint64`
    UInt64,
    /// `uint64z`, invalid when zero.
    UInt64z,
}

impl BaseType {
    /// Interpret a base type code.
    ///
    /// Codes are matched on their 5-bit base type number, so firmware that
    /// omits the endian-ability bit still decodes. Codes with reserved bits set
    /// are rejected.
    pub fn from_code(code: u8) -> Option<Self> {
        if code & 0x60 != 0 {
            return None;
        }

        Some(match code & 0x1F {
            0x00 => Self::Enum,
            0x01 => Self::SInt8,
            0x02 => Self::UInt8,
            0x03 => Self::SInt16,
            0x04 => Self::UInt16,
            0x05 => Self::SInt32,
            0x06 => Self::UInt32,
            0x07 => Self::String,
            0x08 => Self::Float32,
            0x09 => Self::Float64,
            0x0A => Self::UInt8z,
            0x0B => Self::UInt16z,
            0x0C => Self::UInt32z,
            0x0D => Self::Byte,
            0x0E => Self::SInt64,
            0x0F => Self::UInt64,
            0x10 => Self::UInt64z,
            _ => return None,
        })
    }

    /// The canonical code for this base type.
    pub fn code(self) -> u8 {
        match self {
            Self::Enum => 0x00,
            Self::SInt8 => 0x01,
            Self::UInt8 => 0x02,
            Self::SInt16 => 0x83,
            Self::UInt16 => 0x84,
            Self::SInt32 => 0x85,
            Self::UInt32 => 0x86,
            Self::String => 0x07,
            Self::Float32 => 0x88,
            Self::Float64 => 0x89,
            Self::UInt8z => 0x0A,
            Self::UInt16z => 0x8B,
            Self::UInt32z => 0x8C,
            Self::Byte => 0x0D,
            Self::SInt64 => 0x8E,
            Self::UInt64 => 0x8F,
            Self::UInt64z => 0x90,
        }
    }

    /// Width in bytes of a single element.
    pub fn width(self) -> usize {
        match self {
            Self::Enum | Self::SInt8 | Self::UInt8 | Self::UInt8z => 1,
            Self::String | Self::Byte => 1,
            Self::SInt16 | Self::UInt16 | Self::UInt16z => 2,
            Self::SInt32 | Self::UInt32 | Self::UInt32z | Self::Float32 => 4,
            Self::SInt64 | Self::UInt64 | Self::UInt64z | Self::Float64 => 8,
        }
    }

    /// Whether values of this type can be unwrapped as accumulators.
    pub fn is_integer(self) -> bool {
        !matches!(
            self,
            Self::String | Self::Byte | Self::Float32 | Self::Float64
        )
    }

    /// Mask selecting the bits of one element, the modulus minus one.
    pub fn mask(self) -> u64 {
        match self.width() {
            8 => u64::MAX,
            n => (1u64 << (n * 8)) - 1,
        }
    }
}
