//! Document and record headers.

use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use thiserror::Error;
use tracing::{debug, warn};
use zerocopy::FromBytes;

use crate::{error::Error, stream::Leniency};

use super::{
    check::compute_crc,
    cursor::{ByteCursor, Source},
};

/// The marker identifying FIT data.
pub const DATA_TYPE: [u8; 4] = *b".FIT";

/// Highest protocol major version this decoder understands.
const PROTOCOL_MAJOR: u8 = 2;

/// Reason a document header was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFault {
    /// The document ended inside its header.
    #[error("document ended inside its header")]
    Truncated,
    /// Unknown header length.
    #[error("unknown header length ({0})")]
    UnknownLength(u8),
    /// Incorrect filetype marker.
    #[error("incorrect file type marker ({0:02X?})")]
    NotFitData([u8; 4]),
}

/// A decoded document header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Header {
    /// Length of the header in bytes, 12 or 14.
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Length of the record section in bytes.
    pub data_size: u32,
    pub data_type: [u8; 4],
    /// Checksum over the first 12 header bytes, if the header carries one.
    pub crc: Option<u16>,
}

impl Header {
    /// Decode a document header, advancing the cursor past it.
    ///
    /// A 14-byte header's checksum is always verified under
    /// [`Leniency::Strict`]. [`Leniency::Opaque`] also accepts zero, which
    /// some encoders write in place of a checksum they never computed.
    pub fn parse<S: Source>(cursor: &mut ByteCursor<S>, leniency: Leniency) -> Result<Self, Error> {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct FileHeader {
            header_size: u8,
            protocol_version: u8,
            profile_version: [u8; 2],
            data_size: [u8; 4],
            data_type: [u8; 4],
        }

        let r: [u8; 12] = cursor.take().map_err(truncated)?;

        let FileHeader {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            data_type,
        } = zerocopy::transmute!(r);

        let fault = |fault| Error::MalformedHeader { fault };

        if data_type != DATA_TYPE {
            Err(fault(HeaderFault::NotFitData(data_type)))?;
        }

        let crc = match header_size {
            12 => None,
            14 => {
                let calculated = compute_crc(0, &r);
                let found = u16::from_le_bytes(cursor.take().map_err(truncated)?);

                let uncomputed = found == 0 && leniency == Leniency::Opaque;
                if found != calculated && !uncomputed {
                    Err(Error::HeaderChecksumMismatch { found, calculated })?;
                }

                Some(found)
            }
            _ => Err(fault(HeaderFault::UnknownLength(header_size)))?,
        };

        let header = Self {
            header_size,
            protocol_version,
            profile_version: u16::from_le_bytes(profile_version),
            data_size: u32::from_le_bytes(data_size),
            data_type,
            crc,
        };

        if header.protocol_major() > PROTOCOL_MAJOR {
            warn!(
                protocol_version = header.protocol_version,
                "Protocol version is newer than supported."
            );
        }

        debug!(
            header_size,
            protocol_version = header.protocol_version,
            profile_version = header.profile_version,
            data_size = header.data_size,
            "Read file header."
        );

        Ok(header)
    }

    /// Major protocol version, from the upper nibble.
    pub fn protocol_major(&self) -> u8 {
        self.protocol_version >> 4
    }

    /// Minor protocol version, from the lower nibble.
    pub fn protocol_minor(&self) -> u8 {
        self.protocol_version & 0x0F
    }
}

fn truncated(err: Error) -> Error {
    match err {
        Error::TruncatedStream { .. } => Error::MalformedHeader {
            fault: HeaderFault::Truncated,
        },
        err => err,
    }
}

/// A record header byte introducing a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefinitionRecord {
    /// Whether developer field definitions follow the field definitions.
    pub has_developer_fields: bool,
}

/// A record header byte introducing a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRecord {
    /// The 5-bit time offset of a compressed timestamp header.
    pub time_offset: Option<u8>,
}

/// Decode a record header byte.
///
/// Returns the local message number, and the kind of record that follows.
pub fn parse_record_header(r: u8) -> (u8, Either<DefinitionRecord, DataRecord>) {
    bitfield! {
        struct RecordHeader(u8) {
            [7] is_compressed,
        }
    }

    let header = RecordHeader(r);

    if header.is_compressed() {
        bitfield! {
            struct CompressedHeader(u8) {
                [0..5] time_offset: u8,
                [5..7] local_message: u8,
            }
        }

        let header = CompressedHeader(r);

        let record = DataRecord {
            time_offset: Some(header.time_offset()),
        };

        (header.local_message(), Right(record))
    } else {
        bitfield! {
            struct NormalHeader(u8) {
                [0..4] local_message: u8,
                [5] is_developer,
                [6] is_definition,
            }
        }

        let header = NormalHeader(r);

        let record = if header.is_definition() {
            Left(DefinitionRecord {
                has_developer_fields: header.is_developer(),
            })
        } else {
            Right(DataRecord { time_offset: None })
        };

        (header.local_message(), record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn header(size: u8, data_size: u32, marker: &[u8; 4]) -> alloc::vec::Vec<u8> {
        let mut r = alloc::vec![size, 0x20];
        r.extend_from_slice(&2132u16.to_le_bytes());
        r.extend_from_slice(&data_size.to_le_bytes());
        r.extend_from_slice(marker);
        r
    }

    #[test]
    fn parses_legacy_header() {
        let r = header(12, 300, b".FIT");
        let mut cursor = ByteCursor::new(r.as_slice());
        let header = Header::parse(&mut cursor, Leniency::Strict).unwrap();

        assert_eq!(header.header_size, 12);
        assert_eq!(header.protocol_major(), 2);
        assert_eq!(header.profile_version, 2132);
        assert_eq!(header.data_size, 300);
        assert_eq!(header.crc, None);
        assert_eq!(cursor.offset(), 12);
    }

    #[test]
    fn verifies_extended_header_checksum() {
        let mut r = header(14, 0, b".FIT");
        let crc = compute_crc(0, &r);
        r.extend_from_slice(&crc.to_le_bytes());

        let header = Header::parse(&mut ByteCursor::new(r.as_slice()), Leniency::Strict).unwrap();
        assert_eq!(header.crc, Some(crc));

        let last = r.len() - 1;
        r[last] ^= 0x01;
        let err = Header::parse(&mut ByteCursor::new(r.as_slice()), Leniency::Strict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HeaderChecksumMismatch);
    }

    #[test]
    fn uncomputed_header_checksum_is_opaque_only() {
        let mut r = header(14, 0, b".FIT");
        r.extend_from_slice(&[0, 0]);

        let err = Header::parse(&mut ByteCursor::new(r.as_slice()), Leniency::Strict).unwrap_err();
        assert!(matches!(err, Error::HeaderChecksumMismatch { found: 0, .. }));

        let header = Header::parse(&mut ByteCursor::new(r.as_slice()), Leniency::Opaque).unwrap();
        assert_eq!(header.crc, Some(0));
    }

    #[test]
    fn header_faults_are_error_sources() {
        use alloc::string::ToString;
        use core::error::Error as _;

        let err = Error::MalformedHeader {
            fault: HeaderFault::UnknownLength(13),
        };
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "unknown header length (13)");
        assert_eq!(
            err.to_string(),
            "Malformed file header: unknown header length (13)."
        );

        let fault = HeaderFault::NotFitData(*b".TIF");
        assert_eq!(
            fault.to_string(),
            "incorrect file type marker ([2E, 54, 49, 46])"
        );
    }

    #[test]
    fn rejects_wrong_marker_and_length() {
        let r = header(12, 0, b".TIF");
        let err = Header::parse(&mut ByteCursor::new(r.as_slice()), Leniency::Strict).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedHeader {
                fault: HeaderFault::NotFitData(_)
            }
        ));

        let r = header(13, 0, b".FIT");
        let err = Header::parse(&mut ByteCursor::new(r.as_slice()), Leniency::Strict).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedHeader {
                fault: HeaderFault::UnknownLength(13)
            }
        ));
    }

    #[test]
    fn rejects_truncated_header() {
        let r = header(14, 0, b".FIT");
        let err = Header::parse(&mut ByteCursor::new(&r[..8]), Leniency::Strict).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedHeader {
                fault: HeaderFault::Truncated
            }
        ));

        // Extended header missing its checksum.
        let err = Header::parse(&mut ByteCursor::new(r.as_slice()), Leniency::Strict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedHeader);
    }

    #[test]
    fn decodes_record_header_bytes() {
        assert_eq!(
            parse_record_header(0x43),
            (
                3,
                Left(DefinitionRecord {
                    has_developer_fields: false
                })
            )
        );
        assert_eq!(
            parse_record_header(0x60),
            (
                0,
                Left(DefinitionRecord {
                    has_developer_fields: true
                })
            )
        );
        assert_eq!(
            parse_record_header(0x0F),
            (15, Right(DataRecord { time_offset: None }))
        );
        assert_eq!(
            parse_record_header(0b1_10_00110),
            (
                2,
                Right(DataRecord {
                    time_offset: Some(6)
                })
            )
        );
    }
}
