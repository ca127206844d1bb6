//! Errors terminating a decode session.

use core::fmt;

use thiserror::Error;

use crate::sans::header::HeaderFault;

/// An error decoding a document.
///
/// Every error is terminal for the [`RecordStream`](crate::RecordStream) that
/// produced it. Offsets count bytes from the start of the document.
#[derive(Debug, Error)]
pub enum Error {
    /// The document header is absent, truncated, or not FIT data.
    #[error("Malformed file header: {fault}.")]
    MalformedHeader {
        #[source]
        fault: HeaderFault,
    },
    /// Calculated and found header CRC values do not match.
    #[error("Calculated ({calculated:#06X}) and found ({found:#06X}) header CRC values do not match.")]
    HeaderChecksumMismatch { found: u16, calculated: u16 },
    /// A definition record declared neither little nor big endian fields.
    #[error("Unknown architecture byte ({value:#04X}) for local message {local} at offset {offset}.")]
    UnknownArchitectureByte { offset: usize, local: u8, value: u8 },
    /// A definition record declared an unrecognized base type.
    #[error("Unknown base type ({value:#04X}) for field {field} of local message {local} at offset {offset}.")]
    UnknownBaseType {
        offset: usize,
        local: u8,
        field: u8,
        value: u8,
    },
    /// A field's size is not a multiple of its base type's width.
    #[error("Field {field} of local message {local} has {size} bytes, not a multiple of {width}.")]
    MisalignedField {
        local: u8,
        field: u8,
        size: u8,
        width: usize,
    },
    /// A data record referenced a local message with no definition.
    #[error("No definition for local message {local} at offset {offset}.")]
    DefinitionNotBound { offset: usize, local: u8 },
    /// A record extends past the end of the declared record section.
    #[error("Record for local message {local} at offset {offset} needs {needed} bytes, {remaining} remain.")]
    TruncatedRecord {
        offset: usize,
        local: u8,
        needed: usize,
        remaining: usize,
    },
    /// The document ended before its declared length.
    #[error("Unexpectedly reached the end of the document at offset {offset}.")]
    TruncatedStream { offset: usize },
    /// Calculated and found CRC values do not match.
    #[error("Calculated ({calculated:#06X}) and found ({found:#06X}) CRC values do not match.")]
    ChecksumMismatch { found: u16, calculated: u16 },
    /// An error from the supplied reader.
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The kind of this error, without its context.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedHeader { .. } => ErrorKind::MalformedHeader,
            Self::HeaderChecksumMismatch { .. } => ErrorKind::HeaderChecksumMismatch,
            Self::UnknownArchitectureByte { .. } => ErrorKind::UnknownArchitectureByte,
            Self::UnknownBaseType { .. } => ErrorKind::UnknownBaseType,
            Self::MisalignedField { .. } => ErrorKind::MisalignedField,
            Self::DefinitionNotBound { .. } => ErrorKind::DefinitionNotBound,
            Self::TruncatedRecord { .. } => ErrorKind::TruncatedRecord,
            Self::TruncatedStream { .. } => ErrorKind::TruncatedStream,
            Self::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            #[cfg(feature = "std")]
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// The kind of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedHeader,
    HeaderChecksumMismatch,
    UnknownArchitectureByte,
    UnknownBaseType,
    MisalignedField,
    DefinitionNotBound,
    TruncatedRecord,
    TruncatedStream,
    ChecksumMismatch,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
