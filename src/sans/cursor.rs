//! Sequential, bounds-checked reading of document bytes.

use alloc::vec::Vec;

use thiserror::Error;

use crate::error::Error;

use super::check::CrcAccumulator;

/// A failure to supply bytes.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source ran out of bytes.
    #[error("Source ran out of bytes.")]
    Exhausted,
    /// An error from an underlying reader.
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A sequential supplier of document bytes.
pub trait Source {
    /// Fill the whole of `buf` with the next bytes of the document.
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), SourceError>;
}

impl Source for &[u8] {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        let Some((head, tail)) = self.split_at_checked(buf.len()) else {
            *self = &[];
            return Err(SourceError::Exhausted);
        };

        buf.copy_from_slice(head);
        *self = tail;

        Ok(())
    }
}

impl<S: Source + ?Sized> Source for &mut S {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        (**self).fill(buf)
    }
}

/// Reader over a document's bytes.
///
/// Tracks the offset from the start of the document and, once a limit is set,
/// the number of bytes remaining before it. Bytes taken with [`take`] and
/// [`take_vec`] are accumulated into the cursor's cyclic redundancy check.
///
/// [`take`]: ByteCursor::take
/// [`take_vec`]: ByteCursor::take_vec
#[derive(Debug)]
pub struct ByteCursor<S> {
    source: S,
    offset: usize,
    limit: usize,
    crc: CrcAccumulator,
}

impl<S: Source> ByteCursor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            offset: 0,
            limit: usize::MAX,
            crc: CrcAccumulator::new(),
        }
    }

    /// Offset of the next byte from the start of the document.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes remaining before the limit.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.offset)
    }

    /// Bound [`remaining`](Self::remaining) to end at an absolute offset.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Checksum over every byte taken so far.
    pub fn crc(&self) -> u16 {
        self.crc.value()
    }

    /// Take an exact number of bytes, accumulating them into the checksum.
    pub fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let buf = self.take_unchecked()?;
        self.crc.update(&buf);
        Ok(buf)
    }

    /// Take `n` bytes, accumulating them into the checksum.
    pub fn take_vec(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        let mut buf = alloc::vec![0; n];
        self.fill(&mut buf)?;
        self.crc.update(&buf);
        Ok(buf)
    }

    /// Take an exact number of bytes without accumulating them.
    pub fn take_unchecked<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut buf = [0; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Recover the source, positioned after the last byte taken.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        match self.source.fill(buf) {
            Ok(()) => {
                self.offset += buf.len();
                Ok(())
            }
            Err(SourceError::Exhausted) => Err(Error::TruncatedStream {
                offset: self.offset,
            }),
            #[cfg(feature = "std")]
            Err(SourceError::Io(err)) => Err(Error::Io(err)),
        }
    }
}
