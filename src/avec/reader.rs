//! Reader-based decoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::io::{ErrorKind, Read};

use crate::{
    error::Error,
    sans::cursor::{Source, SourceError},
    stream::Options,
};

use super::{FromRecords, decode_source};

/// A [`Source`] reading from a [`Read`].
///
/// Wrap the reader in a [`std::io::BufReader`] if it performs a system call
/// per read; the decoder reads a few bytes at a time.
#[derive(Debug)]
pub struct ReadSource<R>(pub R);

impl<R: Read> Source for ReadSource<R> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        self.0.read_exact(buf).map_err(|err| match err.kind() {
            ErrorKind::UnexpectedEof => SourceError::Exhausted,
            _ => SourceError::Io(err),
        })
    }
}

/// Decode records from a reader of a document, publishing to a receiver.
///
/// This method is also re-exported as `freewheel::avec::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode(r: &mut impl Read, o: &mut impl FromRecords) -> Result<(), Error> {
    decode_source(ReadSource(std::io::BufReader::new(r)), Options::default(), o)
}
